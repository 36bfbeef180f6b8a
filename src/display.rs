//! Display-space conversion for overlay consumers.
//!
//! The preview shows the front camera mirrored and always in portrait.
//! Detections live in the upright frame of the current orientation, so they
//! are turned back to portrait, mirrored, then scaled into the preview box.

use crate::frame::FaceFrame;
use crate::geometry::{Rect, Size};
use crate::orientation::Orientation;
use serde::{Deserialize, Serialize};

/// How the camera image is fitted into the preview view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoGravity {
    /// Fill the view, cropping the overflow
    #[default]
    AspectFill,
    /// Fit inside the view, letterboxed
    Aspect,
    /// Stretch to the view
    Resize,
}

/// Where an `image`-sized picture lands inside `view` for the given gravity
#[must_use]
pub fn preview_box(gravity: VideoGravity, view: Size, image: Size) -> Rect {
    if view.is_empty() || image.is_empty() {
        return Rect::from_size(view);
    }

    let scale_x = view.width / image.width;
    let scale_y = view.height / image.height;
    let scale = match gravity {
        VideoGravity::Resize => return Rect::from_size(view),
        VideoGravity::Aspect => scale_x.min(scale_y),
        VideoGravity::AspectFill => scale_x.max(scale_y),
    };

    let width = image.width * scale;
    let height = image.height * scale;
    Rect::new((view.width - width) / 2.0, (view.height - height) / 2.0, width, height)
}

/// Rotate a rect from the upright frame of `orientation` into the portrait frame
#[must_use]
pub fn to_portrait(rect: &Rect, orientation: Orientation, oriented: Size) -> Rect {
    match orientation {
        Orientation::Portrait => *rect,
        Orientation::LandscapeLeft => rect.rotate_left(oriented),
        Orientation::LandscapeRight => rect.rotate_right(oriented),
        Orientation::PortraitUpsideDown => rect.rotate_180(oriented),
    }
}

/// Face and eye boxes in view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBoxes {
    pub face: Rect,
    pub left_eye: Option<Rect>,
    pub right_eye: Option<Rect>,
}

/// Convert a frame's detections into view coordinates
#[must_use]
pub fn display_boxes(frame: &FaceFrame, gravity: VideoGravity, view: Size) -> Option<DisplayBoxes> {
    let face = frame.face_rect?;
    let portrait = frame.orientation.portrait_size(frame.frame_size);
    let target = preview_box(gravity, view, portrait);
    if portrait.is_empty() {
        return None;
    }
    let scale_x = target.width / portrait.width;
    let scale_y = target.height / portrait.height;

    let to_view = |rect: Rect| {
        let mirrored = to_portrait(&rect, frame.orientation, frame.frame_size).flip_x(portrait);
        Rect::new(
            mirrored.x * scale_x + target.x,
            mirrored.y * scale_y + target.y,
            mirrored.width * scale_x,
            mirrored.height * scale_y,
        )
    };
    // Eyes are face-crop relative
    let eye_to_view = |eye: Option<Rect>| eye.map(|eye| to_view(eye.offset(face.x, face.y)));

    Some(DisplayBoxes {
        face: to_view(face),
        left_eye: eye_to_view(frame.left_eye),
        right_eye: eye_to_view(frame.right_eye),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::time::Instant;

    #[test]
    fn test_preview_box_gravities() {
        let view = Size::new(300.0, 600.0);
        let image = Size::new(480.0, 640.0);

        assert_eq!(preview_box(VideoGravity::Resize, view, image), Rect::new(0.0, 0.0, 300.0, 600.0));
        // Fit: scale 0.625 -> 300 x 400, centred vertically
        assert_eq!(preview_box(VideoGravity::Aspect, view, image), Rect::new(0.0, 100.0, 300.0, 400.0));
        // Fill: scale 0.9375 -> 450 x 600, overflowing horizontally
        assert_eq!(preview_box(VideoGravity::AspectFill, view, image), Rect::new(-75.0, 0.0, 450.0, 600.0));
    }

    #[test]
    fn test_portrait_display_is_mirrored() {
        let mut frame = FaceFrame::new(Instant::now(), RgbImage::new(480, 640), Orientation::Portrait);
        frame.face_rect = Some(Rect::new(100.0, 200.0, 80.0, 90.0));
        frame.left_eye = Some(Rect::new(50.0, 20.0, 10.0, 10.0));

        let boxes = display_boxes(&frame, VideoGravity::Resize, Size::new(480.0, 640.0)).unwrap();
        assert_eq!(boxes.face, Rect::new(300.0, 200.0, 80.0, 90.0));
        // Eye at (150, 220) in the frame, mirrored to 480 - 160
        assert_eq!(boxes.left_eye, Some(Rect::new(320.0, 220.0, 10.0, 10.0)));
        assert_eq!(boxes.right_eye, None);
    }

    #[test]
    fn test_landscape_rotates_back_to_portrait() {
        let mut frame = FaceFrame::new(Instant::now(), RgbImage::new(640, 480), Orientation::LandscapeRight);
        frame.face_rect = Some(Rect::new(10.0, 20.0, 30.0, 40.0));

        let boxes = display_boxes(&frame, VideoGravity::Resize, Size::new(480.0, 640.0)).unwrap();
        // rotate_right: (480 - 60, 10, 40, 30), then mirrored in width 480
        assert_eq!(boxes.face, Rect::new(20.0, 10.0, 40.0, 30.0));
    }

    #[test]
    fn test_no_face_no_boxes() {
        let frame = FaceFrame::new(Instant::now(), RgbImage::new(480, 640), Orientation::Portrait);
        assert!(display_boxes(&frame, VideoGravity::AspectFill, Size::new(100.0, 100.0)).is_none());
    }
}
