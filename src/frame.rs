//! Per-frame data carried through the pipeline.

use crate::geometry::{Rect, Size};
use crate::orientation::Orientation;
use crate::utils::image_conversion::crop_clamped;
use image::RgbImage;
use std::time::Instant;

/// One raw front-camera frame as captured by the sensor (not yet oriented)
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub timestamp: Instant,
    pub image: RgbImage,
}

impl CameraFrame {
    /// Frame stamped with the current time
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self::at(Instant::now(), image)
    }

    #[must_use]
    pub const fn at(timestamp: Instant, image: RgbImage) -> Self {
        Self { timestamp, image }
    }

    /// Sensor image size in pixels
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.image.width()), f64::from(self.image.height()))
    }
}

/// Everything known about one processed frame.
///
/// `face_rect` is in top-left pixel coordinates of the upright `image`. Eye
/// rects are relative to the face crop (unpadded), also top-left.
#[derive(Debug, Clone)]
pub struct FaceFrame {
    pub timestamp: Instant,
    /// Upright frame
    pub image: RgbImage,
    pub frame_size: Size,
    pub face_rect: Option<Rect>,
    pub face_yaw: Option<f64>,
    /// Person-relative roll in `[0, 360)`
    pub face_roll: Option<f64>,
    pub left_eye: Option<Rect>,
    pub right_eye: Option<Rect>,
    pub left_eye_closed: Option<bool>,
    pub right_eye_closed: Option<bool>,
    pub orientation: Orientation,
    /// Unpadded face crop of `image`
    pub face_crop: Option<RgbImage>,
}

impl FaceFrame {
    /// Frame with no detections
    #[must_use]
    pub fn new(timestamp: Instant, image: RgbImage, orientation: Orientation) -> Self {
        let frame_size = Size::new(f64::from(image.width()), f64::from(image.height()));
        Self {
            timestamp,
            image,
            frame_size,
            face_rect: None,
            face_yaw: None,
            face_roll: None,
            left_eye: None,
            right_eye: None,
            left_eye_closed: None,
            right_eye_closed: None,
            orientation,
            face_crop: None,
        }
    }

    #[must_use]
    pub const fn has_face(&self) -> bool {
        self.face_rect.is_some()
    }

    #[must_use]
    pub const fn has_face_and_eyes(&self) -> bool {
        self.face_rect.is_some() && self.left_eye.is_some() && self.right_eye.is_some()
    }

    /// False only when the detector reported at least one eye closed
    #[must_use]
    pub fn both_eyes_open(&self) -> bool {
        self.left_eye_closed != Some(true) && self.right_eye_closed != Some(true)
    }

    /// Drop the eye detections, keeping the face
    pub fn clear_eyes(&mut self) {
        self.left_eye = None;
        self.right_eye = None;
        self.left_eye_closed = None;
        self.right_eye_closed = None;
    }

    /// Re-cut the face crop from the current image
    pub fn refresh_face_crop(&mut self) {
        self.face_crop = self.face_rect.and_then(|face| crop_clamped(&self.image, &face));
    }

    /// Crop of the person's left eye from the face crop
    #[must_use]
    pub fn left_eye_crop(&self) -> Option<RgbImage> {
        self.eye_crop(self.left_eye)
    }

    /// Crop of the person's right eye from the face crop
    #[must_use]
    pub fn right_eye_crop(&self) -> Option<RgbImage> {
        self.eye_crop(self.right_eye)
    }

    fn eye_crop(&self, eye: Option<Rect>) -> Option<RgbImage> {
        let face_crop = self.face_crop.as_ref()?;
        crop_clamped(face_crop, &eye?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame() -> FaceFrame {
        let image = RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 7]));
        FaceFrame::new(Instant::now(), image, Orientation::LandscapeRight)
    }

    #[test]
    fn test_new_frame_is_empty() {
        let frame = frame();
        assert_eq!(frame.frame_size, Size::new(40.0, 30.0));
        assert!(!frame.has_face());
        assert!(!frame.has_face_and_eyes());
        assert!(frame.both_eyes_open());
    }

    #[test]
    fn test_eye_crops_are_face_relative() {
        let mut frame = frame();
        frame.face_rect = Some(Rect::new(10.0, 5.0, 20.0, 20.0));
        frame.left_eye = Some(Rect::new(12.0, 4.0, 4.0, 4.0));
        frame.refresh_face_crop();

        let crop = frame.left_eye_crop().unwrap();
        assert_eq!(crop.dimensions(), (4, 4));
        assert_eq!(crop.get_pixel(0, 0), &Rgb([22, 9, 7]));
        assert!(frame.right_eye_crop().is_none());
    }

    #[test]
    fn test_closed_flags() {
        let mut frame = frame();
        frame.left_eye_closed = Some(false);
        frame.right_eye_closed = Some(false);
        assert!(frame.both_eyes_open());
        frame.right_eye_closed = Some(true);
        assert!(!frame.both_eyes_open());
        frame.clear_eyes();
        assert!(frame.both_eyes_open());
    }
}
