//! Detection normalization.
//!
//! The face metadata detector reports boxes in normalized `[0, 1]` coordinates
//! of the *unrotated* sensor image, with roll measured against the sensor.
//! This module turns such a detection into a face rectangle in the pixel
//! space of the upright (orientation-corrected) frame, plus a roll angle that
//! is relative to the person and therefore independent of how the device is
//! held.
//!
//! The four orientation branches are written out explicitly. The mirror and
//! axis-swap combinations differ per orientation and do not compose into one
//! formula.

use crate::constants::{FULL_TURN_DEGREES, NORMALIZED_BOUNDS_MAX, NORMALIZED_BOUNDS_MIN};
use crate::geometry::{Rect, Size};
use crate::orientation::Orientation;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// One face as reported by the metadata detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFaceDetection {
    /// Bounds in normalized sensor coordinates
    pub bounds: Rect,
    /// Yaw in degrees, if the detector reports it
    pub yaw: Option<f64>,
    /// Sensor-relative roll in degrees, if the detector reports it
    pub roll: Option<f64>,
}

impl RawFaceDetection {
    #[must_use]
    pub const fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            yaw: None,
            roll: None,
        }
    }

    #[must_use]
    pub const fn with_angles(bounds: Rect, yaw: Option<f64>, roll: Option<f64>) -> Self {
        Self { bounds, yaw, roll }
    }
}

/// Convert a sensor-relative roll into a person-relative roll in `[0, 360)`.
///
/// Holding the head still while turning the device in 90° steps leaves the
/// result unchanged.
#[must_use]
pub fn correct_roll(raw_roll: f64, orientation: Orientation) -> f64 {
    (FULL_TURN_DEGREES - (raw_roll + orientation.roll_offset()) + FULL_TURN_DEGREES).rem_euclid(FULL_TURN_DEGREES)
}

/// Scale a normalized sensor box into the upright frame.
///
/// `frame` is the size of the orientation-corrected image. The result uses a
/// bottom-left origin; flip it with [`Rect::flip_y`] for top-left image space.
#[must_use]
pub fn scale_face_rect(normalized: &Rect, orientation: Orientation, frame: Size) -> Rect {
    match orientation {
        Orientation::Portrait => {
            // Sensor x runs along the upright frame's height.
            let scaled_x = normalized.x * frame.height;
            let scaled_y = normalized.y * frame.width;
            let scaled_w = normalized.width * frame.height;
            let scaled_h = normalized.height * frame.width;
            Rect::new(
                frame.width - (scaled_y + scaled_h),
                frame.height - (scaled_x + scaled_w),
                scaled_h,
                scaled_w,
            )
        }
        Orientation::LandscapeLeft => {
            let scaled_x = normalized.x * frame.width;
            let scaled_y = normalized.y * frame.height;
            let scaled_w = normalized.width * frame.width;
            let scaled_h = normalized.height * frame.height;
            Rect::new(frame.width - (scaled_x + scaled_w), scaled_y, scaled_w, scaled_h)
        }
        Orientation::LandscapeRight => {
            let scaled_x = normalized.x * frame.width;
            let scaled_y = normalized.y * frame.height;
            let scaled_w = normalized.width * frame.width;
            let scaled_h = normalized.height * frame.height;
            Rect::new(scaled_x, frame.height - (scaled_y + scaled_h), scaled_w, scaled_h)
        }
        Orientation::PortraitUpsideDown => {
            let scaled_x = normalized.x * frame.height;
            let scaled_y = normalized.y * frame.width;
            let scaled_w = normalized.width * frame.height;
            let scaled_h = normalized.height * frame.width;
            Rect::new(scaled_y, scaled_x, scaled_h, scaled_w)
        }
    }
}

/// Inverse of [`scale_face_rect`] followed by the flip into top-left space.
///
/// Takes a face rect in top-left upright-frame pixels and returns the
/// normalized sensor box it came from.
#[must_use]
pub fn restore_normalized_rect(face_rect: &Rect, orientation: Orientation, frame: Size) -> Rect {
    let r = face_rect.flip_y(frame);
    match orientation {
        Orientation::Portrait => Rect::new(
            (frame.height - (r.y + r.height)) / frame.height,
            (frame.width - (r.x + r.width)) / frame.width,
            r.height / frame.height,
            r.width / frame.width,
        ),
        Orientation::LandscapeLeft => Rect::new(
            (frame.width - (r.x + r.width)) / frame.width,
            r.y / frame.height,
            r.width / frame.width,
            r.height / frame.height,
        ),
        Orientation::LandscapeRight => Rect::new(
            r.x / frame.width,
            (frame.height - (r.y + r.height)) / frame.height,
            r.width / frame.width,
            r.height / frame.height,
        ),
        Orientation::PortraitUpsideDown => Rect::new(
            r.y / frame.height,
            r.x / frame.width,
            r.height / frame.height,
            r.width / frame.width,
        ),
    }
}

fn within_sensor_window(bounds: &Rect) -> bool {
    let window = NORMALIZED_BOUNDS_MIN..=NORMALIZED_BOUNDS_MAX;
    [bounds.x, bounds.y, bounds.max_x(), bounds.max_y()]
        .iter()
        .all(|v| window.contains(v))
}

/// Face geometry after orientation correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedFace {
    /// Face box in top-left upright-frame pixels
    pub face_rect: Rect,
    pub yaw: Option<f64>,
    /// Person-relative roll in `[0, 360)`
    pub roll: Option<f64>,
    pub orientation: Orientation,
    pub frame_size: Size,
}

/// Face box plus the padded box handed to the eye detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddedFace {
    pub face: Rect,
    pub padded: Rect,
    /// Margin added on each edge, in pixels
    pub padding: f64,
}

impl PaddedFace {
    /// Move an eye box from padded-crop coordinates into face-crop coordinates
    #[must_use]
    pub fn unpad_eye(&self, eye: &Rect) -> Rect {
        eye.offset(-self.padding, -self.padding)
    }
}

/// Applies roll correction, rescaling and padding for one eye detector setup
#[derive(Debug, Clone, Copy)]
pub struct DetectionNormalizer {
    padding_fraction: f64,
}

impl DetectionNormalizer {
    /// `padding_fraction` is the share of the face width added to every edge
    pub fn new(padding_fraction: f64) -> Result<Self> {
        if !(padding_fraction.is_finite() && padding_fraction >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "Padding fraction must be finite and non-negative, got {padding_fraction}"
            )));
        }
        Ok(Self { padding_fraction })
    }

    #[must_use]
    pub const fn padding_fraction(&self) -> f64 {
        self.padding_fraction
    }

    /// Normalize one raw detection.
    ///
    /// Returns `None` when the detection or the frame is degenerate, or when
    /// the box reaches outside `[-1, 2]` on either sensor axis.
    #[must_use]
    pub fn normalize(&self, raw: &RawFaceDetection, orientation: Orientation, frame_size: Size) -> Option<NormalizedFace> {
        if raw.bounds.is_degenerate() || frame_size.is_empty() {
            debug!("Discarding degenerate face detection {:?}", raw.bounds);
            return None;
        }
        if !within_sensor_window(&raw.bounds) {
            debug!("Discarding out-of-range face detection {:?}", raw.bounds);
            return None;
        }

        let face_rect = scale_face_rect(&raw.bounds, orientation, frame_size).flip_y(frame_size);

        Some(NormalizedFace {
            face_rect,
            yaw: raw.yaw,
            roll: raw.roll.map(|roll| correct_roll(roll, orientation)),
            orientation,
            frame_size,
        })
    }

    /// Grow the face box by the configured fraction of its width on every edge
    #[must_use]
    pub fn pad(&self, face: &Rect) -> PaddedFace {
        let padding = face.width * self.padding_fraction;
        PaddedFace {
            face: *face,
            padded: face.expand(padding),
            padding,
        }
    }
}
