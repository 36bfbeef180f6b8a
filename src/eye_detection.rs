//! Eye detection seam.
//!
//! The pipeline hands a padded, upright face crop to an [`EyeDetector`] and
//! gets back either both eyes or nothing. Two implementations exist:
//!
//! - [`LandmarkEyeDetector`] wraps a feature-point source that reports eye
//!   centres (and optionally blinks). Recall-oriented; wants wide padding.
//! - [`CascadeEyeDetector`] wraps a box source that reports every eye-like
//!   region it finds. Precision-oriented; narrow padding is enough.
//!
//! "Left" and "right" on [`EyePair`] always mean the person's own eyes. The
//! crop is not mirrored, so the person's left eye appears on the image's
//! right-hand side.

use crate::constants::{LANDMARK_EYE_BOX_FRACTION, LANDMARK_WORKING_WIDTH};
use crate::geometry::{Point, Rect};
use crate::utils::image_conversion::resize_to_width;
use crate::Result;
use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which eye detector a session uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeDetectorKind {
    /// Feature-point detector (fast, reports blinks)
    #[default]
    Landmark,
    /// Cascade classifier (box candidates, no blinks)
    Cascade,
}

impl std::str::FromStr for EyeDetectorKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "landmark" | "landmarks" => Ok(Self::Landmark),
            "cascade" => Ok(Self::Cascade),
            _ => Err(crate::Error::ConfigError(format!("Unknown eye detector: {s}"))),
        }
    }
}

/// One detected eye in crop-local, top-left pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeObservation {
    pub rect: Rect,
    /// `Some(true)` when the detector saw the eye closed
    pub closed: Option<bool>,
}

/// Both eyes of one face, person-relative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePair {
    pub left: EyeObservation,
    pub right: EyeObservation,
}

/// Capability shared by both eye detectors
pub trait EyeDetector: Send {
    /// Find both eyes in a padded face crop; `Ok(None)` when they are not both found
    fn detect(&mut self, face_crop: &RgbImage) -> Result<Option<EyePair>>;

    /// Which kind of detector this is (selects the padding)
    fn kind(&self) -> EyeDetectorKind;

    /// Get detector name
    fn name(&self) -> &str;
}

/// Eye centres as seen by a feature-point detector, in camera (image) terms
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EyeLandmarks {
    /// Eye on the image's left side (the person's right eye)
    pub image_left: Option<Point>,
    /// Eye on the image's right side (the person's left eye)
    pub image_right: Option<Point>,
    pub image_left_closed: bool,
    pub image_right_closed: bool,
}

/// External feature-point eye locator
pub trait EyeLandmarkSource: Send {
    /// Locate eye centres in `image` (top-left pixel coordinates)
    fn locate(&mut self, image: &RgbImage, detect_blinks: bool) -> Result<Option<EyeLandmarks>>;
}

impl<F> EyeLandmarkSource for F
where
    F: FnMut(&RgbImage, bool) -> Result<Option<EyeLandmarks>> + Send,
{
    fn locate(&mut self, image: &RgbImage, detect_blinks: bool) -> Result<Option<EyeLandmarks>> {
        self(image, detect_blinks)
    }
}

/// External box-producing eye classifier
pub trait EyeBoxSource: Send {
    /// Every eye candidate in `image` (top-left pixel coordinates)
    fn detect_all(&mut self, image: &RgbImage) -> Result<Vec<Rect>>;
}

impl<F> EyeBoxSource for F
where
    F: FnMut(&RgbImage) -> Result<Vec<Rect>> + Send,
{
    fn detect_all(&mut self, image: &RgbImage) -> Result<Vec<Rect>> {
        self(image)
    }
}

/// Turns eye centre points into square eye boxes.
///
/// The crop is downsampled to a fixed working width before the source runs;
/// boxes are sized relative to that width and scaled back afterwards.
pub struct LandmarkEyeDetector<S> {
    source: S,
    detect_blinks: bool,
}

impl<S: EyeLandmarkSource> LandmarkEyeDetector<S> {
    pub fn new(source: S, detect_blinks: bool) -> Self {
        Self { source, detect_blinks }
    }

    pub fn set_detect_blinks(&mut self, detect_blinks: bool) {
        self.detect_blinks = detect_blinks;
    }
}

/// Convert working-resolution eye centres into full-resolution person-relative boxes
#[must_use]
pub fn eye_boxes_from_landmarks(landmarks: &EyeLandmarks, crop_width: f64, detect_blinks: bool) -> Option<EyePair> {
    let (Some(image_left), Some(image_right)) = (landmarks.image_left, landmarks.image_right) else {
        return None;
    };
    if crop_width <= 0.0 {
        return None;
    }

    let inverse_scale = crop_width / LANDMARK_WORKING_WIDTH;
    let box_size = LANDMARK_WORKING_WIDTH * LANDMARK_EYE_BOX_FRACTION;
    let half = box_size / 2.0;
    let eye_box = |centre: Point| Rect::new(centre.x - half, centre.y - half, box_size, box_size).scale(inverse_scale);

    let blink = |closed: bool| detect_blinks.then_some(closed);

    Some(EyePair {
        left: EyeObservation {
            rect: eye_box(image_right),
            closed: blink(landmarks.image_right_closed),
        },
        right: EyeObservation {
            rect: eye_box(image_left),
            closed: blink(landmarks.image_left_closed),
        },
    })
}

impl<S: EyeLandmarkSource> EyeDetector for LandmarkEyeDetector<S> {
    fn detect(&mut self, face_crop: &RgbImage) -> Result<Option<EyePair>> {
        if face_crop.width() == 0 || face_crop.height() == 0 {
            return Ok(None);
        }
        let working = resize_to_width(face_crop, LANDMARK_WORKING_WIDTH);
        let Some(landmarks) = self.source.locate(&working, self.detect_blinks)? else {
            debug!("Landmark source found no face in crop");
            return Ok(None);
        };
        Ok(eye_boxes_from_landmarks(
            &landmarks,
            f64::from(face_crop.width()),
            self.detect_blinks,
        ))
    }

    fn kind(&self) -> EyeDetectorKind {
        EyeDetectorKind::Landmark
    }

    fn name(&self) -> &str {
        "LandmarkEyeDetector"
    }
}

/// Picks two eyes out of a cascade classifier's candidate boxes
pub struct CascadeEyeDetector<S> {
    source: S,
}

impl<S: EyeBoxSource> CascadeEyeDetector<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

/// Leftmost candidate is the person's right eye, rightmost the left eye.
///
/// Degenerate candidates are ignored; fewer than two usable boxes is no detection.
#[must_use]
pub fn select_cascade_eyes(candidates: &[Rect]) -> Option<EyePair> {
    let usable: Vec<Rect> = candidates.iter().copied().filter(|r| !r.is_degenerate()).collect();
    if usable.len() < 2 {
        return None;
    }

    let mut leftmost = usable[0];
    let mut rightmost = usable[0];
    for candidate in &usable[1..] {
        if candidate.x < leftmost.x {
            leftmost = *candidate;
        }
        if candidate.x > rightmost.x {
            rightmost = *candidate;
        }
    }

    Some(EyePair {
        left: EyeObservation {
            rect: rightmost,
            closed: None,
        },
        right: EyeObservation {
            rect: leftmost,
            closed: None,
        },
    })
}

impl<S: EyeBoxSource> EyeDetector for CascadeEyeDetector<S> {
    fn detect(&mut self, face_crop: &RgbImage) -> Result<Option<EyePair>> {
        let candidates = self.source.detect_all(face_crop)?;
        Ok(select_cascade_eyes(&candidates))
    }

    fn kind(&self) -> EyeDetectorKind {
        EyeDetectorKind::Cascade
    }

    fn name(&self) -> &str {
        "CascadeEyeDetector"
    }
}
