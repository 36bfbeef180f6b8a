//! Per-frame gaze pipeline.
//!
//! A [`GazeSession`] owns everything that lives longer than one frame: the eye
//! filters, the detection lock, the screen mapper and the collaborators. Face
//! metadata arrives on another thread through a [`FaceMetadataSlot`].
//!
//! Frame flow: orient the raw image, normalize the latest face detection,
//! crop the padded face, find the eyes, unpad and smooth them, rasterize the
//! face grid, run the network and map its output onto the screen.

use crate::config::Config;
use crate::device::DeviceTable;
use crate::display::{display_boxes, DisplayBoxes};
use crate::eye_detection::{EyeDetector, EyePair};
use crate::face_grid::{rasterize, FaceGrid};
use crate::filters::PointFilter;
use crate::fps::FpsCounter;
use crate::frame::{CameraFrame, FaceFrame};
use crate::geometry::{Point, Rect, Size};
use crate::normalizer::{DetectionNormalizer, RawFaceDetection};
use crate::orientation::{DeviceOrientation, Orientation, OrientationTracker};
use crate::screen_mapping::GazeMapper;
use crate::utils::image_conversion::{crop_clamped, image_to_tensor, orient_frame, resize_square};
use crate::{Error, Result};
use image::RgbImage;
use log::{debug, info, warn};
use ndarray::Array4;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Network inputs for one frame: two eye crops, the face crop and the face grid
#[derive(Debug, Clone)]
pub struct GazeInputs {
    pub left_eye: RgbImage,
    pub right_eye: RgbImage,
    pub face: RgbImage,
    pub face_grid: FaceGrid,
}

impl GazeInputs {
    /// Normalized NCHW tensor of one crop
    #[must_use]
    pub fn image_tensor(image: &RgbImage) -> Array4<f32> {
        image_to_tensor(image)
    }

    /// Face grid as a (1, cells, 1, 1) tensor
    #[must_use]
    pub fn grid_tensor(&self) -> Array4<f32> {
        let cells = self.face_grid.cells();
        Array4::from_shape_fn((1, cells.len(), 1, 1), |(_, i, _, _)| cells[i])
    }
}

/// Opaque gaze predictor: crops plus grid to a camera-space point in centimetres
pub trait GazeNetwork: Send {
    /// Predict the gaze point for one frame
    fn predict(&mut self, inputs: &GazeInputs) -> Result<Point>;
}

impl<F> GazeNetwork for F
where
    F: FnMut(&GazeInputs) -> Result<Point> + Send,
{
    fn predict(&mut self, inputs: &GazeInputs) -> Result<Point> {
        self(inputs)
    }
}

#[derive(Debug)]
struct MetadataState {
    current: Option<RawFaceDetection>,
    // Some(update) while a frame is processing; the inner None clears the face
    queued: Option<Option<RawFaceDetection>>,
    processing: bool,
    orientation: OrientationTracker,
    fps: FpsCounter,
}

/// Hand-off point between the face metadata thread and frame processing.
///
/// Each detection drives at most one frame. Detections submitted while no
/// frame is processing replace the current one immediately. Detections
/// submitted during processing are held back; when the frame finishes the
/// consumed detection is cleared and the latest held one takes its place.
#[derive(Debug, Clone)]
pub struct FaceMetadataSlot {
    inner: Arc<Mutex<MetadataState>>,
}

impl FaceMetadataSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::with_supported(&Orientation::ALL)
    }

    /// Slot that only accepts the given orientations
    #[must_use]
    pub fn with_supported(supported: &[Orientation]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetadataState {
                current: None,
                queued: None,
                processing: false,
                orientation: OrientationTracker::with_supported(supported),
                fps: FpsCounter::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MetadataState> {
        // Plain data inside; a panic elsewhere cannot leave it half-written
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offer a detection from the metadata thread
    pub fn submit(&self, detection: RawFaceDetection, orientation: DeviceOrientation) {
        self.update(Some(detection), orientation);
    }

    /// Report that the metadata detector currently sees no face
    pub fn submit_empty(&self, orientation: DeviceOrientation) {
        self.update(None, orientation);
    }

    fn update(&self, detection: Option<RawFaceDetection>, orientation: DeviceOrientation) {
        let mut state = self.state();
        state.orientation.observe(orientation);
        state.fps.count_frame();
        if state.processing {
            state.queued = Some(detection);
        } else {
            state.current = detection;
        }
    }

    /// Feed an orientation reading that arrived without metadata
    pub fn observe_orientation(&self, orientation: DeviceOrientation) -> Orientation {
        self.state().orientation.observe(orientation)
    }

    /// Orientation currently in effect
    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.state().orientation.current()
    }

    /// Metadata submissions in the last second
    #[must_use]
    pub fn metadata_fps(&self) -> usize {
        self.state().fps.rate()
    }

    /// Detection the next frame would use
    #[must_use]
    pub fn current(&self) -> Option<RawFaceDetection> {
        self.state().current
    }

    fn begin_frame(&self) -> (Option<RawFaceDetection>, Orientation) {
        let mut state = self.state();
        state.processing = true;
        (state.current, state.orientation.current())
    }

    fn finish_frame(&self) {
        let mut state = self.state();
        state.processing = false;
        state.current = state.queued.take().flatten();
    }
}

impl Default for FaceMetadataSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Detection geometry frozen by the lock
#[derive(Debug, Clone, Copy, PartialEq)]
struct LockedDetection {
    face_rect: Rect,
    yaw: Option<f64>,
    roll: Option<f64>,
    left_eye: Rect,
    right_eye: Rect,
    left_eye_closed: Option<bool>,
    right_eye_closed: Option<bool>,
    orientation: Orientation,
}

impl LockedDetection {
    fn capture(frame: &FaceFrame) -> Option<Self> {
        Some(Self {
            face_rect: frame.face_rect?,
            yaw: frame.face_yaw,
            roll: frame.face_roll,
            left_eye: frame.left_eye?,
            right_eye: frame.right_eye?,
            left_eye_closed: frame.left_eye_closed,
            right_eye_closed: frame.right_eye_closed,
            orientation: frame.orientation,
        })
    }

    fn apply(&self, frame: &mut FaceFrame) {
        frame.face_rect = Some(self.face_rect);
        frame.face_yaw = self.yaw;
        frame.face_roll = self.roll;
        frame.left_eye = Some(self.left_eye);
        frame.right_eye = Some(self.right_eye);
        frame.left_eye_closed = self.left_eye_closed;
        frame.right_eye_closed = self.right_eye_closed;
        frame.refresh_face_crop();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LockState {
    Unlocked,
    /// Waiting for the first frame with a face and both eyes
    Armed,
    Locked(LockedDetection),
}

/// Network prediction for one frame
#[derive(Debug)]
pub struct GazeEstimate {
    /// Prediction in centimetres relative to the camera
    pub camera: Point,
    /// Screen position in the configured unit, or why it could not be mapped
    pub screen: Result<Point>,
}

/// Result of processing one frame
#[derive(Debug)]
pub struct FrameOutput {
    pub face_frame: FaceFrame,
    pub gaze: Option<GazeEstimate>,
    pub looking_at_camera: bool,
}

/// Gaze pipeline state for one camera session
pub struct GazeSession {
    config: Config,
    slot: FaceMetadataSlot,
    detector: Box<dyn EyeDetector>,
    network: Option<Box<dyn GazeNetwork>>,
    mapper: GazeMapper,
    normalizer: DetectionNormalizer,
    left_filter: Box<dyn PointFilter>,
    right_filter: Box<dyn PointFilter>,
    lock: LockState,
    frame_fps: FpsCounter,
    last_detection_duration: Option<Duration>,
}

impl GazeSession {
    /// Build a session from configuration and an eye detector
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the device table cannot be loaded
    pub fn new(config: &Config, detector: Box<dyn EyeDetector>) -> Result<Self> {
        config.validate()?;
        if detector.kind() != config.session.eye_detector {
            warn!(
                "Configured eye detector is {:?} but {} was supplied; padding follows the supplied one",
                config.session.eye_detector,
                detector.name()
            );
        }

        let normalizer = DetectionNormalizer::new(config.padding_for(detector.kind()))?;
        let mapper = GazeMapper::new(
            config.device_table()?,
            config.session.device.clone(),
            config.screen_size(),
            config.session.screen_unit,
        );

        info!(
            "Gaze session: device '{}', {} eye detector, {} filter",
            config.session.device,
            detector.name(),
            config.filter.kind
        );

        Ok(Self {
            config: config.clone(),
            slot: FaceMetadataSlot::with_supported(&config.session.supported_orientations),
            network: None,
            mapper,
            normalizer,
            left_filter: config.create_filter()?,
            right_filter: config.create_filter()?,
            detector,
            lock: LockState::Unlocked,
            frame_fps: FpsCounter::new(),
            last_detection_duration: None,
        })
    }

    /// Attach the gaze network
    #[must_use]
    pub fn with_network(mut self, network: impl GazeNetwork + 'static) -> Self {
        self.set_network(network);
        self
    }

    pub fn set_network(&mut self, network: impl GazeNetwork + 'static) {
        self.network = Some(Box::new(network));
    }

    /// Replace the device table used for screen mapping
    #[must_use]
    pub fn with_device_table(mut self, table: DeviceTable) -> Self {
        self.mapper.set_table(table);
        self
    }

    /// Handle for the face metadata thread
    #[must_use]
    pub fn metadata_slot(&self) -> FaceMetadataSlot {
        self.slot.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Freeze the next complete detection; restarts the lock if already locked
    pub fn lock_detection(&mut self) {
        debug!("Detection lock armed");
        self.lock = LockState::Armed;
    }

    pub fn unlock_detection(&mut self) {
        debug!("Detection lock released");
        self.lock = LockState::Unlocked;
    }

    /// True once a detection has been frozen
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self.lock, LockState::Locked(_))
    }

    /// Face and eye boxes of `face_frame` in preview coordinates for a `view`-sized preview
    #[must_use]
    pub fn display_boxes(&self, face_frame: &FaceFrame, view: Size) -> Option<DisplayBoxes> {
        display_boxes(face_frame, self.config.session.video_gravity, view)
    }

    /// Clear both eye filters
    pub fn reset_filters(&mut self) {
        self.left_filter.reset();
        self.right_filter.reset();
    }

    /// Processed frames in the last second
    pub fn frame_fps(&mut self) -> usize {
        self.frame_fps.rate()
    }

    /// Wall time of the most recent eye detector call
    #[must_use]
    pub const fn last_detection_duration(&self) -> Option<Duration> {
        self.last_detection_duration
    }

    /// Run the pipeline on one raw camera frame
    ///
    /// Consumes the pending face detection; a frame with no fresh detection
    /// has no face. Eye boxes are smoothed as top-left origins relative to
    /// the unpadded face crop.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingNetworkResult` when the network fails, and
    /// propagates eye detector errors
    pub fn process_frame(&mut self, frame: CameraFrame) -> Result<FrameOutput> {
        self.frame_fps.count_frame_at(frame.timestamp);

        let face_frame = if let LockState::Locked(locked) = self.lock {
            let image = orient_frame(&frame.image, locked.orientation);
            let mut face_frame = FaceFrame::new(frame.timestamp, image, locked.orientation);
            locked.apply(&mut face_frame);
            face_frame
        } else {
            let (detection, orientation) = self.slot.begin_frame();
            let detected = self.detect(&frame, detection, orientation);
            self.slot.finish_frame();
            let face_frame = detected?;

            if self.lock == LockState::Armed {
                if let Some(locked) = LockedDetection::capture(&face_frame) {
                    info!("Detection locked at {:?}", locked.face_rect);
                    self.lock = LockState::Locked(locked);
                }
            }
            face_frame
        };

        let looking_at_camera =
            face_frame.has_face() && self.config.looking_at_camera(face_frame.face_yaw, face_frame.face_roll);

        let gaze = self.estimate(&face_frame)?;

        Ok(FrameOutput {
            face_frame,
            gaze,
            looking_at_camera,
        })
    }

    /// Normalize, crop and find the eyes for one unlocked frame.
    ///
    /// The eye filters smooth each eye's top-left origin in face-crop
    /// coordinates, after the padding has been removed.
    fn detect(
        &mut self,
        frame: &CameraFrame,
        detection: Option<RawFaceDetection>,
        orientation: Orientation,
    ) -> Result<FaceFrame> {
        let image = orient_frame(&frame.image, orientation);
        let mut face_frame = FaceFrame::new(frame.timestamp, image, orientation);

        let Some(normalized) = detection
            .and_then(|raw| self.normalizer.normalize(&raw, orientation, face_frame.frame_size))
        else {
            return Ok(face_frame);
        };

        face_frame.face_rect = Some(normalized.face_rect);
        face_frame.face_yaw = normalized.yaw;
        face_frame.face_roll = normalized.roll;
        face_frame.refresh_face_crop();

        let padded = self.normalizer.pad(&normalized.face_rect);
        let Some(padded_crop) = crop_clamped(&face_frame.image, &padded.padded) else {
            return Ok(face_frame);
        };

        let started = Instant::now();
        let eyes = self.detector.detect(&padded_crop)?;
        self.last_detection_duration = Some(started.elapsed());

        let Some(EyePair { left, right }) = eyes else {
            return Ok(face_frame);
        };
        let left_rect = padded.unpad_eye(&left.rect);
        let right_rect = padded.unpad_eye(&right.rect);
        if left_rect.is_degenerate() || right_rect.is_degenerate() {
            debug!("Discarding degenerate eye detection");
            return Ok(face_frame);
        }

        let left_origin = self.left_filter.process_point(left_rect.origin());
        let right_origin = self.right_filter.process_point(right_rect.origin());

        face_frame.left_eye = Some(left_rect.with_origin(left_origin));
        face_frame.right_eye = Some(right_rect.with_origin(right_origin));
        face_frame.left_eye_closed = left.closed;
        face_frame.right_eye_closed = right.closed;
        Ok(face_frame)
    }

    /// Network inputs for a frame with a face and both eyes
    #[must_use]
    pub fn build_inputs(&self, face_frame: &FaceFrame) -> Option<GazeInputs> {
        let face_rect = face_frame.face_rect?;
        let side = self.config.network.input_size;
        let (Some(left), Some(right), Some(face)) = (
            face_frame.left_eye_crop(),
            face_frame.right_eye_crop(),
            face_frame.face_crop.as_ref(),
        ) else {
            return None;
        };

        let grid = &self.config.face_grid;
        let face_grid = rasterize(
            face_frame.frame_size.width,
            face_frame.frame_size.height,
            grid.width,
            grid.height,
            &face_rect,
        );

        Some(GazeInputs {
            left_eye: resize_square(&left, side),
            right_eye: resize_square(&right, side),
            face: resize_square(face, side),
            face_grid,
        })
    }

    fn estimate(&mut self, face_frame: &FaceFrame) -> Result<Option<GazeEstimate>> {
        if self.network.is_none() || !face_frame.has_face_and_eyes() {
            return Ok(None);
        }
        let Some(inputs) = self.build_inputs(face_frame) else {
            return Ok(None);
        };
        let Some(network) = self.network.as_mut() else {
            return Ok(None);
        };

        let camera = network.predict(&inputs).map_err(|e| match e {
            Error::MissingNetworkResult(_) => e,
            other => Error::MissingNetworkResult(other.to_string()),
        })?;

        let orientation = face_frame.orientation;
        let screen = if orientation.is_landscape() {
            self.config.screen_size().transposed()
        } else {
            self.config.screen_size()
        };
        self.mapper.set_screen(screen);
        let mapped = self.mapper.map(camera, orientation);
        if let Err(e) = &mapped {
            warn!("Cannot map gaze to screen: {e}");
        }

        Ok(Some(GazeEstimate { camera, screen: mapped }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x: f64) -> RawFaceDetection {
        RawFaceDetection::new(Rect::new(x, 0.25, 0.5, 0.5))
    }

    #[test]
    fn test_submit_while_idle_replaces_current() {
        let slot = FaceMetadataSlot::new();
        slot.submit(detection(0.1), DeviceOrientation::Portrait);
        slot.submit(detection(0.2), DeviceOrientation::Portrait);
        assert_eq!(slot.current(), Some(detection(0.2)));
    }

    #[test]
    fn test_submit_while_processing_is_queued() {
        let slot = FaceMetadataSlot::new();
        slot.submit(detection(0.1), DeviceOrientation::Portrait);

        let (used, _) = slot.begin_frame();
        assert_eq!(used, Some(detection(0.1)));

        slot.submit(detection(0.2), DeviceOrientation::Portrait);
        slot.submit(detection(0.3), DeviceOrientation::Portrait);
        assert_eq!(slot.current(), Some(detection(0.1)));

        slot.finish_frame();
        assert_eq!(slot.current(), Some(detection(0.3)));
    }

    #[test]
    fn test_detection_is_consumed_by_one_frame() {
        let slot = FaceMetadataSlot::new();
        slot.submit(detection(0.1), DeviceOrientation::Portrait);

        let (used, _) = slot.begin_frame();
        assert_eq!(used, Some(detection(0.1)));
        slot.finish_frame();
        assert_eq!(slot.current(), None);

        let (used, _) = slot.begin_frame();
        assert_eq!(used, None);
        slot.finish_frame();
    }

    #[test]
    fn test_empty_submission_clears_after_frame() {
        let slot = FaceMetadataSlot::new();
        slot.submit(detection(0.1), DeviceOrientation::Portrait);
        let _ = slot.begin_frame();
        slot.submit_empty(DeviceOrientation::Portrait);
        slot.finish_frame();
        assert_eq!(slot.current(), None);
    }

    #[test]
    fn test_slot_orientation_is_sticky() {
        let slot = FaceMetadataSlot::new();
        slot.submit(detection(0.1), DeviceOrientation::LandscapeRight);
        assert_eq!(slot.observe_orientation(DeviceOrientation::FaceUp), Orientation::LandscapeRight);
        assert_eq!(slot.orientation(), Orientation::LandscapeRight);
        assert_eq!(slot.metadata_fps(), 1);
    }

    #[test]
    fn test_grid_tensor_shape() {
        let inputs = GazeInputs {
            left_eye: RgbImage::new(4, 4),
            right_eye: RgbImage::new(4, 4),
            face: RgbImage::new(4, 4),
            face_grid: FaceGrid::from_face(
                Size::new(100.0, 100.0),
                &Rect::new(0.0, 0.0, 100.0, 100.0),
            ),
        };
        let tensor = inputs.grid_tensor();
        assert_eq!(tensor.shape(), &[1, 625, 1, 1]);
        assert_eq!(tensor.sum(), 625.0);
        assert_eq!(GazeInputs::image_tensor(&inputs.face).shape(), &[1, 3, 4, 4]);
    }
}
