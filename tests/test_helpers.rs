//! Helper functions and utilities for tests

#![allow(dead_code)]

use gaze_estimation::config::Config;
use gaze_estimation::eye_detection::{CascadeEyeDetector, EyeDetectorKind};
use gaze_estimation::frame::CameraFrame;
use gaze_estimation::geometry::{Point, Rect};
use gaze_estimation::session::GazeSession;
use gaze_estimation::Result;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sensor frame size used throughout the integration tests
pub const SENSOR_WIDTH: u32 = 640;
pub const SENSOR_HEIGHT: u32 = 480;

/// Create a raw sensor frame with a simple gradient
pub fn create_test_frame() -> CameraFrame {
    let image = RgbImage::from_fn(SENSOR_WIDTH, SENSOR_HEIGHT, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    CameraFrame::new(image)
}

/// Assert two points agree within `tolerance`
pub fn assert_point_close(actual: Point, expected: Point, tolerance: f64) {
    assert!(
        (actual.x - expected.x).abs() <= tolerance && (actual.y - expected.y).abs() <= tolerance,
        "expected {expected:?}, got {actual:?}"
    );
}

/// Config for deterministic pipeline tests: cascade detector, no smoothing
pub fn cascade_config() -> Config {
    let mut config = Config::default();
    config.session.eye_detector = EyeDetectorKind::Cascade;
    config.filter.kind = "none".to_string();
    config
}

/// Cascade detector that always reports the same candidates and counts its calls
pub fn fixed_cascade_detector(
    candidates: Vec<Rect>,
) -> (CascadeEyeDetector<impl FnMut(&RgbImage) -> Result<Vec<Rect>> + Send>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let detector = CascadeEyeDetector::new(move |_crop: &RgbImage| -> Result<Vec<Rect>> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(candidates.clone())
    });
    (detector, calls)
}

/// Session with a fixed cascade detector and a constant network output
pub fn create_test_session(config: &Config, candidates: Vec<Rect>, prediction: Point) -> Result<GazeSession> {
    let (detector, _) = fixed_cascade_detector(candidates);
    Ok(GazeSession::new(config, Box::new(detector))?
        .with_network(move |_inputs: &gaze_estimation::session::GazeInputs| -> Result<Point> { Ok(prediction) }))
}
