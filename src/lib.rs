//! Orientation-aware geometry and smoothing for front-camera gaze tracking.
//!
//! A gaze tracker detects a face and both eyes in every camera frame, crops
//! them, and hands the crops plus a coarse face-location grid to a network
//! that predicts where on the screen the user is looking. This crate is the
//! part between the detectors and the network, and after it:
//!
//! 1. Normalize face detections from sensor space into the upright frame
//!    for each of the four device orientations, including roll correction
//! 2. Pad, crop and run a pluggable eye detector, then smooth each eye with
//!    its own Kalman filter
//! 3. Rasterize the 25 × 25 face grid
//! 4. Map the network's camera-space prediction onto the screen of a known
//!    device in pixels, centimetres or millimetres
//!
//! # Examples
//!
//! ## Screen Mapping
//!
//! ```no_run
//! use gaze_estimation::device::DeviceTable;
//! use gaze_estimation::geometry::{Point, Size};
//! use gaze_estimation::orientation::Orientation;
//! use gaze_estimation::screen_mapping::map_to_screen;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = DeviceTable::builtin();
//! let px = map_to_screen(
//!     &table,
//!     Point::new(1.0, -1.0),
//!     "iPhone 6s",
//!     Orientation::Portrait,
//!     Size::new(750.0, 1334.0),
//!     false,
//! )?;
//! println!("Looking at ({:.1}, {:.1}) px", px.x, px.y);
//! # Ok(())
//! # }
//! ```
//!
//! ## Complete Pipeline
//!
//! ```no_run
//! use gaze_estimation::config::Config;
//! use gaze_estimation::eye_detection::{CascadeEyeDetector, EyeDetectorKind};
//! use gaze_estimation::frame::CameraFrame;
//! use gaze_estimation::geometry::{Point, Rect};
//! use gaze_estimation::normalizer::RawFaceDetection;
//! use gaze_estimation::orientation::DeviceOrientation;
//! use gaze_estimation::session::{GazeInputs, GazeSession};
//! use image::RgbImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::default();
//! config.session.eye_detector = EyeDetectorKind::Cascade;
//!
//! // Stand-in for a real eye classifier
//! let detector = CascadeEyeDetector::new(|_crop: &RgbImage| -> gaze_estimation::Result<Vec<Rect>> {
//!     Ok(vec![Rect::new(20.0, 30.0, 15.0, 15.0), Rect::new(60.0, 30.0, 15.0, 15.0)])
//! });
//! let mut session = GazeSession::new(&config, Box::new(detector))?
//!     .with_network(|_inputs: &GazeInputs| -> gaze_estimation::Result<Point> { Ok(Point::new(0.5, -2.0)) });
//!
//! // Metadata usually arrives from another thread
//! let slot = session.metadata_slot();
//! slot.submit(
//!     RawFaceDetection::with_angles(Rect::new(0.3, 0.3, 0.4, 0.4), Some(0.0), Some(270.0)),
//!     DeviceOrientation::Portrait,
//! );
//!
//! let output = session.process_frame(CameraFrame::new(RgbImage::new(640, 480)))?;
//! if let Some(gaze) = output.gaze {
//!     println!("Gaze: {:?}", gaze.screen);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Filters
//!
//! ```no_run
//! use gaze_estimation::filters::create_filter;
//! use gaze_estimation::geometry::Point;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut filter = create_filter("kalman")?;
//! let smoothed = filter.process_point(Point::new(120.0, 80.0));
//! println!("Smoothed eye at ({:.1}, {:.1})", smoothed.x, smoothed.y);
//! filter.reset();
//! # Ok(())
//! # }
//! ```

/// Points, sizes, rectangles and coordinate-space transforms
pub mod geometry;

/// Device orientation handling
pub mod orientation;

/// Face detection normalization and padding
pub mod normalizer;

/// Temporal smoothing filters for eye positions
pub mod filters;

/// Face-location grid rasterization
pub mod face_grid;

/// Physical device geometry table
pub mod device;

/// Camera-space to screen-space mapping
pub mod screen_mapping;

/// Eye detector trait and implementations
pub mod eye_detection;

/// Per-frame data
pub mod frame;

/// Frame rate counting
pub mod fps;

/// Display-space conversion for overlays
pub mod display;

/// Gaze pipeline session and metadata hand-off
pub mod session;

/// Utility functions for image processing and numeric conversions
pub mod utils;

/// Error types and result handling
pub mod error;

/// Constants used throughout the library
pub mod constants;

/// Configuration management
pub mod config;

/// Command line interface
pub mod cli;

pub use error::{Error, Result};
