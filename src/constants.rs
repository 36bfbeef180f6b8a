//! Constants used throughout the library

/// Face grid resolution expected by the gaze network
pub const FACE_GRID_WIDTH: usize = 25;
pub const FACE_GRID_HEIGHT: usize = 25;

/// Total number of face grid cells (25 × 25)
pub const FACE_GRID_CELLS: usize = FACE_GRID_WIDTH * FACE_GRID_HEIGHT;

/// Side length of the square eye/face crops fed to the network
pub const DEFAULT_NETWORK_INPUT_SIZE: u32 = 224;

/// Image normalization constants for network tensors
pub const IMAGE_NORMALIZATION_OFFSET: f32 = 127.5;
pub const IMAGE_NORMALIZATION_SCALE: f32 = 128.0;

/// Face padding, as a fraction of face width, added on every edge before eye detection
pub const DEFAULT_LANDMARK_PADDING: f64 = 0.25;
pub const DEFAULT_CASCADE_PADDING: f64 = 0.10;

/// Window a normalized sensor box must lie in to be taken as a face
pub const NORMALIZED_BOUNDS_MIN: f64 = -1.0;
pub const NORMALIZED_BOUNDS_MAX: f64 = 2.0;

/// Largest crop accepted, as a multiple of the source image's longer side
pub const MAX_CROP_SCALE: f64 = 8.0;

/// Working width the landmark eye detector downsamples face crops to
pub const LANDMARK_WORKING_WIDTH: f64 = 100.0;

/// Eye box side as a fraction of the (downsampled) face width
pub const LANDMARK_EYE_BOX_FRACTION: f64 = 0.2;

/// Per-orientation roll offsets in degrees
pub const ROLL_OFFSET_PORTRAIT: f64 = 90.0;
pub const ROLL_OFFSET_LANDSCAPE_LEFT: f64 = 180.0;
pub const ROLL_OFFSET_LANDSCAPE_RIGHT: f64 = 0.0;
pub const ROLL_OFFSET_PORTRAIT_UPSIDE_DOWN: f64 = 270.0;

/// Full turn in degrees
pub const FULL_TURN_DEGREES: f64 = 360.0;

/// Default frames per second assumption
pub const DEFAULT_FPS: f64 = 30.0;

/// Default Kalman filter parameters (pixel units)
pub const DEFAULT_KALMAN_PROCESS_NOISE: f64 = 100.0;
pub const DEFAULT_KALMAN_MEASUREMENT_NOISE: f64 = 4.0;
pub const DEFAULT_KALMAN_VELOCITY_VARIANCE: f64 = 100.0;

/// Default exponential filter alpha
pub const DEFAULT_EXPONENTIAL_ALPHA: f64 = 0.5;

/// "Looking at camera" tolerances in degrees
pub const DEFAULT_YAW_TOLERANCE: f64 = 45.0;
pub const DEFAULT_ROLL_TOLERANCE: f64 = 30.0;

/// Millimeters per centimeter
pub const MM_PER_CM: f64 = 10.0;

