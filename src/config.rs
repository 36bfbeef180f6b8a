//! Configuration management for gaze estimation sessions

use crate::constants::{
    DEFAULT_CASCADE_PADDING, DEFAULT_EXPONENTIAL_ALPHA, DEFAULT_FPS, DEFAULT_KALMAN_MEASUREMENT_NOISE,
    DEFAULT_KALMAN_PROCESS_NOISE, DEFAULT_KALMAN_VELOCITY_VARIANCE, DEFAULT_LANDMARK_PADDING,
    DEFAULT_NETWORK_INPUT_SIZE, DEFAULT_ROLL_TOLERANCE, DEFAULT_YAW_TOLERANCE, FACE_GRID_HEIGHT, FACE_GRID_WIDTH,
};
use crate::device::DeviceTable;
use crate::display::VideoGravity;
use crate::eye_detection::{EyeDetectorKind, EyeLandmarkSource, LandmarkEyeDetector};
use crate::filters::{
    create_filter,
    exponential::ExponentialFilter,
    kalman::{KalmanParams, KalmanPointFilter},
    PointFilter,
};
use crate::geometry::Size;
use crate::orientation::Orientation;
use crate::screen_mapping::ScreenUnit;
use crate::utils::circular_distance_degrees;
use crate::{Error, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Gaze session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device, screen and detector selection
    pub session: SessionConfig,

    /// Face padding per eye detector
    pub padding: PaddingConfig,

    /// Eye position smoothing
    pub filter: FilterConfig,

    /// Face grid dimensions
    pub face_grid: FaceGridConfig,

    /// Gaze network input
    pub network: NetworkConfig,

    /// Device geometry table overrides
    pub device: DeviceConfig,

    /// "Looking at camera" thresholds
    pub attention: AttentionConfig,
}

/// Session-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Device model name, looked up in the device table
    pub device: String,

    /// Screen width in pixels, as displayed in portrait
    pub screen_width: f64,

    /// Screen height in pixels, as displayed in portrait
    pub screen_height: f64,

    /// Unit of mapped gaze points
    pub screen_unit: ScreenUnit,

    /// Which eye detector to use
    pub eye_detector: EyeDetectorKind,

    /// Report eye-closed flags (landmark detector only)
    pub detect_blinks: bool,

    /// Orientations the session accepts
    pub supported_orientations: Vec<Orientation>,

    /// Preview fitting used for display boxes
    pub video_gravity: VideoGravity,
}

/// Face padding fractions (of face width, per edge)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaddingConfig {
    /// Padding for the landmark eye detector
    pub landmark: f64,

    /// Padding for the cascade eye detector
    pub cascade: f64,
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filter type: kalman, exponential or none
    pub kind: String,

    /// Kalman process noise
    pub process_noise: f64,

    /// Kalman measurement noise
    pub measurement_noise: f64,

    /// Kalman velocity variance after initialization
    pub initial_velocity_variance: f64,

    /// Nominal frame rate (Kalman dt = 1 / fps)
    pub fps: f64,

    /// Exponential filter alpha value
    pub exponential_alpha: f64,
}

/// Face grid dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceGridConfig {
    pub width: usize,
    pub height: usize,
}

/// Network input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Side of the square eye and face crops
    pub input_size: u32,
}

/// Device table configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Optional YAML file with extra device profiles
    pub table_file: Option<PathBuf>,

    /// Use only the file's profiles instead of extending the built-in ones
    pub replace_builtin: bool,
}

/// Head angle thresholds for "looking at camera"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Maximum yaw distance from 0 degrees
    pub yaw_tolerance: f64,

    /// Maximum roll distance from 0 degrees
    pub roll_tolerance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: "iPhone 6s".to_string(),
            screen_width: 750.0,
            screen_height: 1334.0,
            screen_unit: ScreenUnit::Pixels,
            eye_detector: EyeDetectorKind::Landmark,
            detect_blinks: false,
            supported_orientations: Orientation::ALL.to_vec(),
            video_gravity: VideoGravity::AspectFill,
        }
    }
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            landmark: DEFAULT_LANDMARK_PADDING,
            cascade: DEFAULT_CASCADE_PADDING,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: "kalman".to_string(),
            process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
            initial_velocity_variance: DEFAULT_KALMAN_VELOCITY_VARIANCE,
            fps: DEFAULT_FPS,
            exponential_alpha: DEFAULT_EXPONENTIAL_ALPHA,
        }
    }
}

impl Default for FaceGridConfig {
    fn default() -> Self {
        Self {
            width: FACE_GRID_WIDTH,
            height: FACE_GRID_HEIGHT,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_NETWORK_INPUT_SIZE,
        }
    }
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            yaw_tolerance: DEFAULT_YAW_TOLERANCE,
            roll_tolerance: DEFAULT_ROLL_TOLERANCE,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the YAML does not match the schema
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Kalman tuning derived from the filter section
    #[must_use]
    pub fn kalman_params(&self) -> KalmanParams {
        KalmanParams {
            process_noise: self.filter.process_noise,
            measurement_noise: self.filter.measurement_noise,
            initial_velocity_variance: self.filter.initial_velocity_variance,
            dt: 1.0 / self.filter.fps,
        }
    }

    /// Create one eye filter from configuration
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown filter kind or invalid parameters
    pub fn create_filter(&self) -> Result<Box<dyn PointFilter>> {
        match self.filter.kind.to_lowercase().as_str() {
            "kalman" => Ok(Box::new(KalmanPointFilter::with_params(self.kalman_params())?)),
            "exponential" => Ok(Box::new(ExponentialFilter::try_new(self.filter.exponential_alpha)?)),
            name => create_filter(name),
        }
    }

    /// Landmark eye detector honouring the blink setting
    pub fn landmark_eye_detector<S: EyeLandmarkSource>(&self, source: S) -> LandmarkEyeDetector<S> {
        LandmarkEyeDetector::new(source, self.session.detect_blinks)
    }

    /// Padding fraction for the given eye detector
    #[must_use]
    pub fn padding_for(&self, kind: EyeDetectorKind) -> f64 {
        match kind {
            EyeDetectorKind::Landmark => self.padding.landmark,
            EyeDetectorKind::Cascade => self.padding.cascade,
        }
    }

    /// Portrait screen size in pixels
    #[must_use]
    pub fn screen_size(&self) -> Size {
        Size::new(self.session.screen_width, self.session.screen_height)
    }

    /// Built-in device table, extended or replaced by the configured file
    ///
    /// # Errors
    ///
    /// Returns an error if the device file cannot be loaded
    pub fn device_table(&self) -> Result<DeviceTable> {
        let Some(path) = &self.device.table_file else {
            return Ok(DeviceTable::builtin());
        };

        let loaded = DeviceTable::from_yaml_file(path)?;
        if self.device.replace_builtin {
            info!("Using only device profiles from {}", path.display());
            return Ok(loaded);
        }

        let mut table = DeviceTable::builtin();
        table.merge(loaded);
        Ok(table)
    }

    /// True when the head faces the camera within the configured tolerances.
    ///
    /// A missing angle does not disqualify.
    #[must_use]
    pub fn looking_at_camera(&self, yaw: Option<f64>, roll: Option<f64>) -> bool {
        let within = |angle: Option<f64>, tolerance: f64| {
            angle.map_or(true, |angle| circular_distance_degrees(angle, 0.0) <= tolerance)
        };
        within(yaw, self.attention.yaw_tolerance) && within(roll, self.attention.roll_tolerance)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        // Session
        if self.session.device.trim().is_empty() {
            return Err(Error::ConfigError("Device name must not be empty".to_string()));
        }
        if !(self.session.screen_width > 0.0 && self.session.screen_height > 0.0) {
            return Err(Error::ConfigError("Screen size must be positive".to_string()));
        }
        if self.session.supported_orientations.is_empty() {
            return Err(Error::ConfigError(
                "At least one supported orientation is required".to_string(),
            ));
        }

        // Padding
        for (name, value) in [("landmark", self.padding.landmark), ("cascade", self.padding.cascade)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::ConfigError(format!(
                    "{name} padding must be non-negative, got {value}"
                )));
            }
        }

        // Filter
        if !(self.filter.fps.is_finite() && self.filter.fps > 0.0) {
            return Err(Error::ConfigError("Filter fps must be greater than 0".to_string()));
        }
        if !(self.filter.exponential_alpha > 0.0 && self.filter.exponential_alpha <= 1.0) {
            return Err(Error::ConfigError(
                "Exponential alpha must be in (0.0, 1.0]".to_string(),
            ));
        }
        self.kalman_params()
            .validate()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        self.create_filter().map_err(|e| Error::ConfigError(e.to_string()))?;

        // Grid and network
        if self.face_grid.width == 0 || self.face_grid.height == 0 {
            return Err(Error::ConfigError("Face grid dimensions must be greater than 0".to_string()));
        }
        if self.network.input_size == 0 {
            return Err(Error::ConfigError("Network input size must be greater than 0".to_string()));
        }

        // Attention
        for (name, value) in [("yaw", self.attention.yaw_tolerance), ("roll", self.attention.roll_tolerance)] {
            if !(0.0..=180.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "{name} tolerance must be between 0 and 180 degrees"
                )));
            }
        }

        // Device file
        if let Some(path) = &self.device.table_file {
            if !path.exists() {
                return Err(Error::ConfigError(format!(
                    "Device table not found: {}",
                    path.display()
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Estimation Configuration

# Device and detector selection
session:
  device: "iPhone 6s"
  screen_width: 750.0
  screen_height: 1334.0
  screen_unit: pixels
  eye_detector: landmark
  detect_blinks: false
  supported_orientations:
    - portrait
    - landscape_left
    - landscape_right
    - portrait_upside_down
  video_gravity: aspect_fill

# Face padding as a fraction of face width, per edge
padding:
  landmark: 0.25
  cascade: 0.1

# Eye position smoothing (kalman, exponential or none)
filter:
  kind: "kalman"
  process_noise: 100.0
  measurement_noise: 4.0
  initial_velocity_variance: 100.0
  fps: 30.0
  exponential_alpha: 0.5

# Face grid fed to the network
face_grid:
  width: 25
  height: 25

# Network input crops
network:
  input_size: 224

# Extra device profiles (YAML mapping of name -> geometry in mm)
device:
  table_file: null
  replace_builtin: false

# Head angle limits for "looking at camera"
attention:
  yaw_tolerance: 45.0
  roll_tolerance: 30.0
"#;
