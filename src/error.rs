//! Error types for the gaze estimation library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// A device orientation outside the four supported ones reached the pipeline
    #[error("Unsupported orientation: {0}")]
    UnsupportedOrientation(String),

    /// Device model name missing from the device geometry table
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    /// The gaze network call failed or produced no prediction
    #[error("Missing network result: {0}")]
    MissingNetworkResult(String),

    /// Eye detector collaborator failed
    #[error("Eye detection error: {0}")]
    EyeDetection(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image processing operation failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// YAML (de)serialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
