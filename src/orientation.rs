//! Device orientation handling.
//!
//! The pipeline understands exactly four orientations. Raw readings from the
//! device (which also report flat or unknown states) go through an
//! [`OrientationTracker`], which keeps the last supported value instead of
//! ever falling into an unsupported state.

use crate::constants::{
    ROLL_OFFSET_LANDSCAPE_LEFT, ROLL_OFFSET_LANDSCAPE_RIGHT, ROLL_OFFSET_PORTRAIT,
    ROLL_OFFSET_PORTRAIT_UPSIDE_DOWN,
};
use crate::geometry::Size;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four orientations the pipeline supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Home button at the bottom
    Portrait,
    /// Home button on the right
    LandscapeLeft,
    /// Home button on the left
    LandscapeRight,
    /// Home button at the top
    PortraitUpsideDown,
}

impl Orientation {
    /// All supported orientations
    pub const ALL: [Self; 4] = [
        Self::Portrait,
        Self::LandscapeLeft,
        Self::LandscapeRight,
        Self::PortraitUpsideDown,
    ];

    /// Offset added to the sensor roll before converting it to person-relative roll
    #[must_use]
    pub const fn roll_offset(self) -> f64 {
        match self {
            Self::Portrait => ROLL_OFFSET_PORTRAIT,
            Self::LandscapeLeft => ROLL_OFFSET_LANDSCAPE_LEFT,
            Self::LandscapeRight => ROLL_OFFSET_LANDSCAPE_RIGHT,
            Self::PortraitUpsideDown => ROLL_OFFSET_PORTRAIT_UPSIDE_DOWN,
        }
    }

    #[must_use]
    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }

    /// EXIF orientation that turns a front-camera sensor image upright
    #[must_use]
    pub const fn exif(self) -> ExifOrientation {
        match self {
            Self::Portrait => ExifOrientation::RightTop,
            Self::LandscapeLeft => ExifOrientation::BottomRight,
            Self::LandscapeRight => ExifOrientation::TopLeft,
            Self::PortraitUpsideDown => ExifOrientation::LeftBottom,
        }
    }

    /// Size of the upright image produced from a sensor frame of `sensor` size
    #[must_use]
    pub const fn oriented_size(self, sensor: Size) -> Size {
        match self {
            Self::Portrait | Self::PortraitUpsideDown => sensor.transposed(),
            Self::LandscapeLeft | Self::LandscapeRight => sensor,
        }
    }

    /// Size of the same frame seen in portrait
    #[must_use]
    pub const fn portrait_size(self, oriented: Size) -> Size {
        if self.is_landscape() {
            oriented.transposed()
        } else {
            oriented
        }
    }

    /// Short lowercase name, also accepted by `FromStr`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::LandscapeLeft => "landscape_left",
            Self::LandscapeRight => "landscape_right",
            Self::PortraitUpsideDown => "portrait_upside_down",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape_left" => Ok(Self::LandscapeLeft),
            "landscape_right" => Ok(Self::LandscapeRight),
            "portrait_upside_down" | "upside_down" => Ok(Self::PortraitUpsideDown),
            _ => Err(Error::UnsupportedOrientation(s.to_string())),
        }
    }
}

/// Raw orientation reading as reported by the device motion sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl From<Orientation> for DeviceOrientation {
    fn from(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Portrait => Self::Portrait,
            Orientation::LandscapeLeft => Self::LandscapeLeft,
            Orientation::LandscapeRight => Self::LandscapeRight,
            Orientation::PortraitUpsideDown => Self::PortraitUpsideDown,
        }
    }
}

impl TryFrom<DeviceOrientation> for Orientation {
    type Error = Error;

    fn try_from(raw: DeviceOrientation) -> Result<Self> {
        match raw {
            DeviceOrientation::Portrait => Ok(Self::Portrait),
            DeviceOrientation::LandscapeLeft => Ok(Self::LandscapeLeft),
            DeviceOrientation::LandscapeRight => Ok(Self::LandscapeRight),
            DeviceOrientation::PortraitUpsideDown => Ok(Self::PortraitUpsideDown),
            other => Err(Error::UnsupportedOrientation(format!("{other:?}"))),
        }
    }
}

/// EXIF orientation tag values: where row 0 and column 0 of the image sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExifOrientation {
    TopLeft = 1,
    TopRight = 2,
    BottomRight = 3,
    BottomLeft = 4,
    LeftTop = 5,
    RightTop = 6,
    RightBottom = 7,
    LeftBottom = 8,
}

/// Sticky orientation state.
///
/// Readings that are unsupported, or supported by the pipeline but disabled
/// for this session, leave the current orientation untouched.
#[derive(Debug, Clone)]
pub struct OrientationTracker {
    current: Orientation,
    supported: Vec<Orientation>,
}

impl OrientationTracker {
    /// Tracker accepting every orientation, starting in portrait
    #[must_use]
    pub fn new() -> Self {
        Self::with_supported(&Orientation::ALL)
    }

    /// Tracker accepting only `supported`, starting in portrait
    #[must_use]
    pub fn with_supported(supported: &[Orientation]) -> Self {
        Self {
            current: Orientation::Portrait,
            supported: supported.to_vec(),
        }
    }

    #[must_use]
    pub const fn current(&self) -> Orientation {
        self.current
    }

    /// Feed a raw reading and return the orientation now in effect
    pub fn observe(&mut self, raw: DeviceOrientation) -> Orientation {
        match Orientation::try_from(raw) {
            Ok(orientation) if self.supported.contains(&orientation) => {
                if orientation != self.current {
                    debug!("Orientation changed: {} -> {}", self.current, orientation);
                    self.current = orientation;
                }
            }
            _ => debug!("Ignoring orientation reading {raw:?}, keeping {}", self.current),
        }
        self.current
    }
}

impl Default for OrientationTracker {
    fn default() -> Self {
        Self::new()
    }
}
