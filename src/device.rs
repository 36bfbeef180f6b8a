//! Physical device geometry.
//!
//! The gaze network predicts a point in centimetres relative to the front
//! camera. Turning that into a screen position needs, per device model, the
//! offset from the camera to the screen's top-left corner and the physical
//! screen size, all in millimetres.

use crate::{Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Camera-to-screen offsets and screen size of one device model, in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceGeometry {
    /// Horizontal distance from the camera to the screen's left edge (portrait)
    pub camera_to_screen_x_mm: f64,
    /// Vertical distance from the camera to the screen's top edge (portrait)
    pub camera_to_screen_y_mm: f64,
    /// Portrait screen width
    pub screen_width_mm: f64,
    /// Portrait screen height
    pub screen_height_mm: f64,
}

impl DeviceGeometry {
    #[must_use]
    pub const fn new(dx: f64, dy: f64, width: f64, height: f64) -> Self {
        Self {
            camera_to_screen_x_mm: dx,
            camera_to_screen_y_mm: dy,
            screen_width_mm: width,
            screen_height_mm: height,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let dims = [self.camera_to_screen_x_mm, self.camera_to_screen_y_mm];
        if dims.iter().any(|v| !v.is_finite()) {
            return Err(Error::ConfigError(format!("Device '{name}' has a non-finite camera offset")));
        }
        if !(self.screen_width_mm > 0.0 && self.screen_height_mm > 0.0) {
            return Err(Error::ConfigError(format!(
                "Device '{name}' must have a positive screen size, got {} x {}",
                self.screen_width_mm, self.screen_height_mm
            )));
        }
        Ok(())
    }
}

const BUILTIN_DEVICES: [(&str, DeviceGeometry); 15] = [
    ("iPhone 6s Plus", DeviceGeometry::new(23.54, 8.66, 68.36, 121.54)),
    ("iPhone 6s", DeviceGeometry::new(18.61, 8.04, 58.49, 104.05)),
    ("iPhone 6 Plus", DeviceGeometry::new(23.54, 8.65, 68.36, 121.54)),
    ("iPhone 6", DeviceGeometry::new(18.61, 8.03, 58.5, 104.05)),
    ("iPhone 5s", DeviceGeometry::new(25.85, 10.65, 51.7, 90.39)),
    ("iPhone 5c", DeviceGeometry::new(25.85, 10.64, 51.7, 90.39)),
    ("iPhone 5", DeviceGeometry::new(25.85, 10.65, 51.7, 90.39)),
    ("iPhone 4s", DeviceGeometry::new(14.96, 9.78, 49.92, 74.88)),
    ("iPad Mini", DeviceGeometry::new(60.7, 8.7, 121.3, 161.2)),
    ("iPad Air 2", DeviceGeometry::new(76.86, 7.37, 153.71, 203.11)),
    ("iPad Air", DeviceGeometry::new(74.4, 9.9, 149.0, 198.1)),
    ("iPad 4", DeviceGeometry::new(74.5, 10.5, 149.0, 198.1)),
    ("iPad 3", DeviceGeometry::new(74.5, 10.5, 149.0, 198.1)),
    ("iPad 2", DeviceGeometry::new(74.5, 10.5, 149.0, 198.1)),
    ("iPad Pro", DeviceGeometry::new(98.31, 10.69, 196.61, 262.15)),
];

/// Device model name -> geometry, looked up by exact name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceTable {
    devices: BTreeMap<String, DeviceGeometry>,
}

impl DeviceTable {
    /// Empty table
    #[must_use]
    pub fn empty() -> Self {
        Self {
            devices: BTreeMap::new(),
        }
    }

    /// Table with the embedded device profiles
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            devices: BUILTIN_DEVICES
                .iter()
                .map(|(name, geometry)| ((*name).to_string(), *geometry))
                .collect(),
        }
    }

    /// Geometry for `name`
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDevice` when the name is not in the table
    pub fn lookup(&self, name: &str) -> Result<&DeviceGeometry> {
        self.devices
            .get(name)
            .ok_or_else(|| Error::UnknownDevice(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Device names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceGeometry)> {
        self.devices.iter().map(|(name, geometry)| (name.as_str(), geometry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Add or replace one device
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry has a non-positive screen size
    pub fn insert(&mut self, name: impl Into<String>, geometry: DeviceGeometry) -> Result<()> {
        let name = name.into();
        geometry.validate(&name)?;
        self.devices.insert(name, geometry);
        Ok(())
    }

    /// Add every entry of `other`, replacing existing names
    pub fn merge(&mut self, other: Self) {
        for (name, geometry) in other.devices {
            debug!("Device profile '{name}' loaded");
            self.devices.insert(name, geometry);
        }
    }

    /// Parse a YAML mapping of device name to geometry
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or an entry is invalid
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let table: Self = serde_yaml::from_str(yaml)?;
        for (name, geometry) in &table.devices {
            geometry.validate(name)?;
        }
        Ok(table)
    }

    /// Load a YAML device file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_yaml_str(&contents)?;
        info!("Loaded {} device profiles from {}", table.len(), path.as_ref().display());
        Ok(table)
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::builtin()
    }
}
