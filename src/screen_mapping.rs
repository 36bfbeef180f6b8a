//! Camera-space gaze prediction to on-screen coordinates.
//!
//! Prediction space: centimetres, origin at the front camera, x to the right
//! and y up as the user holds the device. Screen space: origin at the top-left
//! corner of the screen as currently displayed, y down.

use crate::constants::MM_PER_CM;
use crate::device::{DeviceGeometry, DeviceTable};
use crate::geometry::{Point, Size};
use crate::orientation::Orientation;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unit of mapped screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenUnit {
    #[default]
    Pixels,
    Centimeters,
    Millimeters,
}

impl FromStr for ScreenUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "px" | "pixels" => Ok(Self::Pixels),
            "cm" | "centimeters" => Ok(Self::Centimeters),
            "mm" | "millimeters" => Ok(Self::Millimeters),
            _ => Err(Error::InvalidInput(format!("Unknown screen unit: {s}"))),
        }
    }
}

/// Camera-space point (cm) to screen-space millimetres for one orientation
#[must_use]
pub fn camera_to_screen_mm(camera_cm: Point, device: &DeviceGeometry, orientation: Orientation) -> Point {
    let xc = camera_cm.x * MM_PER_CM;
    let yc = camera_cm.y * MM_PER_CM;
    let dx = device.camera_to_screen_x_mm;
    let dy = device.camera_to_screen_y_mm;
    let dw = device.screen_width_mm;
    let dh = device.screen_height_mm;

    match orientation {
        Orientation::Portrait => Point::new(xc + dx, -yc - dy),
        Orientation::PortraitUpsideDown => Point::new(xc - dx + dw, -yc + dy + dh),
        // Home button on the right
        Orientation::LandscapeLeft => Point::new(xc - dy, -yc - dx + dw),
        // Home button on the left
        Orientation::LandscapeRight => Point::new(xc + dy + dh, -yc + dx),
    }
}

/// Screen millimetres to pixels for a screen of `screen` pixels as currently displayed
#[must_use]
pub fn mm_to_pixels(mm: Point, device: &DeviceGeometry, orientation: Orientation, screen: Size) -> Point {
    let (across, down) = if orientation.is_landscape() {
        (device.screen_height_mm, device.screen_width_mm)
    } else {
        (device.screen_width_mm, device.screen_height_mm)
    };
    Point::new(mm.x * screen.width / across, mm.y * screen.height / down)
}

/// Map a camera-space prediction to pixels, or to centimetres when `use_cm` is set.
///
/// # Errors
///
/// Returns `Error::UnknownDevice` when `device` is not in `table`
pub fn map_to_screen(
    table: &DeviceTable,
    camera_cm: Point,
    device: &str,
    orientation: Orientation,
    screen: Size,
    use_cm: bool,
) -> Result<Point> {
    let unit = if use_cm { ScreenUnit::Centimeters } else { ScreenUnit::Pixels };
    map_with_unit(table, camera_cm, device, orientation, screen, unit)
}

fn map_with_unit(
    table: &DeviceTable,
    camera_cm: Point,
    device: &str,
    orientation: Orientation,
    screen: Size,
    unit: ScreenUnit,
) -> Result<Point> {
    let geometry = table.lookup(device)?;
    let mm = camera_to_screen_mm(camera_cm, geometry, orientation);
    Ok(match unit {
        ScreenUnit::Millimeters => mm,
        ScreenUnit::Centimeters => Point::new(mm.x / MM_PER_CM, mm.y / MM_PER_CM),
        ScreenUnit::Pixels => mm_to_pixels(mm, geometry, orientation, screen),
    })
}

/// Device, screen and unit bound together for per-frame mapping
#[derive(Debug, Clone)]
pub struct GazeMapper {
    table: DeviceTable,
    device: String,
    screen: Size,
    unit: ScreenUnit,
}

impl GazeMapper {
    /// The device name is not checked here; unknown names fail per call
    #[must_use]
    pub fn new(table: DeviceTable, device: impl Into<String>, screen: Size, unit: ScreenUnit) -> Self {
        Self {
            table,
            device: device.into(),
            screen,
            unit,
        }
    }

    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    #[must_use]
    pub const fn unit(&self) -> ScreenUnit {
        self.unit
    }

    #[must_use]
    pub const fn table(&self) -> &DeviceTable {
        &self.table
    }

    /// Screen size in pixels as currently displayed
    pub fn set_screen(&mut self, screen: Size) {
        self.screen = screen;
    }

    pub fn set_table(&mut self, table: DeviceTable) {
        self.table = table;
    }

    /// Map one prediction for the current orientation
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownDevice` when the configured device is not in the table
    pub fn map(&self, camera_cm: Point, orientation: Orientation) -> Result<Point> {
        map_with_unit(&self.table, camera_cm, &self.device, orientation, self.screen, self.unit)
    }
}
