//! Utility functions for image handling, numeric casts and angle math.

pub mod safe_cast;
pub mod image_conversion;

use crate::constants::FULL_TURN_DEGREES;

/// Shortest distance between two angles in degrees, in `[0, 180]`
#[must_use]
pub fn circular_distance_degrees(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(FULL_TURN_DEGREES);
    diff.min(FULL_TURN_DEGREES - diff)
}
