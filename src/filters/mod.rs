//! Temporal smoothing filters for eye positions.
//!
//! Each eye owns one filter instance for the lifetime of a session. Filters
//! keep O(1) state and are only reset explicitly.

/// Kalman filter with an independent constant-velocity model per axis
pub mod kalman;

/// Exponential filter for responsive smoothing
pub mod exponential;

use crate::geometry::Point;
use crate::Result;

/// Trait for all point filters
pub trait PointFilter: Send + Sync {
    /// Feed one observation and return the smoothed point
    fn process_point(&mut self, point: Point) -> Point;

    /// Reset filter state
    fn reset(&mut self);

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
pub struct NoFilter;

impl PointFilter for NoFilter {
    fn process_point(&mut self, point: Point) -> Point {
        point
    }

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a point filter by type name.
///
/// Accepts `none`, `kalman` and `exponential`, the latter optionally with an
/// alpha suffix such as `exponential:0.3`.
pub fn create_filter(filter_type: &str) -> Result<Box<dyn PointFilter>> {
    let spec = filter_type.to_lowercase();
    let (name, param) = match spec.split_once(':') {
        Some((name, param)) => (name, Some(param)),
        None => (spec.as_str(), None),
    };

    match (name, param) {
        ("none" | "nofilter", None) => Ok(Box::new(NoFilter)),
        ("kalman", None) => Ok(Box::new(kalman::KalmanPointFilter::new())),
        ("exponential", None) => Ok(Box::new(exponential::ExponentialFilter::new(
            crate::constants::DEFAULT_EXPONENTIAL_ALPHA,
        ))),
        ("exponential", Some(alpha)) => {
            let alpha: f64 = alpha
                .parse()
                .map_err(|_| crate::Error::FilterError(format!("Invalid alpha: {alpha}")))?;
            exponential::ExponentialFilter::try_new(alpha).map(|f| Box::new(f) as Box<dyn PointFilter>)
        }
        _ => Err(crate::Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}
