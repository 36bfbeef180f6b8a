use super::PointFilter;
use crate::constants::{
    DEFAULT_FPS, DEFAULT_KALMAN_MEASUREMENT_NOISE, DEFAULT_KALMAN_PROCESS_NOISE,
    DEFAULT_KALMAN_VELOCITY_VARIANCE,
};
use crate::geometry::Point;
use crate::{Error, Result};
use nalgebra::{Matrix2, RowVector2, Vector2};

/// Tuning for [`KalmanPointFilter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanParams {
    /// Spectral density of the white-noise acceleration driving each axis
    pub process_noise: f64,
    /// Variance of a single position observation
    pub measurement_noise: f64,
    /// Velocity variance assumed right after initialization
    pub initial_velocity_variance: f64,
    /// Time between observations in seconds
    pub dt: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            process_noise: DEFAULT_KALMAN_PROCESS_NOISE,
            measurement_noise: DEFAULT_KALMAN_MEASUREMENT_NOISE,
            initial_velocity_variance: DEFAULT_KALMAN_VELOCITY_VARIANCE,
            dt: 1.0 / DEFAULT_FPS,
        }
    }
}

impl KalmanParams {
    /// Check that every parameter is finite and positive
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("process noise", self.process_noise),
            ("measurement noise", self.measurement_noise),
            ("initial velocity variance", self.initial_velocity_variance),
            ("dt", self.dt),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::FilterError(format!("Kalman {name} must be positive, got {value}")));
            }
        }
        Ok(())
    }
}

/// Constant-velocity Kalman filter for one scalar channel
#[derive(Debug, Clone)]
struct AxisKalman {
    // State: [position, velocity]
    state: Vector2<f64>,
    // State covariance
    covariance: Matrix2<f64>,
    // Process noise
    process_noise: Matrix2<f64>,
    // State transition matrix
    transition: Matrix2<f64>,
    // Measurement matrix (position only)
    measurement: RowVector2<f64>,
    measurement_noise: f64,
    initial_velocity_variance: f64,
    initialized: bool,
}

impl AxisKalman {
    fn new(params: &KalmanParams) -> Self {
        let dt = params.dt;
        let q = params.process_noise;

        let transition = Matrix2::new(
            1.0, dt,
            0.0, 1.0,
        );

        let process_noise = Matrix2::new(
            q * dt.powi(4) / 4.0, q * dt.powi(3) / 2.0,
            q * dt.powi(3) / 2.0, q * dt.powi(2),
        );

        Self {
            state: Vector2::zeros(),
            covariance: Matrix2::identity(),
            process_noise,
            transition,
            measurement: RowVector2::new(1.0, 0.0),
            measurement_noise: params.measurement_noise,
            initial_velocity_variance: params.initial_velocity_variance,
            initialized: false,
        }
    }

    fn predict(&mut self) {
        self.state = self.transition * self.state;
        self.covariance = self.transition * self.covariance * self.transition.transpose() + self.process_noise;
    }

    fn update(&mut self, observed: f64) {
        // Innovation
        let innovation = observed - (self.measurement * self.state)[0];

        // Innovation covariance (scalar, strictly positive while measurement noise is)
        let innovation_cov = (self.measurement * self.covariance * self.measurement.transpose())[0] + self.measurement_noise;

        // Kalman gain
        let gain = self.covariance * self.measurement.transpose() / innovation_cov;

        self.state += gain * innovation;
        self.covariance = (Matrix2::identity() - gain * self.measurement) * self.covariance;
    }

    fn process(&mut self, observed: f64) -> f64 {
        if !self.initialized {
            self.state = Vector2::new(observed, 0.0);
            self.covariance = Matrix2::new(
                self.measurement_noise, 0.0,
                0.0, self.initial_velocity_variance,
            );
            self.initialized = true;
            return observed;
        }

        self.predict();
        self.update(observed);
        self.state[0]
    }

    fn reset(&mut self) {
        self.state = Vector2::zeros();
        self.covariance = Matrix2::identity();
        self.initialized = false;
    }
}

/// Kalman filter smoothing one 2D point, with x and y filtered independently
#[derive(Debug, Clone)]
pub struct KalmanPointFilter {
    x: AxisKalman,
    y: AxisKalman,
}

impl KalmanPointFilter {
    /// Filter with the default tuning
    #[must_use]
    pub fn new() -> Self {
        Self::from_params(&KalmanParams::default())
    }

    /// Filter with explicit tuning
    pub fn with_params(params: KalmanParams) -> Result<Self> {
        params.validate()?;
        Ok(Self::from_params(&params))
    }

    fn from_params(params: &KalmanParams) -> Self {
        Self {
            x: AxisKalman::new(params),
            y: AxisKalman::new(params),
        }
    }

    /// True once the first observation has been seen
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.x.initialized
    }
}

impl Default for KalmanPointFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PointFilter for KalmanPointFilter {
    fn process_point(&mut self, point: Point) -> Point {
        Point::new(self.x.process(point.x), self.y.process(point.y))
    }

    fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    fn name(&self) -> &str {
        "KalmanPointFilter"
    }
}
