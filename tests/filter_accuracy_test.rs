//! Tests for eye-position filter output accuracy

use gaze_estimation::config::Config;
use gaze_estimation::filters::create_filter;
use gaze_estimation::filters::kalman::{KalmanParams, KalmanPointFilter};
use gaze_estimation::filters::PointFilter;
use gaze_estimation::geometry::Point;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn variance(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[test]
fn test_filter_output_accuracy() {
    // Exponential filter
    {
        let mut filter = create_filter("exponential:0.5").unwrap();

        let p1 = filter.process_point(Point::new(10.0, 20.0));
        assert_eq!(p1, Point::new(10.0, 20.0), "First value initializes filter");

        let p2 = filter.process_point(Point::new(20.0, 40.0));
        assert_eq!(p2, Point::new(15.0, 30.0), "0.5 * 10 + 0.5 * 20 = 15");

        let p3 = filter.process_point(Point::new(30.0, 60.0));
        assert_eq!(p3, Point::new(22.5, 45.0), "0.5 * 15 + 0.5 * 30 = 22.5");
    }

    // No filter (passthrough)
    {
        let mut filter = create_filter("none").unwrap();
        for &(x, y) in &[(1.23, 4.56), (-10.0, 20.0), (0.0, 0.0), (100.0, -100.0)] {
            assert_eq!(filter.process_point(Point::new(x, y)), Point::new(x, y));
        }
    }
}

#[test]
fn test_kalman_converges_on_stationary_eye() {
    let mut filter = KalmanPointFilter::new();
    filter.process_point(Point::new(0.0, 0.0));

    let mut last = Point::new(0.0, 0.0);
    for _ in 0..200 {
        last = filter.process_point(Point::new(100.0, 50.0));
    }
    assert!((last.x - 100.0).abs() < 0.01, "x = {}", last.x);
    assert!((last.y - 50.0).abs() < 0.01, "y = {}", last.y);
}

#[test]
fn test_kalman_reduces_jitter() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut filter = KalmanPointFilter::new();

    let mut raw = Vec::new();
    let mut smoothed = Vec::new();
    for i in 0..500 {
        let noisy = 120.0 + rng.gen_range(-4.0..4.0);
        let out = filter.process_point(Point::new(noisy, 80.0));
        // Skip warm-up
        if i >= 50 {
            raw.push(noisy);
            smoothed.push(out.x);
        }
    }

    let raw_var = variance(&raw);
    let smooth_var = variance(&smoothed);
    assert!(
        smooth_var < raw_var * 0.8,
        "filter should reduce variance: raw {raw_var:.3}, smoothed {smooth_var:.3}"
    );
}

#[test]
fn test_kalman_tracks_step_change() {
    let mut filter = KalmanPointFilter::new();
    for _ in 0..30 {
        filter.process_point(Point::new(50.0, 50.0));
    }

    // First frame after the step only moves part of the way
    let first = filter.process_point(Point::new(150.0, 50.0));
    assert!(first.x > 50.0 && first.x < 150.0);

    let mut settled = None;
    for frame in 0..60 {
        let p = filter.process_point(Point::new(150.0, 50.0));
        if (p.x - 150.0).abs() < 1.0 {
            settled = Some(frame);
            break;
        }
    }
    assert!(settled.is_some(), "filter never settled on the new position");
}

#[test]
fn test_stiffer_measurement_noise_smooths_more() {
    let loose = KalmanParams {
        measurement_noise: 1.0,
        ..KalmanParams::default()
    };
    let stiff = KalmanParams {
        measurement_noise: 100.0,
        ..KalmanParams::default()
    };
    let mut loose = KalmanPointFilter::with_params(loose).unwrap();
    let mut stiff = KalmanPointFilter::with_params(stiff).unwrap();

    for filter in [&mut loose, &mut stiff] {
        filter.process_point(Point::new(0.0, 0.0));
    }
    let a = loose.process_point(Point::new(10.0, 0.0));
    let b = stiff.process_point(Point::new(10.0, 0.0));
    assert!(b.x < a.x, "higher measurement noise should trust the jump less");
}

#[test]
fn test_config_filters_are_independent() {
    let config = Config::default();
    let mut left = config.create_filter().unwrap();
    let mut right = config.create_filter().unwrap();
    assert_eq!(left.name(), "KalmanPointFilter");

    left.process_point(Point::new(0.0, 0.0));
    left.process_point(Point::new(10.0, 10.0));

    // Right filter has seen nothing and passes its first point through
    assert_eq!(right.process_point(Point::new(300.0, 40.0)), Point::new(300.0, 40.0));
}

#[test]
fn test_reset_between_subjects() {
    for kind in ["kalman", "exponential:0.3", "none"] {
        let mut filter = create_filter(kind).unwrap();
        for i in 0..20 {
            filter.process_point(Point::new(f64::from(i), f64::from(i)));
        }
        filter.reset();
        assert_eq!(
            filter.process_point(Point::new(-7.0, 3.0)),
            Point::new(-7.0, 3.0),
            "{kind} should restart from the next observation"
        );
    }
}
