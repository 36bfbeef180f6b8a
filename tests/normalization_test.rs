//! Orientation normalization properties across all four orientations

use gaze_estimation::geometry::{Rect, Size};
use gaze_estimation::normalizer::{correct_roll, restore_normalized_rect, DetectionNormalizer, RawFaceDetection};
use gaze_estimation::orientation::Orientation;
use gaze_estimation::utils::circular_distance_degrees;
use proptest::prelude::*;

const SENSOR: Size = Size::new(640.0, 480.0);

fn orientation_strategy() -> impl Strategy<Value = Orientation> {
    prop::sample::select(Orientation::ALL.to_vec())
}

#[test]
fn test_centred_face_in_every_orientation() {
    let normalizer = DetectionNormalizer::new(0.25).unwrap();
    let raw = RawFaceDetection::new(Rect::new(0.25, 0.25, 0.5, 0.5));

    for orientation in Orientation::ALL {
        let frame = orientation.oriented_size(SENSOR);
        let face = normalizer.normalize(&raw, orientation, frame).unwrap();
        let expected = Rect::new(frame.width / 4.0, frame.height / 4.0, frame.width / 2.0, frame.height / 2.0);
        assert_eq!(face.face_rect, expected, "{orientation}");
        assert_eq!(face.frame_size, frame);
    }
}

#[test]
fn test_corner_face_moves_with_orientation() {
    // Face near the sensor origin
    let normalizer = DetectionNormalizer::new(0.0).unwrap();
    let raw = RawFaceDetection::new(Rect::new(0.0, 0.0, 0.25, 0.25));

    let rect = |o: Orientation| normalizer.normalize(&raw, o, o.oriented_size(SENSOR)).unwrap().face_rect;

    assert_eq!(rect(Orientation::LandscapeRight), Rect::new(0.0, 0.0, 160.0, 120.0));
    assert_eq!(rect(Orientation::LandscapeLeft), Rect::new(480.0, 360.0, 160.0, 120.0));
    assert_eq!(rect(Orientation::Portrait), Rect::new(360.0, 0.0, 120.0, 160.0));
    assert_eq!(rect(Orientation::PortraitUpsideDown), Rect::new(0.0, 480.0, 120.0, 160.0));
}

#[test]
fn test_padding_grows_by_face_width() {
    let normalizer = DetectionNormalizer::new(0.25).unwrap();
    let padded = normalizer.pad(&Rect::new(100.0, 200.0, 80.0, 120.0));
    assert_eq!(padded.padding, 20.0);
    assert_eq!(padded.padded, Rect::new(80.0, 180.0, 120.0, 160.0));
    assert_eq!(padded.unpad_eye(&Rect::new(30.0, 40.0, 10.0, 10.0)), Rect::new(10.0, 20.0, 10.0, 10.0));
}

proptest! {
    #[test]
    fn prop_normalize_round_trips(
        orientation in orientation_strategy(),
        x in 0.0f64..0.5,
        y in 0.0f64..0.5,
        w in 0.01f64..0.5,
        h in 0.01f64..0.5,
    ) {
        let normalizer = DetectionNormalizer::new(0.1).unwrap();
        let bounds = Rect::new(x, y, w, h);
        let frame = orientation.oriented_size(SENSOR);
        let face = normalizer.normalize(&RawFaceDetection::new(bounds), orientation, frame).unwrap();

        prop_assert!(face.face_rect.x >= -1e-9 && face.face_rect.max_x() <= frame.width + 1e-9);
        prop_assert!(face.face_rect.y >= -1e-9 && face.face_rect.max_y() <= frame.height + 1e-9);

        let restored = restore_normalized_rect(&face.face_rect, orientation, frame);
        prop_assert!(restored.approx_eq(&bounds, 1e-9), "{:?} != {:?}", restored, bounds);
    }

    #[test]
    fn prop_roll_is_head_relative(landscape_right_roll in -720.0f64..720.0) {
        // Device turned a quarter turn per step with the head held still;
        // the sensor, fixed to the device, sees the head roll back by 90° each step.
        let turn = [
            Orientation::LandscapeRight,
            Orientation::Portrait,
            Orientation::LandscapeLeft,
            Orientation::PortraitUpsideDown,
        ];
        let reference = correct_roll(landscape_right_roll, Orientation::LandscapeRight);

        let mut sensor_roll = landscape_right_roll;
        for orientation in turn {
            let corrected = correct_roll(sensor_roll, orientation);
            prop_assert!(
                circular_distance_degrees(corrected, reference) < 1e-9,
                "{} at sensor roll {}: {} != {}", orientation, sensor_roll, corrected, reference
            );
            sensor_roll -= 90.0;
        }
    }

    #[test]
    fn prop_corrected_roll_in_range(raw in -1000.0f64..1000.0, orientation in orientation_strategy()) {
        let corrected = correct_roll(raw, orientation);
        prop_assert!((0.0..360.0).contains(&corrected), "roll {} -> {}", raw, corrected);
    }
}
