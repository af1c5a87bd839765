//! Property tests for great-circle geometry and the ballistic bound.

use bombsight::geo::{distance_and_bearing, GeoPosition};
use bombsight::solver::{BallisticConfig, BallisticModel};
use proptest::prelude::*;

fn position() -> impl Strategy<Value = GeoPosition> {
    (-89.0f64..89.0, -179.0f64..179.0)
        .prop_map(|(lat, lon)| GeoPosition::on_ground(lat, lon).unwrap())
}

fn angle_diff_deg(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

proptest! {
    #[test]
    fn distance_is_symmetric(a in position(), b in position()) {
        let ab = distance_and_bearing(&a, &b).unwrap();
        let ba = distance_and_bearing(&b, &a).unwrap();
        prop_assert!((ab.distance_m - ba.distance_m).abs() < 1e-6 * ab.distance_m.max(1.0));
    }

    #[test]
    fn distance_to_self_is_zero(a in position()) {
        let v = distance_and_bearing(&a, &a).unwrap();
        prop_assert!(v.distance_m.abs() < 1e-6);
    }

    #[test]
    fn distance_is_bounded_by_half_circumference(a in position(), b in position()) {
        let v = distance_and_bearing(&a, &b).unwrap();
        prop_assert!(v.distance_m >= 0.0);
        prop_assert!(v.distance_m <= std::f64::consts::PI * 6_371_000.0 + 1.0);
        prop_assert!(v.bearing_rad.abs() <= std::f64::consts::PI + 1e-12);
    }

    /// Over short hops away from the poles the reverse bearing is the
    /// forward bearing turned around.
    #[test]
    fn nearby_bearings_are_reciprocal(
        lat in -60.0f64..60.0,
        lon in -170.0f64..170.0,
        dlat in -0.05f64..0.05,
        dlon in -0.05f64..0.05,
    ) {
        prop_assume!(dlat.abs() > 1e-3 || dlon.abs() > 1e-3);
        let a = GeoPosition::on_ground(lat, lon).unwrap();
        let b = GeoPosition::on_ground(lat + dlat, lon + dlon).unwrap();

        let forward = distance_and_bearing(&a, &b).unwrap().bearing_deg();
        let reverse = distance_and_bearing(&b, &a).unwrap().bearing_deg();
        prop_assert!(angle_diff_deg(forward + 180.0, reverse) < 0.1);
    }

    #[test]
    fn ballistic_time_is_bounded(
        velocity in 0.1f64..200.0,
        height in 0.1f64..5000.0,
        distance in 0.1f64..50_000.0,
    ) {
        let model = BallisticModel::new(BallisticConfig::default());
        if let Ok(estimate) = model.time_of_flight(velocity, height, distance) {
            prop_assert!(estimate.time_of_flight > 0.0);
            prop_assert!(estimate.time_of_flight <= 60.0);
        }
    }

    #[test]
    fn ballistic_rejects_non_positive_inputs(
        velocity in 0.1f64..200.0,
        height in -5000.0f64..=0.0,
        distance in 0.1f64..50_000.0,
    ) {
        let model = BallisticModel::new(BallisticConfig::default());
        prop_assert!(model.time_of_flight(velocity, height, distance).is_err());
        prop_assert!(model.time_of_flight(velocity, distance, -height).is_err());
    }
}
