//! Great-circle distance and initial bearing (haversine).

use thiserror::Error;

use super::GeoPosition;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geometry failure. Unreachable for validated `GeoPosition`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("Non-finite value in geodesic computation")]
    NonFinite,
}

/// Distance and initial bearing from one point to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicVector {
    /// Great-circle distance in meters.
    pub distance_m: f64,
    /// Initial bearing in radians, in [-π, π], 0 = north, π/2 = east.
    pub bearing_rad: f64,
}

impl GeodesicVector {
    /// Initial bearing in degrees, in [-180, 180].
    pub fn bearing_deg(&self) -> f64 {
        self.bearing_rad.to_degrees()
    }
}

/// Compute the great-circle distance and initial bearing from `from` to `to`.
///
/// The haversine term is clamped to [0, 1] before the square root so that
/// rounding near identical or antipodal points cannot produce NaN.
///
/// # Errors
///
/// `GeometryError::NonFinite` if any intermediate is not finite.
pub fn distance_and_bearing(
    from: &GeoPosition,
    to: &GeoPosition,
) -> Result<GeodesicVector, GeometryError> {
    let lat1 = from.latitude().to_radians();
    let lon1 = from.longitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let lon2 = to.longitude().to_radians();

    if ![lat1, lon1, lat2, lon2].iter().all(|v| v.is_finite()) {
        return Err(GeometryError::NonFinite);
    }

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let half_dlat = (dlat / 2.0).sin();
    let half_dlon = (dlon / 2.0).sin();
    let a = half_dlat * half_dlat + lat1.cos() * lat2.cos() * half_dlon * half_dlon;
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().asin();
    let distance_m = EARTH_RADIUS_M * c;

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let bearing_rad = y.atan2(x);

    if !distance_m.is_finite() || !bearing_rad.is_finite() {
        return Err(GeometryError::NonFinite);
    }

    Ok(GeodesicVector {
        distance_m,
        bearing_rad,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn pos(lat: f64, lon: f64) -> GeoPosition {
        GeoPosition::on_ground(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points() {
        let a = pos(22.3193, 114.1694);
        let v = distance_and_bearing(&a, &a).unwrap();
        assert_eq!(v.distance_m, 0.0);
        assert_eq!(v.bearing_rad, 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of arc on a 6371 km sphere is ~111.195 km
        let v = distance_and_bearing(&pos(0.0, 0.0), &pos(1.0, 0.0)).unwrap();
        assert!((v.distance_m - 111_195.0).abs() < 1.0, "got {}", v.distance_m);
        assert!(v.bearing_rad.abs() < 1e-12);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = pos(0.0, 0.0);
        let east = distance_and_bearing(&origin, &pos(0.0, 1.0)).unwrap();
        let south = distance_and_bearing(&origin, &pos(-1.0, 0.0)).unwrap();
        let west = distance_and_bearing(&origin, &pos(0.0, -1.0)).unwrap();

        assert!((east.bearing_rad - FRAC_PI_2).abs() < 1e-9);
        assert!((south.bearing_rad.abs() - PI).abs() < 1e-9);
        assert!((west.bearing_rad + FRAC_PI_2).abs() < 1e-9);
        assert!((west.bearing_deg() + 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let v = distance_and_bearing(&pos(0.0, 0.0), &pos(0.0, 180.0)).unwrap();
        assert!((v.distance_m - PI * EARTH_RADIUS_M).abs() < 1.0);
        assert!(v.bearing_rad.is_finite());
    }

    #[test]
    fn test_hong_kong_pair() {
        // ~0.01° north-east of the aircraft at 22.3° N
        let v = distance_and_bearing(&pos(22.3193, 114.1694), &pos(22.3293, 114.1794)).unwrap();
        assert!(
            (1500.0..1530.0).contains(&v.distance_m),
            "got {}",
            v.distance_m
        );
        assert!((40.0..45.0).contains(&v.bearing_deg()), "got {}", v.bearing_deg());
    }
}
