//! Validated coordinate types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Construction-time validation failures.
///
/// Inputs are rejected, never clamped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A coordinate component is outside its legal range or not finite.
    #[error("Invalid coordinate: {field} = {value} ({reason})")]
    InvalidCoordinate {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A speed is non-positive or not finite.
    #[error("Invalid speed: {field} = {value} m/s (must be > 0)")]
    InvalidSpeed { field: &'static str, value: f64 },

    /// A payload property is non-positive or not finite.
    #[error("Invalid payload: {field} = {value} (must be > 0)")]
    InvalidPayload { field: &'static str, value: f64 },
}

/// A point above the reference datum.
///
/// Latitude in [-90, 90]°, longitude in [-180, 180]°, altitude ≥ 0 m.
/// Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPosition {
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl GeoPosition {
    /// Create a validated position.
    ///
    /// # Errors
    ///
    /// `ValidationError::InvalidCoordinate` when any component is out of
    /// range or not finite.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(MIN_LAT..=MAX_LAT).contains(&latitude) {
            return Err(ValidationError::InvalidCoordinate {
                field: "latitude",
                value: latitude,
                reason: "must be within -90..=90 degrees",
            });
        }
        if !longitude.is_finite() || !(MIN_LON..=MAX_LON).contains(&longitude) {
            return Err(ValidationError::InvalidCoordinate {
                field: "longitude",
                value: longitude,
                reason: "must be within -180..=180 degrees",
            });
        }
        if !altitude.is_finite() || altitude < 0.0 {
            return Err(ValidationError::InvalidCoordinate {
                field: "altitude",
                value: altitude,
                reason: "must be >= 0 m above the datum",
            });
        }
        Ok(Self {
            latitude,
            longitude,
            altitude,
        })
    }

    /// A position on the datum (altitude 0).
    pub fn on_ground(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        Self::new(latitude, longitude, 0.0)
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in meters above the datum.
    pub fn altitude(&self) -> f64 {
        self.altitude
    }
}

impl fmt::Display for GeoPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}°, {:.6}°, {:.1} m)",
            self.latitude, self.longitude, self.altitude
        )
    }
}

/// Deserialize through `new` so catalogs and configs cannot smuggle in
/// out-of-range positions.
impl<'de> Deserialize<'de> for GeoPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
            #[serde(default)]
            altitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoPosition::new(raw.latitude, raw.longitude, raw.altitude).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_position() {
        let pos = GeoPosition::new(22.3193, 114.1694, 500.0).unwrap();
        assert_eq!(pos.latitude(), 22.3193);
        assert_eq!(pos.longitude(), 114.1694);
        assert_eq!(pos.altitude(), 500.0);
    }

    #[test]
    fn test_range_boundaries_are_inclusive() {
        assert!(GeoPosition::new(90.0, 180.0, 0.0).is_ok());
        assert!(GeoPosition::new(-90.0, -180.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let err = GeoPosition::new(90.0001, 0.0, 0.0).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCoordinate {
                field: "latitude",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_longitude() {
        let err = GeoPosition::new(0.0, -180.5, 0.0).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCoordinate {
                field: "longitude",
                ..
            }
        ));
    }

    #[test]
    fn test_negative_altitude_rejected() {
        let err = GeoPosition::new(0.0, 0.0, -0.1).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCoordinate {
                field: "altitude",
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(GeoPosition::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(GeoPosition::new(0.0, f64::INFINITY, 0.0).is_err());
        assert!(GeoPosition::new(0.0, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPosition =
            serde_json::from_str(r#"{"latitude": 22.3, "longitude": 114.1}"#).unwrap();
        assert_eq!(ok.altitude(), 0.0);

        let bad = serde_json::from_str::<GeoPosition>(r#"{"latitude": 95.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_error_display() {
        let err = GeoPosition::new(100.0, 0.0, 0.0).unwrap_err();
        assert!(err.to_string().contains("latitude = 100"));
    }
}
