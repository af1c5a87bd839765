//! Closed-form time-of-flight heuristic.
//!
//! ```text
//! fall   = sqrt(2h / g)
//! cruise = d / |v_eff|
//! t      = fall                        if cruise > 1.2 · fall   (degraded)
//!        = max(cruise, 0.8 · fall)     otherwise
//! t     *= 1.1                         (unmodeled drag)
//! accept t in (0, 60]
//! ```
//!
//! There is no root-finding loop. `BallisticConfig::max_iterations`,
//! `convergence_tolerance` and the `PayloadProfile` are carried for a
//! drag-integrated model and are not read here.

use std::fmt;

use thiserror::Error;

use super::config::BallisticConfig;
use crate::geo::ValidationError;

/// Why the model produced no time of flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSolutionReason {
    /// Release height above target is not positive.
    NonPositiveHeight,
    /// Horizontal distance to target is not positive.
    NonPositiveDistance,
    /// Effective horizontal velocity is (near) zero.
    ZeroVelocity,
    /// Result fell outside (0, max flight time].
    FlightTimeOutOfBounds,
}

impl fmt::Display for NoSolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoSolutionReason::NonPositiveHeight => "release height above target must be > 0",
            NoSolutionReason::NonPositiveDistance => "horizontal distance must be > 0",
            NoSolutionReason::ZeroVelocity => "effective horizontal velocity is zero",
            NoSolutionReason::FlightTimeOutOfBounds => "time of flight outside acceptable bounds",
        };
        f.write_str(text)
    }
}

/// Ballistic model failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BallisticError {
    #[error("No ballistic solution: {0}")]
    NoSolution(NoSolutionReason),
}

/// Physical description of the payload.
///
/// Validated positive but not read by the closed-form model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayloadProfile {
    /// Mass (kg).
    pub mass_kg: f64,
    /// Drag coefficient (dimensionless).
    pub drag_coefficient: f64,
    /// Cross-sectional area (m²).
    pub cross_section_m2: f64,
}

impl Default for PayloadProfile {
    /// A 350 ml water bottle.
    fn default() -> Self {
        Self {
            mass_kg: 0.35,
            drag_coefficient: 0.47,
            cross_section_m2: 0.003,
        }
    }
}

impl PayloadProfile {
    /// Create a payload profile, rejecting non-positive values.
    pub fn new(
        mass_kg: f64,
        drag_coefficient: f64,
        cross_section_m2: f64,
    ) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("mass", mass_kg),
            ("drag_coefficient", drag_coefficient),
            ("cross_section", cross_section_m2),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidPayload { field, value });
            }
        }
        Ok(Self {
            mass_kg,
            drag_coefficient,
            cross_section_m2,
        })
    }
}

/// A time of flight and whether it was clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallisticEstimate {
    /// Estimated payload time of flight (s), drag multiplier applied.
    pub time_of_flight: f64,
    /// Free-fall time from the release height (s).
    pub fall_time: f64,
    /// Time to cover the horizontal distance at the effective velocity (s).
    pub cruise_time: f64,
    /// The cruise time overran the fall window and was clamped to it.
    pub degraded: bool,
}

/// Time-of-flight estimator.
#[derive(Debug, Clone, Default)]
pub struct BallisticModel {
    config: BallisticConfig,
}

impl BallisticModel {
    pub fn new(config: BallisticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BallisticConfig {
        &self.config
    }

    /// Estimate the payload time of flight.
    ///
    /// # Arguments
    ///
    /// * `effective_velocity` - Groundspeed plus signed wind contribution (m/s)
    /// * `height` - Release height above the target (m), must be > 0
    /// * `distance` - Horizontal distance to the target (m), must be > 0
    ///
    /// # Errors
    ///
    /// `BallisticError::NoSolution` with the failing condition.
    pub fn time_of_flight(
        &self,
        effective_velocity: f64,
        height: f64,
        distance: f64,
    ) -> Result<BallisticEstimate, BallisticError> {
        let cfg = &self.config;

        if !(height > 0.0) {
            return Err(BallisticError::NoSolution(NoSolutionReason::NonPositiveHeight));
        }
        if !(distance > 0.0) {
            return Err(BallisticError::NoSolution(NoSolutionReason::NonPositiveDistance));
        }

        let fall_time = (2.0 * height / cfg.gravity).sqrt();

        let speed = effective_velocity.abs();
        if !(speed >= cfg.min_velocity) {
            return Err(BallisticError::NoSolution(NoSolutionReason::ZeroVelocity));
        }
        let cruise_time = distance / speed;

        let degraded = cruise_time > cfg.cruise_overrun_ratio * fall_time;
        let base = if degraded {
            fall_time
        } else {
            cruise_time.max(cfg.min_fall_fraction * fall_time)
        };

        let time_of_flight = base * cfg.drag_multiplier;

        if !(time_of_flight > 0.0 && time_of_flight <= cfg.max_flight_time_s) {
            return Err(BallisticError::NoSolution(
                NoSolutionReason::FlightTimeOutOfBounds,
            ));
        }

        Ok(BallisticEstimate {
            time_of_flight,
            fall_time,
            cruise_time,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> BallisticModel {
        BallisticModel::default()
    }

    fn no_solution(reason: NoSolutionReason) -> Result<BallisticEstimate, BallisticError> {
        Err(BallisticError::NoSolution(reason))
    }

    #[test]
    fn test_degraded_clamps_to_fall_time() {
        // fall = sqrt(1000 / 9.81) ≈ 10.096 s; cruise = 1500 / 40 = 37.5 s
        let est = model().time_of_flight(40.0, 500.0, 1500.0).unwrap();
        let fall = (1000.0_f64 / 9.81).sqrt();
        assert!(est.degraded);
        assert!((est.fall_time - fall).abs() < 1e-12);
        assert!((est.time_of_flight - fall * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_cruise_time_wins_inside_window() {
        // fall ≈ 10.096 s; cruise = 450 / 45 = 10 s, within 1.2x and above 0.8x
        let est = model().time_of_flight(45.0, 500.0, 450.0).unwrap();
        assert!(!est.degraded);
        assert!((est.time_of_flight - 10.0 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_short_distance_biased_to_fall_fraction() {
        // cruise = 45 / 45 = 1 s, well below 0.8 * fall
        let est = model().time_of_flight(45.0, 500.0, 45.0).unwrap();
        let fall = (1000.0_f64 / 9.81).sqrt();
        assert!(!est.degraded);
        assert!((est.time_of_flight - 0.8 * fall * 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_zero_distance_rejected() {
        assert_eq!(
            model().time_of_flight(45.0, 500.0, 0.0),
            no_solution(NoSolutionReason::NonPositiveDistance)
        );
    }

    #[test]
    fn test_non_positive_height_rejected() {
        assert_eq!(
            model().time_of_flight(45.0, 0.0, 100.0),
            no_solution(NoSolutionReason::NonPositiveHeight)
        );
        assert_eq!(
            model().time_of_flight(45.0, -10.0, 100.0),
            no_solution(NoSolutionReason::NonPositiveHeight)
        );
    }

    #[test]
    fn test_near_zero_velocity_rejected() {
        assert_eq!(
            model().time_of_flight(1e-12, 500.0, 100.0),
            no_solution(NoSolutionReason::ZeroVelocity)
        );
    }

    #[test]
    fn test_negative_velocity_uses_magnitude() {
        let forward = model().time_of_flight(45.0, 500.0, 450.0).unwrap();
        let backward = model().time_of_flight(-45.0, 500.0, 450.0).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_flight_time_ceiling() {
        // fall = sqrt(2 * 15000 / 9.81) ≈ 55.3 s, * 1.1 ≈ 60.8 s > 60 s
        assert_eq!(
            model().time_of_flight(45.0, 15_000.0, 100.0),
            no_solution(NoSolutionReason::FlightTimeOutOfBounds)
        );
    }

    #[test]
    fn test_payload_profile_validation() {
        assert!(PayloadProfile::new(0.35, 0.47, 0.003).is_ok());
        assert_eq!(
            PayloadProfile::new(0.0, 0.47, 0.003),
            Err(ValidationError::InvalidPayload {
                field: "mass",
                value: 0.0
            })
        );
        assert!(matches!(
            PayloadProfile::new(0.35, -1.0, 0.003),
            Err(ValidationError::InvalidPayload {
                field: "drag_coefficient",
                ..
            })
        ));
        assert!(matches!(
            PayloadProfile::new(0.35, 0.47, f64::NAN),
            Err(ValidationError::InvalidPayload {
                field: "cross_section",
                ..
            })
        ));
    }
}
