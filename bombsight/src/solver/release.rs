//! Release-point solver.

use std::sync::Arc;

use thiserror::Error;

use super::ballistics::{BallisticError, BallisticModel};
use super::config::ReleaseConfig;
use super::solution::{BombingSolution, SolutionDiagnostics};
use super::wind::{HeadTailWindEstimator, WindEstimator};
use crate::geo::{distance_and_bearing, GeoPosition, GeometryError};
use crate::log::{Logger, NoOpLogger};
use crate::state::FlightState;
use crate::{log_debug, log_info, log_warn};

/// Domain-bound solver failures.
///
/// Ordinary outcomes of a solve: the caller decides whether to re-plan.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReleaseError {
    #[error("Aircraft altitude {altitude_m:.1} m is below the minimum release height {minimum_m:.1} m")]
    BelowMinimumAltitude { altitude_m: f64, minimum_m: f64 },

    #[error("Target distance {distance_m:.0} m exceeds the maximum range {maximum_m:.0} m")]
    TargetOutOfRange { distance_m: f64, maximum_m: f64 },

    #[error("Trajectory unresolvable: {0}")]
    TrajectoryUnresolvable(#[from] BallisticError),

    #[error("Numerically unstable: standoff {standoff_m:.1} m exceeds twice the target distance {distance_m:.1} m")]
    NumericallyUnstable { standoff_m: f64, distance_m: f64 },

    #[error("Release window missed by {overshoot_s:.2} s, re-plan the approach")]
    ReleaseWindowMissed { overshoot_s: f64 },

    #[error("Geometry failure: {0}")]
    Geometry(#[from] GeometryError),
}

impl ReleaseError {
    /// Stable numeric code, compatible with the legacy status table.
    ///
    /// ```text
    /// 0 success · 1 invalid coordinates · 2 invalid speed
    /// 3 target too far · 4 calculation error · 5 numerical instability
    /// ```
    pub fn code(&self) -> u8 {
        match self {
            ReleaseError::BelowMinimumAltitude { .. } => 1,
            ReleaseError::TargetOutOfRange { .. } => 3,
            ReleaseError::TrajectoryUnresolvable(_) => 4,
            ReleaseError::ReleaseWindowMissed { .. } => 4,
            ReleaseError::Geometry(_) => 4,
            ReleaseError::NumericallyUnstable { .. } => 5,
        }
    }

    /// Short machine-readable name.
    pub fn kind(&self) -> &'static str {
        match self {
            ReleaseError::BelowMinimumAltitude { .. } => "below_minimum_altitude",
            ReleaseError::TargetOutOfRange { .. } => "target_out_of_range",
            ReleaseError::TrajectoryUnresolvable(_) => "trajectory_unresolvable",
            ReleaseError::NumericallyUnstable { .. } => "numerically_unstable",
            ReleaseError::ReleaseWindowMissed { .. } => "release_window_missed",
            ReleaseError::Geometry(_) => "geometry",
        }
    }
}

/// Combines geodesy, wind estimation and the ballistic model.
///
/// Holds configuration and collaborators only; `solve` takes `&self` and
/// is safe to call concurrently.
pub struct ReleaseSolver {
    config: ReleaseConfig,
    model: BallisticModel,
    wind: Arc<dyn WindEstimator>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for ReleaseSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseSolver")
            .field("config", &self.config)
            .field("wind", &self.wind.name())
            .finish()
    }
}

impl Default for ReleaseSolver {
    fn default() -> Self {
        Self::with_config(ReleaseConfig::default())
    }
}

impl ReleaseSolver {
    /// Create a solver with explicit collaborators.
    pub fn new(
        config: ReleaseConfig,
        wind: Arc<dyn WindEstimator>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let model = BallisticModel::new(config.ballistics.clone());
        Self {
            config,
            model,
            wind,
            logger,
        }
    }

    /// Head/tail wind estimator and a silent logger.
    pub fn with_config(config: ReleaseConfig) -> Self {
        Self::new(config, Arc::new(HeadTailWindEstimator), Arc::new(NoOpLogger))
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    /// Compute a release solution for `state` against `target`.
    ///
    /// Checks run in order and the first failing one wins. Freshness of
    /// `state` is the caller's responsibility.
    pub fn solve(
        &self,
        state: &FlightState,
        target: &GeoPosition,
    ) -> Result<BombingSolution, ReleaseError> {
        let result = self.compute(state, target);
        match &result {
            Ok(solution) => log_info!(
                self.logger,
                "Release solution: countdown {:.2} s, standoff {:.1} m, distance {:.1} m",
                solution.release_countdown_s,
                solution.standoff_distance_m,
                solution.diagnostics.target_distance_m
            ),
            Err(e) => log_warn!(self.logger, "No release solution ({}): {}", e.code(), e),
        }
        result
    }

    fn compute(
        &self,
        state: &FlightState,
        target: &GeoPosition,
    ) -> Result<BombingSolution, ReleaseError> {
        let aircraft = state.position();
        let speed = state.speed();

        if aircraft.altitude() < self.config.min_release_height_m {
            return Err(ReleaseError::BelowMinimumAltitude {
                altitude_m: aircraft.altitude(),
                minimum_m: self.config.min_release_height_m,
            });
        }

        let vector = distance_and_bearing(aircraft, target)?;
        if vector.distance_m > self.config.max_target_range_m {
            return Err(ReleaseError::TargetOutOfRange {
                distance_m: vector.distance_m,
                maximum_m: self.config.max_target_range_m,
            });
        }

        let wind = self
            .wind
            .estimate(speed.airspeed(), speed.groundspeed(), vector.bearing_rad);

        let groundspeed = speed.groundspeed();
        let effective_velocity = groundspeed + wind.along_track();
        let altitude_delta = aircraft.altitude() - target.altitude();

        log_debug!(
            self.logger,
            "Solve cycle: distance {:.1} m, bearing {:.1}°, wind {:.1} m/s ({}), v_eff {:.2} m/s, height {:.1} m",
            vector.distance_m,
            vector.bearing_deg(),
            wind.speed,
            self.wind.name(),
            effective_velocity,
            altitude_delta
        );

        let estimate = self
            .model
            .time_of_flight(effective_velocity, altitude_delta, vector.distance_m)?;

        let standoff = groundspeed * estimate.time_of_flight;
        if standoff > 2.0 * vector.distance_m {
            return Err(ReleaseError::NumericallyUnstable {
                standoff_m: standoff,
                distance_m: vector.distance_m,
            });
        }

        let countdown = (vector.distance_m - standoff) / groundspeed;
        if countdown < 0.0 {
            return Err(ReleaseError::ReleaseWindowMissed {
                overshoot_s: -countdown,
            });
        }

        Ok(BombingSolution {
            release_countdown_s: countdown,
            standoff_distance_m: standoff,
            flight_time_s: estimate.time_of_flight,
            wind_speed: wind.speed,
            diagnostics: SolutionDiagnostics {
                target_distance_m: vector.distance_m,
                bearing_deg: vector.bearing_deg(),
                wind_angle_deg: wind.relative_angle.to_degrees(),
                aircraft_altitude_m: aircraft.altitude(),
                target_altitude_m: target.altitude(),
                altitude_delta_m: altitude_delta,
                effective_velocity,
                fall_time_s: estimate.fall_time,
                degraded: estimate.degraded,
            },
        })
    }
}
