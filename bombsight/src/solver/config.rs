//! Solver configuration.
//!
//! All values are consumed, not owned: the service builds these from the
//! configuration file, tests build them directly.

use super::ballistics::PayloadProfile;

/// Default minimum release height in meters.
pub const DEFAULT_MIN_RELEASE_HEIGHT_M: f64 = 50.0;

/// Default maximum target range in meters.
pub const DEFAULT_MAX_TARGET_RANGE_M: f64 = 50_000.0;

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Domain bounds applied by `ReleaseSolver`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Platform altitude below which no solution is attempted (m).
    pub min_release_height_m: f64,
    /// Targets farther than this are refused (m).
    pub max_target_range_m: f64,
    /// Time-of-flight model parameters.
    pub ballistics: BallisticConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            min_release_height_m: DEFAULT_MIN_RELEASE_HEIGHT_M,
            max_target_range_m: DEFAULT_MAX_TARGET_RANGE_M,
            ballistics: BallisticConfig::default(),
        }
    }
}

impl ReleaseConfig {
    /// Set the minimum release height.
    pub fn with_min_release_height(mut self, meters: f64) -> Self {
        self.min_release_height_m = meters;
        self
    }

    /// Set the maximum target range.
    pub fn with_max_target_range(mut self, meters: f64) -> Self {
        self.max_target_range_m = meters;
        self
    }

    /// Replace the ballistic parameters.
    pub fn with_ballistics(mut self, ballistics: BallisticConfig) -> Self {
        self.ballistics = ballistics;
        self
    }
}

/// Parameters of the closed-form time-of-flight heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct BallisticConfig {
    /// Gravitational acceleration (m/s²).
    pub gravity: f64,
    /// Multiplier applied to approximate unmodeled drag.
    pub drag_multiplier: f64,
    /// Cruise time above `fall_time * this` clamps to the fall time.
    pub cruise_overrun_ratio: f64,
    /// Lower bound of the result as a fraction of the fall time.
    pub min_fall_fraction: f64,
    /// Upper bound on an acceptable time of flight (s).
    pub max_flight_time_s: f64,
    /// Effective horizontal velocities below this are treated as zero (m/s).
    pub min_velocity: f64,

    // ==================== Reserved ====================
    /// Iteration cap for a drag-integrated solver. Not read by the model.
    pub max_iterations: u32,
    /// Convergence tolerance for a drag-integrated solver. Not read by the model.
    pub convergence_tolerance: f64,
    /// Physical payload description. Not read by the model.
    pub payload: PayloadProfile,
}

impl Default for BallisticConfig {
    fn default() -> Self {
        Self {
            gravity: STANDARD_GRAVITY,
            drag_multiplier: 1.1,
            cruise_overrun_ratio: 1.2,
            min_fall_fraction: 0.8,
            max_flight_time_s: 60.0,
            min_velocity: 1e-10,
            max_iterations: 1000,
            convergence_tolerance: 1e-6,
            payload: PayloadProfile::default(),
        }
    }
}

impl BallisticConfig {
    /// Set the reserved iteration parameters.
    pub fn with_iteration_limits(mut self, max_iterations: u32, tolerance: f64) -> Self {
        self.max_iterations = max_iterations;
        self.convergence_tolerance = tolerance;
        self
    }

    /// Set the payload description.
    pub fn with_payload(mut self, payload: PayloadProfile) -> Self {
        self.payload = payload;
        self
    }
}
