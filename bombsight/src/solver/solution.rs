//! Solver output.

use serde::Serialize;

/// Diagnostic figures computed on the way to a solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolutionDiagnostics {
    /// Great-circle distance from aircraft to target (m).
    pub target_distance_m: f64,
    /// Initial bearing from aircraft to target (degrees, -180..=180).
    pub bearing_deg: f64,
    /// Wind angle relative to track (degrees): 180 = headwind, 0 = tailwind.
    pub wind_angle_deg: f64,
    /// Aircraft altitude above the datum (m).
    pub aircraft_altitude_m: f64,
    /// Target altitude above the datum (m).
    pub target_altitude_m: f64,
    /// Release height above the target (m).
    pub altitude_delta_m: f64,
    /// Groundspeed plus signed wind contribution (m/s).
    pub effective_velocity: f64,
    /// Free-fall time from the release height (s).
    pub fall_time_s: f64,
    /// The ballistic model clamped an overrunning cruise time to the fall time.
    pub degraded: bool,
}

/// Result of one successful solve.
///
/// Built once per call and never mutated. A returned solution always has
/// `release_countdown_s >= 0` and `standoff_distance_m <= 2 * target distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BombingSolution {
    /// Seconds from now until the payload should be released.
    pub release_countdown_s: f64,
    /// Horizontal distance before the target at which to release (m).
    pub standoff_distance_m: f64,
    /// Estimated payload time of flight (s).
    pub flight_time_s: f64,
    /// Estimated wind speed magnitude (m/s).
    pub wind_speed: f64,
    pub diagnostics: SolutionDiagnostics,
}

impl BombingSolution {
    /// Whether the release point is within `seconds` from now.
    pub fn release_within(&self, seconds: f64) -> bool {
        self.release_countdown_s <= seconds
    }

    /// Target distance shortcut.
    pub fn target_distance_m(&self) -> f64 {
        self.diagnostics.target_distance_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(countdown: f64) -> BombingSolution {
        BombingSolution {
            release_countdown_s: countdown,
            standoff_distance_m: 500.0,
            flight_time_s: 11.0,
            wind_speed: 5.0,
            diagnostics: SolutionDiagnostics {
                target_distance_m: 1500.0,
                bearing_deg: 42.0,
                wind_angle_deg: 180.0,
                aircraft_altitude_m: 500.0,
                target_altitude_m: 0.0,
                altitude_delta_m: 500.0,
                effective_velocity: 40.0,
                fall_time_s: 10.0,
                degraded: true,
            },
        }
    }

    #[test]
    fn test_release_within() {
        assert!(solution(3.0).release_within(5.0));
        assert!(!solution(22.0).release_within(5.0));
    }

    #[test]
    fn test_serializes_with_diagnostics() {
        let json = serde_json::to_value(solution(22.5)).unwrap();
        assert_eq!(json["release_countdown_s"], 22.5);
        assert_eq!(json["diagnostics"]["target_distance_m"], 1500.0);
        assert_eq!(json["diagnostics"]["degraded"], true);
    }
}
