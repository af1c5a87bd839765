//! Configuration file settings, one struct per INI section.

use std::time::Duration;

use crate::controller::ControllerConfig;
use crate::logging::{default_log_dir, default_log_file};
use crate::solver::{BallisticConfig, PayloadProfile, ReleaseConfig, DEFAULT_HISTORY_SIZE};
use crate::telemetry::{ConnectionTarget, SupervisorConfig, TelemetryConfig};

/// `[solver]`
#[derive(Debug, Clone, PartialEq)]
pub struct SolverSettings {
    pub min_release_height_m: f64,
    pub max_target_range_m: f64,
    pub history_size: usize,
}

/// `[ballistics]`
#[derive(Debug, Clone, PartialEq)]
pub struct BallisticsSettings {
    pub gravity: f64,
    pub drag_multiplier: f64,
    pub max_flight_time_s: f64,
    pub max_iterations: u32,
    pub convergence_tolerance: f64,
    pub payload: PayloadProfile,
}

/// `[telemetry]`
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySettings {
    pub speed_ceiling: f64,
    pub message_timeout: Duration,
    pub flight_state_budget: Duration,
    pub freshness_window: Duration,
}

/// `[connection]`
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub primary: ConnectionTarget,
    pub alternatives: Vec<ConnectionTarget>,
    pub liveness_window: Duration,
    pub connect_timeout: Duration,
    pub max_degraded_checks: u32,
    pub monitor_interval: Duration,
    pub auto_reconnect: bool,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: String,
    pub file: String,
    pub debug: bool,
}

/// Whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub solver: SolverSettings,
    pub ballistics: BallisticsSettings,
    pub telemetry: TelemetrySettings,
    pub connection: ConnectionSettings,
    pub logging: LoggingSettings,
}

/// Core configuration structs derived from a `ConfigFile`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub release: ReleaseConfig,
    pub telemetry: TelemetryConfig,
    pub supervisor: SupervisorConfig,
    pub controller: ControllerConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let release = ReleaseConfig::default();
        let ballistics = BallisticConfig::default();
        let telemetry = TelemetryConfig::default();
        let supervisor = SupervisorConfig::default();

        Self {
            solver: SolverSettings {
                min_release_height_m: release.min_release_height_m,
                max_target_range_m: release.max_target_range_m,
                history_size: DEFAULT_HISTORY_SIZE,
            },
            ballistics: BallisticsSettings {
                gravity: ballistics.gravity,
                drag_multiplier: ballistics.drag_multiplier,
                max_flight_time_s: ballistics.max_flight_time_s,
                max_iterations: ballistics.max_iterations,
                convergence_tolerance: ballistics.convergence_tolerance,
                payload: ballistics.payload,
            },
            telemetry: TelemetrySettings {
                speed_ceiling: telemetry.speed_ceiling,
                message_timeout: telemetry.message_timeout,
                flight_state_budget: telemetry.flight_state_budget,
                freshness_window: telemetry.freshness_window,
            },
            connection: ConnectionSettings {
                primary: supervisor.primary,
                alternatives: supervisor.alternatives,
                liveness_window: supervisor.liveness_window,
                connect_timeout: supervisor.connect_timeout,
                max_degraded_checks: supervisor.max_degraded_checks,
                monitor_interval: supervisor.monitor_interval,
                auto_reconnect: supervisor.auto_reconnect,
            },
            logging: LoggingSettings {
                directory: default_log_dir().to_string(),
                file: default_log_file().to_string(),
                debug: false,
            },
        }
    }
}

impl ConfigFile {
    /// Convert to the structs the core consumes.
    pub fn engine_config(&self) -> EngineConfig {
        let ballistics = BallisticConfig {
            gravity: self.ballistics.gravity,
            drag_multiplier: self.ballistics.drag_multiplier,
            max_flight_time_s: self.ballistics.max_flight_time_s,
            ..BallisticConfig::default()
        }
        .with_iteration_limits(
            self.ballistics.max_iterations,
            self.ballistics.convergence_tolerance,
        )
        .with_payload(self.ballistics.payload);

        let release = ReleaseConfig::default()
            .with_min_release_height(self.solver.min_release_height_m)
            .with_max_target_range(self.solver.max_target_range_m)
            .with_ballistics(ballistics);

        let telemetry = TelemetryConfig::default()
            .with_speed_ceiling(self.telemetry.speed_ceiling)
            .with_message_timeout(self.telemetry.message_timeout)
            .with_flight_state_budget(self.telemetry.flight_state_budget)
            .with_freshness_window(self.telemetry.freshness_window);

        let c = &self.connection;
        let supervisor = SupervisorConfig::default()
            .with_primary(c.primary.clone())
            .with_alternatives(c.alternatives.clone())
            .with_liveness_window(c.liveness_window)
            .with_connect_timeout(c.connect_timeout)
            .with_max_degraded_checks(c.max_degraded_checks)
            .with_monitor_interval(c.monitor_interval)
            .with_auto_reconnect(c.auto_reconnect);

        let controller = ControllerConfig::default()
            .with_history_size(self.solver.history_size)
            .with_freshness_window(self.telemetry.freshness_window)
            .with_flight_state_budget(self.telemetry.flight_state_budget);

        EngineConfig {
            release,
            telemetry,
            supervisor,
            controller,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config_matches_core_defaults() {
        let engine = ConfigFile::default().engine_config();
        assert_eq!(engine.release, ReleaseConfig::default());
        assert_eq!(engine.telemetry, TelemetryConfig::default());
        assert_eq!(engine.supervisor, SupervisorConfig::default());
        assert_eq!(engine.controller, ControllerConfig::default());
    }

    #[test]
    fn test_engine_config_carries_overrides() {
        let mut config = ConfigFile::default();
        config.solver.min_release_height_m = 80.0;
        config.telemetry.freshness_window = Duration::from_secs(3);
        config.connection.auto_reconnect = false;

        let engine = config.engine_config();
        assert_eq!(engine.release.min_release_height_m, 80.0);
        assert_eq!(engine.telemetry.freshness_window, Duration::from_secs(3));
        assert_eq!(engine.controller.freshness_window, Duration::from_secs(3));
        assert!(!engine.supervisor.auto_reconnect);
    }
}
