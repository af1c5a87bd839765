//! Telemetry and connection configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Speeds above this are treated as implausible (m/s).
pub const DEFAULT_SPEED_CEILING: f64 = 200.0;

/// Default per-message receive timeout.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default total budget for one flight-state pull.
pub const DEFAULT_FLIGHT_STATE_BUDGET: Duration = Duration::from_secs(10);

/// Default heartbeat liveness window.
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(5);

/// Default connect timeout (transport open plus first heartbeat).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default interval between monitor liveness checks.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Consecutive degraded checks before the monitor reconnects.
pub const DEFAULT_MAX_DEGRADED_CHECKS: u32 = 2;

/// Default primary connection target.
pub const DEFAULT_PRIMARY_TARGET: &str = "udp:127.0.0.1:14550";

/// Default fallback targets, tried in order after the primary.
pub const DEFAULT_ALTERNATIVE_TARGETS: [&str; 3] = ["/dev/ttyUSB0", "/dev/ttyAMA0", "/dev/ttyS0"];

/// A connection target string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid connection target '{target}': {reason}")]
pub struct TargetParseError {
    pub target: String,
    pub reason: String,
}

/// Where to find the telemetry stream.
///
/// ```text
/// udp:<host>:<port>    listen for datagrams on host:port
/// /dev/ttyUSB0[,baud]  serial device
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionTarget {
    Udp { host: String, port: u16 },
    Serial { path: String, baud: Option<u32> },
}

impl ConnectionTarget {
    pub fn udp(host: impl Into<String>, port: u16) -> Self {
        ConnectionTarget::Udp {
            host: host.into(),
            port,
        }
    }

    pub fn serial(path: impl Into<String>) -> Self {
        ConnectionTarget::Serial {
            path: path.into(),
            baud: None,
        }
    }

    /// Scheme name used in logs.
    pub fn scheme(&self) -> &'static str {
        match self {
            ConnectionTarget::Udp { .. } => "udp",
            ConnectionTarget::Serial { .. } => "serial",
        }
    }
}

impl FromStr for ConnectionTarget {
    type Err = TargetParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| TargetParseError {
            target: s.to_string(),
            reason: reason.to_string(),
        };
        let s_trim = s.trim();

        if let Some(rest) = s_trim
            .strip_prefix("udp:")
            .or_else(|| s_trim.strip_prefix("udpin:"))
        {
            let (host, port) = rest
                .rsplit_once(':')
                .ok_or_else(|| err("expected udp:<host>:<port>"))?;
            if host.is_empty() {
                return Err(err("missing host"));
            }
            let port: u16 = port.parse().map_err(|_| err("port must be 0-65535"))?;
            return Ok(ConnectionTarget::udp(host, port));
        }

        if s_trim.starts_with('/') || s_trim.to_ascii_uppercase().starts_with("COM") {
            let (path, baud) = match s_trim.split_once(',') {
                Some((path, baud)) => {
                    let baud: u32 = baud.parse().map_err(|_| err("invalid baud rate"))?;
                    (path, Some(baud))
                }
                None => (s_trim, None),
            };
            return Ok(ConnectionTarget::Serial {
                path: path.to_string(),
                baud,
            });
        }

        Err(err("expected udp:<host>:<port> or a serial device path"))
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionTarget::Udp { host, port } => write!(f, "udp:{}:{}", host, port),
            ConnectionTarget::Serial { path, baud: None } => write!(f, "{}", path),
            ConnectionTarget::Serial {
                path,
                baud: Some(baud),
            } => write!(f, "{},{}", path, baud),
        }
    }
}

/// Acquisition parameters for `TelemetrySource`.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Airspeed/groundspeed strictly above this fail the pull (m/s).
    pub speed_ceiling: f64,
    /// Timeout for a single message pull.
    pub message_timeout: Duration,
    /// Total budget for a flight-state pull.
    pub flight_state_budget: Duration,
    /// Maximum age of a flight state handed to the solver.
    pub freshness_window: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            speed_ceiling: DEFAULT_SPEED_CEILING,
            message_timeout: DEFAULT_MESSAGE_TIMEOUT,
            flight_state_budget: DEFAULT_FLIGHT_STATE_BUDGET,
            freshness_window: crate::state::DEFAULT_FRESHNESS_WINDOW,
        }
    }
}

impl TelemetryConfig {
    pub fn with_speed_ceiling(mut self, ceiling: f64) -> Self {
        self.speed_ceiling = ceiling;
        self
    }

    pub fn with_message_timeout(mut self, timeout: Duration) -> Self {
        self.message_timeout = timeout;
        self
    }

    pub fn with_flight_state_budget(mut self, budget: Duration) -> Self {
        self.flight_state_budget = budget;
        self
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }
}

/// Session lifecycle parameters for `ConnectionSupervisor`.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorConfig {
    /// Silence longer than this marks the link degraded.
    pub liveness_window: Duration,
    /// Per-target connect budget.
    pub connect_timeout: Duration,
    /// First target tried by the reconnect policy.
    pub primary: ConnectionTarget,
    /// Fallback targets, in order.
    pub alternatives: Vec<ConnectionTarget>,
    /// Degraded checks in a row before the monitor reconnects.
    pub max_degraded_checks: u32,
    /// Monitor tick interval.
    pub monitor_interval: Duration,
    /// Whether the monitor may reconnect at all.
    pub auto_reconnect: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            liveness_window: DEFAULT_LIVENESS_WINDOW,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            primary: ConnectionTarget::udp("127.0.0.1", 14550),
            alternatives: DEFAULT_ALTERNATIVE_TARGETS
                .iter()
                .map(|p| ConnectionTarget::serial(*p))
                .collect(),
            max_degraded_checks: DEFAULT_MAX_DEGRADED_CHECKS,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            auto_reconnect: true,
        }
    }
}

impl SupervisorConfig {
    pub fn with_primary(mut self, primary: ConnectionTarget) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_alternatives(mut self, alternatives: Vec<ConnectionTarget>) -> Self {
        self.alternatives = alternatives;
        self
    }

    pub fn with_liveness_window(mut self, window: Duration) -> Self {
        self.liveness_window = window;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_degraded_checks(mut self, checks: u32) -> Self {
        self.max_degraded_checks = checks;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Primary target followed by the alternatives.
    pub fn targets(&self) -> impl Iterator<Item = &ConnectionTarget> {
        std::iter::once(&self.primary).chain(self.alternatives.iter())
    }
}
