//! Telemetry error types.

use std::io;
use std::time::Duration;

use thiserror::Error;

use super::config::ConnectionTarget;
use crate::geo::ValidationError;

/// Failures raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// This transport cannot open this kind of target.
    #[error("Transport '{transport}' cannot open {target}")]
    UnsupportedTarget {
        transport: &'static str,
        target: ConnectionTarget,
    },

    /// Nothing is listening at the target.
    #[error("Target {target} is unreachable")]
    Unreachable { target: ConnectionTarget },

    #[error("I/O error on {target}: {source}")]
    Io {
        target: ConnectionTarget,
        #[source]
        source: io::Error,
    },

    /// The stream ended.
    #[error("Telemetry stream closed")]
    Closed,
}

/// Which pull ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullStage {
    Position,
    Speed,
}

impl std::fmt::Display for PullStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullStage::Position => write!(f, "position"),
            PullStage::Speed => write!(f, "speed"),
        }
    }
}

/// Failures pulling a reading from a live session.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Timed out waiting for {stage} after {budget:?}")]
    Timeout { stage: PullStage, budget: Duration },

    /// A reading above the plausibility ceiling.
    #[error("Implausible {field}: {value:.1} m/s exceeds ceiling {ceiling:.1} m/s")]
    ImplausibleReading {
        field: &'static str,
        value: f64,
        ceiling: f64,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No live telemetry session")]
    NotConnected,
}

impl AcquisitionError {
    /// Whether the session itself is gone (as opposed to one bad reading).
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            AcquisitionError::Transport(TransportError::Closed) | AcquisitionError::NotConnected
        )
    }
}

/// Failures establishing a session.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Failed to open {target}: {source}")]
    Transport {
        target: ConnectionTarget,
        #[source]
        source: TransportError,
    },

    #[error("No heartbeat from {target} within {timeout:?}")]
    NoHeartbeat {
        target: ConnectionTarget,
        timeout: Duration,
    },

    /// Every configured target failed; one entry per attempt.
    #[error("All {} connection targets failed", attempts.len())]
    Exhausted { attempts: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AcquisitionError::Timeout {
            stage: PullStage::Speed,
            budget: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Timed out waiting for speed after 250ms");

        let err = AcquisitionError::ImplausibleReading {
            field: "groundspeed",
            value: 250.0,
            ceiling: 200.0,
        };
        assert!(err.to_string().contains("250.0"));

        let err = ConnectError::Exhausted {
            attempts: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "All 2 connection targets failed");
    }

    #[test]
    fn test_session_lost_classification() {
        assert!(AcquisitionError::Transport(TransportError::Closed).is_session_lost());
        assert!(AcquisitionError::NotConnected.is_session_lost());
        assert!(!AcquisitionError::Timeout {
            stage: PullStage::Position,
            budget: Duration::ZERO
        }
        .is_session_lost());
    }
}
