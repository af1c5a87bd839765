//! Single-writer owner of the telemetry session.
//!
//! `TelemetryLink` puts the supervisor and the source behind one async
//! mutex. A flight-state pull and a monitor tick (liveness check plus any
//! reconnect) each hold the lock for their whole duration, so a reconnect
//! can never swap the session out from under a pull.
//!
//! The background monitor started by `run_monitor` is the only component
//! that initiates reconnection.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::ConnectionTarget;
use super::error::{AcquisitionError, ConnectError};
use super::source::TelemetrySource;
use super::supervisor::{ConnectionSupervisor, LinkState};
use crate::state::FlightState;

/// Point-in-time view of the link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStatus {
    pub state: LinkState,
    /// Active connection target, if a session exists.
    pub target: Option<String>,
    /// Seconds since the last heartbeat on the active session.
    pub since_heartbeat_s: Option<f64>,
    pub degraded_checks: u32,
}

struct LinkInner {
    supervisor: ConnectionSupervisor,
    source: TelemetrySource,
}

/// Shared handle to the session; cheap to wrap in an `Arc`.
pub struct TelemetryLink {
    inner: Mutex<LinkInner>,
}

impl std::fmt::Debug for TelemetryLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryLink").finish_non_exhaustive()
    }
}

impl TelemetryLink {
    pub fn new(supervisor: ConnectionSupervisor, source: TelemetrySource) -> Self {
        Self {
            inner: Mutex::new(LinkInner { supervisor, source }),
        }
    }

    /// Connect through the configured target list.
    pub async fn connect(&self) -> Result<ConnectionTarget, ConnectError> {
        self.inner.lock().await.supervisor.connect_configured().await
    }

    /// Connect to one specific target.
    pub async fn connect_to(
        &self,
        target: &ConnectionTarget,
        timeout: Duration,
    ) -> Result<(), ConnectError> {
        self.inner
            .lock()
            .await
            .supervisor
            .connect(target, timeout)
            .await
    }

    pub async fn disconnect(&self) {
        self.inner.lock().await.supervisor.disconnect();
    }

    pub async fn state(&self) -> LinkState {
        self.inner.lock().await.supervisor.state()
    }

    pub async fn status(&self) -> LinkStatus {
        let inner = self.inner.lock().await;
        let sup = &inner.supervisor;
        LinkStatus {
            state: sup.state(),
            target: sup.active_target().map(|t| t.to_string()),
            since_heartbeat_s: sup.since_heartbeat().map(|d| d.as_secs_f64()),
            degraded_checks: sup.degraded_checks(),
        }
    }

    /// Pull one flight state within `timeout`.
    ///
    /// Fails with `NotConnected` unless the link is `Live` or `Degraded`.
    /// A stream that closes mid-pull drops the session.
    pub async fn flight_state(&self, timeout: Duration) -> Result<FlightState, AcquisitionError> {
        let mut guard = self.inner.lock().await;
        let LinkInner { supervisor, source } = &mut *guard;

        if !supervisor.state().has_session() {
            return Err(AcquisitionError::NotConnected);
        }
        let session = supervisor
            .session_mut()
            .ok_or(AcquisitionError::NotConnected)?;

        let result = source.pull_flight_state(session, timeout).await;
        if let Err(e) = &result {
            if e.is_session_lost() {
                supervisor.mark_lost();
            }
        }
        result
    }

    /// One monitor tick: check liveness, reconnect when policy says so.
    ///
    /// Reconnects when the link is `Disconnected`, or when it has been
    /// `Degraded` for `max_degraded_checks` checks in a row. Does nothing
    /// beyond the check if auto-reconnect is off.
    pub async fn monitor_tick(&self) -> LinkState {
        let mut inner = self.inner.lock().await;
        let sup = &mut inner.supervisor;

        let state = sup.check_liveness().await;
        let config = sup.config();
        let needs_reconnect = match state {
            LinkState::Disconnected => true,
            LinkState::Degraded => sup.degraded_checks() >= config.max_degraded_checks,
            _ => false,
        };

        if !needs_reconnect || !config.auto_reconnect {
            return state;
        }

        match sup.reconnect().await {
            Ok(target) => info!(target = %target, "Telemetry reconnected"),
            Err(e) => warn!(error = %e, "Telemetry reconnect failed"),
        }
        sup.state()
    }

    /// Run the liveness monitor until `cancel` fires.
    pub async fn run_monitor(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_secs = interval.as_secs_f64(), "Telemetry monitor started");
        let mut last_state = self.state().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let state = self.monitor_tick().await;
                    if state != last_state {
                        info!(from = %last_state, to = %state, "Telemetry link state changed");
                        last_state = state;
                    } else {
                        debug!(state = %state, "Telemetry monitor tick");
                    }
                }
            }
        }

        info!("Telemetry monitor stopped");
    }
}
