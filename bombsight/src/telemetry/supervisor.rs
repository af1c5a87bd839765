//! Connection lifecycle and liveness tracking.
//!
//! # State Machine
//!
//! ```text
//! Disconnected --connect--> Connecting
//! Connecting --[heartbeat within timeout]--> Live
//! Connecting --[timeout | transport error]--> Disconnected
//! Live --[heartbeat within liveness window]--> Live
//! Live --[liveness window exceeded]--> Degraded
//! Degraded --[heartbeat]--> Live
//! Live | Degraded --[disconnect | reconnect | stream closed]--> Disconnected
//! ```
//!
//! The supervisor never retries on its own. `reconnect` walks the primary
//! target and then each alternative once, in order, and reports the result.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::config::{ConnectionTarget, SupervisorConfig};
use super::error::{ConnectError, TransportError};
use super::transport::{MessageKind, TelemetryTransport, TransportHandle};
use crate::log::Logger;
use crate::{log_debug, log_info, log_warn};

/// Link state as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Disconnected,
    Connecting,
    Live,
    Degraded,
}

impl LinkState {
    /// Whether a session exists that pulls can run against.
    pub fn has_session(&self) -> bool {
        matches!(self, LinkState::Live | LinkState::Degraded)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Live => "live",
            LinkState::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// One open transport handle plus its liveness bookkeeping.
///
/// Owned by the supervisor; `TelemetrySource` borrows it for one pull.
pub struct ConnectionSession {
    handle: Box<dyn TransportHandle>,
    target: ConnectionTarget,
    is_live: bool,
    last_heartbeat: Instant,
    connected_at: Instant,
}

impl ConnectionSession {
    fn new(handle: Box<dyn TransportHandle>, target: ConnectionTarget) -> Self {
        let now = Instant::now();
        let last_heartbeat = handle.last_heartbeat().unwrap_or(now);
        Self {
            handle,
            target,
            is_live: true,
            last_heartbeat,
            connected_at: now,
        }
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    pub fn last_heartbeat(&self) -> Instant {
        self.last_heartbeat
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub(crate) fn handle_mut(&mut self) -> &mut dyn TransportHandle {
        self.handle.as_mut()
    }

    /// Fold in heartbeats the handle saw while serving other receives.
    pub(crate) fn sync_heartbeat(&mut self) {
        if let Some(seen) = self.handle.last_heartbeat() {
            if seen > self.last_heartbeat {
                self.last_heartbeat = seen;
            }
        }
        if !self.handle.is_live() {
            self.is_live = false;
        }
    }

    fn close(&mut self) {
        self.handle.close();
        self.is_live = false;
    }
}

impl fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("target", &self.target)
            .field("is_live", &self.is_live)
            .field("last_heartbeat", &self.last_heartbeat)
            .finish()
    }
}

/// Owns the telemetry session and its state machine.
pub struct ConnectionSupervisor {
    transport: Arc<dyn TelemetryTransport>,
    config: SupervisorConfig,
    state: LinkState,
    session: Option<ConnectionSession>,
    degraded_checks: u32,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for ConnectionSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSupervisor")
            .field("transport", &self.transport.name())
            .field("state", &self.state)
            .field("session", &self.session)
            .field("degraded_checks", &self.degraded_checks)
            .finish()
    }
}

impl ConnectionSupervisor {
    pub fn new(
        transport: Arc<dyn TelemetryTransport>,
        config: SupervisorConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            transport,
            config,
            state: LinkState::Disconnected,
            session: None,
            degraded_checks: 0,
            logger,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Consecutive liveness checks that found the link degraded.
    pub fn degraded_checks(&self) -> u32 {
        self.degraded_checks
    }

    pub fn active_target(&self) -> Option<&ConnectionTarget> {
        self.session.as_ref().map(|s| s.target())
    }

    /// Time since the last heartbeat on the current session.
    pub fn since_heartbeat(&self) -> Option<Duration> {
        self.session.as_ref().map(|s| s.last_heartbeat.elapsed())
    }

    pub fn session(&self) -> Option<&ConnectionSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ConnectionSession> {
        self.session.as_mut()
    }

    /// Open a session on `target` and wait for the first heartbeat.
    ///
    /// Any existing session is closed first. The whole attempt, transport
    /// open included, is bounded by `timeout`.
    pub async fn connect(
        &mut self,
        target: &ConnectionTarget,
        timeout: Duration,
    ) -> Result<(), ConnectError> {
        self.close_session();
        self.state = LinkState::Connecting;
        self.degraded_checks = 0;
        log_info!(self.logger, "Connecting to telemetry at {}", target);

        let started = Instant::now();
        let mut handle = match tokio::time::timeout(timeout, self.transport.connect(target, timeout))
            .await
        {
            Ok(Ok(handle)) => handle,
            Ok(Err(source)) => {
                self.state = LinkState::Disconnected;
                return Err(ConnectError::Transport {
                    target: target.clone(),
                    source,
                });
            }
            Err(_) => {
                self.state = LinkState::Disconnected;
                return Err(ConnectError::NoHeartbeat {
                    target: target.clone(),
                    timeout,
                });
            }
        };

        let remaining = timeout.saturating_sub(started.elapsed());
        let heartbeat =
            tokio::time::timeout(remaining, handle.receive(MessageKind::Heartbeat, remaining)).await;

        match heartbeat {
            Ok(Ok(Some(_))) => {
                self.session = Some(ConnectionSession::new(handle, target.clone()));
                self.state = LinkState::Live;
                log_info!(
                    self.logger,
                    "Telemetry live on {} after {:?}",
                    target,
                    started.elapsed()
                );
                Ok(())
            }
            Ok(Err(source)) => {
                handle.close();
                self.state = LinkState::Disconnected;
                Err(ConnectError::Transport {
                    target: target.clone(),
                    source,
                })
            }
            Ok(Ok(None)) | Err(_) => {
                handle.close();
                self.state = LinkState::Disconnected;
                Err(ConnectError::NoHeartbeat {
                    target: target.clone(),
                    timeout,
                })
            }
        }
    }

    /// Try the primary target, then each alternative, stopping at the first
    /// that comes up live.
    pub async fn connect_configured(&mut self) -> Result<ConnectionTarget, ConnectError> {
        let targets: Vec<ConnectionTarget> = self.config.targets().cloned().collect();
        let timeout = self.config.connect_timeout;
        let mut attempts = Vec::with_capacity(targets.len());

        for target in targets {
            match self.connect(&target, timeout).await {
                Ok(()) => return Ok(target),
                Err(e) => {
                    log_warn!(self.logger, "Connection attempt failed: {}", e);
                    attempts.push(format!("{}: {}", target, e));
                }
            }
        }

        Err(ConnectError::Exhausted { attempts })
    }

    /// Drop the current session and run the configured target sequence.
    pub async fn reconnect(&mut self) -> Result<ConnectionTarget, ConnectError> {
        log_info!(
            self.logger,
            "Reconnecting telemetry (state {}, {} degraded checks)",
            self.state,
            self.degraded_checks
        );
        self.disconnect();
        self.connect_configured().await
    }

    /// Non-blocking liveness check.
    ///
    /// Takes any heartbeat that has already arrived, then compares the
    /// newest heartbeat arrival against the liveness window. Queued
    /// position and speed reports stay with the handle for the next pull.
    pub async fn check_liveness(&mut self) -> LinkState {
        let window = self.config.liveness_window;
        let Some(session) = self.session.as_mut() else {
            self.state = LinkState::Disconnected;
            return self.state;
        };

        let polled = session
            .handle
            .receive(MessageKind::Heartbeat, Duration::ZERO)
            .await;
        session.sync_heartbeat();

        if matches!(polled, Err(TransportError::Closed)) || !session.is_live() {
            log_warn!(self.logger, "Telemetry stream on {} closed", session.target);
            self.mark_lost();
            return self.state;
        }

        let silence = session.last_heartbeat.elapsed();
        if silence < window {
            if self.state == LinkState::Degraded {
                log_info!(self.logger, "Telemetry heartbeat recovered on {}", session.target);
            }
            self.state = LinkState::Live;
            self.degraded_checks = 0;
        } else {
            self.degraded_checks += 1;
            if self.state != LinkState::Degraded {
                log_warn!(
                    self.logger,
                    "No heartbeat for {:.1}s on {}, link degraded",
                    silence.as_secs_f64(),
                    session.target
                );
            }
            self.state = LinkState::Degraded;
        }
        log_debug!(
            self.logger,
            "Liveness check: {} ({:.1}s since heartbeat)",
            self.state,
            silence.as_secs_f64()
        );

        self.state
    }

    /// Forget a session whose stream has gone away.
    pub fn mark_lost(&mut self) {
        self.close_session();
        self.state = LinkState::Disconnected;
    }

    /// Close the session, if any.
    pub fn disconnect(&mut self) {
        if self.session.is_some() {
            log_info!(self.logger, "Disconnecting telemetry");
        }
        self.close_session();
        self.state = LinkState::Disconnected;
        self.degraded_checks = 0;
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }
}
