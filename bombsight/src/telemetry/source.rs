//! Validated, deadline-bounded telemetry pulls.
//!
//! Every pull wraps the transport receive in its own timeout, so a
//! transport that never answers still returns on time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::TelemetryConfig;
use super::error::{AcquisitionError, PullStage};
use super::supervisor::ConnectionSession;
use super::transport::{MessageKind, PositionReport, ReceivedMessage, SpeedReport, TelemetryMessage};
use crate::geo::GeoPosition;
use crate::log::Logger;
use crate::state::{FlightState, SpeedSample};
use crate::{log_debug, log_warn};

/// Pulls position and speed samples from a borrowed session.
pub struct TelemetrySource {
    config: TelemetryConfig,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for TelemetrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySource")
            .field("config", &self.config)
            .finish()
    }
}

impl TelemetrySource {
    pub fn new(config: TelemetryConfig, logger: Arc<dyn Logger>) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Wait up to `timeout` for a position report and validate it.
    pub async fn pull_position(
        &self,
        session: &mut ConnectionSession,
        timeout: Duration,
    ) -> Result<GeoPosition, AcquisitionError> {
        let (position, _, _) = self.pull_position_report(session, timeout).await?;
        Ok(position)
    }

    /// Wait up to `timeout` for a speed report and validate it.
    pub async fn pull_speed(
        &self,
        session: &mut ConnectionSession,
        timeout: Duration,
    ) -> Result<SpeedSample, AcquisitionError> {
        let (speed, _) = self.pull_speed_report(session, timeout).await?;
        Ok(speed)
    }

    /// Pull a position and a speed sample within `total_timeout`.
    ///
    /// Position gets up to half the budget; speed gets whatever remains,
    /// and is not waited for at all once the budget is spent. The capture
    /// time is the earlier arrival of the two reports, so the state never
    /// looks fresher than its oldest half.
    pub async fn pull_flight_state(
        &self,
        session: &mut ConnectionSession,
        total_timeout: Duration,
    ) -> Result<FlightState, AcquisitionError> {
        let started = tokio::time::Instant::now();

        let (position, heading, position_at) = self
            .pull_position_report(session, total_timeout / 2)
            .await?;

        let remaining = total_timeout.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            return Err(self.timeout(PullStage::Speed, total_timeout));
        }

        let (speed, speed_at) = self.pull_speed_report(session, remaining).await?;
        let captured_at = position_at.min(speed_at);

        log_debug!(
            self.logger,
            "Flight state {} airspeed {:.1} groundspeed {:.1} in {:?}",
            position,
            speed.airspeed(),
            speed.groundspeed(),
            started.elapsed()
        );

        Ok(FlightState::captured_at(position, speed, captured_at).with_heading(heading))
    }

    async fn pull_position_report(
        &self,
        session: &mut ConnectionSession,
        timeout: Duration,
    ) -> Result<(GeoPosition, Option<f64>, Instant), AcquisitionError> {
        let received = self
            .receive(session, MessageKind::Position, PullStage::Position, timeout)
            .await?;
        let report: PositionReport = match received.message {
            TelemetryMessage::Position(report) => report,
            _ => return Err(self.timeout(PullStage::Position, timeout)),
        };

        let position =
            GeoPosition::new(report.latitude(), report.longitude(), report.altitude_m())?;
        Ok((position, report.heading_deg(), received.received_at))
    }

    async fn pull_speed_report(
        &self,
        session: &mut ConnectionSession,
        timeout: Duration,
    ) -> Result<(SpeedSample, Instant), AcquisitionError> {
        let received = self
            .receive(session, MessageKind::Speed, PullStage::Speed, timeout)
            .await?;
        let report = match received.message {
            TelemetryMessage::Speed(report) => report,
            _ => return Err(self.timeout(PullStage::Speed, timeout)),
        };
        Ok((self.validate_speed(&report)?, received.received_at))
    }

    async fn receive(
        &self,
        session: &mut ConnectionSession,
        kind: MessageKind,
        stage: PullStage,
        timeout: Duration,
    ) -> Result<ReceivedMessage, AcquisitionError> {
        let result =
            tokio::time::timeout(timeout, session.handle_mut().receive(kind, timeout)).await;
        session.sync_heartbeat();

        match result {
            Ok(Ok(Some(received))) => Ok(received),
            Ok(Ok(None)) | Err(_) => Err(self.timeout(stage, timeout)),
            Ok(Err(e)) => Err(AcquisitionError::Transport(e)),
        }
    }

    fn validate_speed(&self, report: &SpeedReport) -> Result<SpeedSample, AcquisitionError> {
        let ceiling = self.config.speed_ceiling;
        for (field, value) in [
            ("airspeed", report.airspeed as f64),
            ("groundspeed", report.groundspeed as f64),
        ] {
            if value > ceiling {
                log_warn!(
                    self.logger,
                    "Rejecting {} {:.1} m/s above ceiling {:.1} m/s",
                    field,
                    value,
                    ceiling
                );
                return Err(AcquisitionError::ImplausibleReading {
                    field,
                    value,
                    ceiling,
                });
            }
        }

        let sample = SpeedSample::new(report.airspeed as f64, report.groundspeed as f64)?;
        if let Some(warning) = sample.plausibility_warning() {
            log_warn!(self.logger, "Speed plausibility: {}", warning);
        }
        Ok(sample)
    }

    fn timeout(&self, stage: PullStage, budget: Duration) -> AcquisitionError {
        log_debug!(self.logger, "No {} report within {:?}", stage, budget);
        AcquisitionError::Timeout { stage, budget }
    }
}
