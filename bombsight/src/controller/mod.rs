//! Release controller.
//!
//! Joins the telemetry link and the solver: pull a flight state, refuse it
//! if stale, solve, and keep a bounded audit trail of what happened.
//!
//! # Freshness
//!
//! The staleness contract lives here, not in the solver. A state whose age
//! is at or past the freshness window never reaches `ReleaseSolver::solve`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use crate::geo::GeoPosition;
use crate::log::Logger;
use crate::solver::{
    AuditOutcome, AuditRecord, BombingSolution, ReleaseError, ReleaseSolver, SolutionHistory,
    DEFAULT_HISTORY_SIZE,
};
use crate::state::{FlightState, DEFAULT_FRESHNESS_WINDOW};
use crate::telemetry::{AcquisitionError, LinkStatus, TelemetryLink, DEFAULT_FLIGHT_STATE_BUDGET};
use crate::{log_info, log_warn};

/// Controller parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Audit records retained.
    pub history_size: usize,
    /// Flight states at or past this age are refused.
    pub freshness_window: Duration,
    /// Budget for each flight-state pull.
    pub flight_state_budget: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            history_size: DEFAULT_HISTORY_SIZE,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            flight_state_budget: DEFAULT_FLIGHT_STATE_BUDGET,
        }
    }
}

impl ControllerConfig {
    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn with_flight_state_budget(mut self, budget: Duration) -> Self {
        self.flight_state_budget = budget;
        self
    }
}

/// Why an engagement produced no solution.
#[derive(Debug, Error)]
pub enum EngageError {
    #[error("Telemetry acquisition failed: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Refused before solving.
    #[error("Flight state is stale ({:.1}s old)", .age.as_secs_f64())]
    Stale { age: Duration },

    #[error(transparent)]
    Release(#[from] ReleaseError),
}

/// Serializable controller snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerStatus {
    /// `None` when running without telemetry.
    pub link: Option<LinkStatus>,
    pub active_target: Option<GeoPosition>,
    pub audit_records: usize,
    pub successful_solutions: usize,
    pub last_outcome: Option<AuditOutcome>,
}

/// Drives one solve per call against live or supplied flight state.
pub struct ReleaseController {
    solver: Arc<ReleaseSolver>,
    link: Option<Arc<TelemetryLink>>,
    config: ControllerConfig,
    history: Mutex<SolutionHistory>,
    active_target: Mutex<Option<GeoPosition>>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for ReleaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseController")
            .field("solver", &self.solver)
            .field("has_link", &self.link.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl ReleaseController {
    /// Controller backed by a telemetry link.
    pub fn new(
        solver: Arc<ReleaseSolver>,
        link: Arc<TelemetryLink>,
        config: ControllerConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::build(solver, Some(link), config, logger)
    }

    /// Controller without telemetry; only `evaluate` can succeed.
    pub fn offline(
        solver: Arc<ReleaseSolver>,
        config: ControllerConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::build(solver, None, config, logger)
    }

    fn build(
        solver: Arc<ReleaseSolver>,
        link: Option<Arc<TelemetryLink>>,
        config: ControllerConfig,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let history = Mutex::new(SolutionHistory::new(config.history_size));
        Self {
            solver,
            link,
            config,
            history,
            active_target: Mutex::new(None),
            logger,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn link(&self) -> Option<&Arc<TelemetryLink>> {
        self.link.as_ref()
    }

    /// Pull a live flight state and solve against `target`.
    pub async fn engage(&self, target: &GeoPosition) -> Result<BombingSolution, EngageError> {
        *self.active_target.lock() = Some(*target);

        let link = self
            .link
            .as_ref()
            .ok_or(EngageError::Acquisition(AcquisitionError::NotConnected))?;
        let state = link.flight_state(self.config.flight_state_budget).await?;

        self.evaluate(&state, target, Instant::now())
    }

    /// Freshness check and solve for an already acquired state.
    pub fn evaluate(
        &self,
        state: &FlightState,
        target: &GeoPosition,
        now: Instant,
    ) -> Result<BombingSolution, EngageError> {
        if !state.is_fresh_at(now, self.config.freshness_window) {
            let age = state.age_at(now);
            log_warn!(
                self.logger,
                "Refusing stale flight state ({:.1}s old, window {:.1}s)",
                age.as_secs_f64(),
                self.config.freshness_window.as_secs_f64()
            );
            self.record(
                state,
                target,
                AuditOutcome::Stale {
                    age_s: age.as_secs_f64(),
                },
            );
            return Err(EngageError::Stale { age });
        }

        let result = self.solver.solve(state, target);
        self.record(state, target, AuditOutcome::from_result(&result));
        result.map_err(EngageError::Release)
    }

    fn record(&self, state: &FlightState, target: &GeoPosition, outcome: AuditOutcome) {
        self.history.lock().push(AuditRecord {
            recorded_at: Utc::now(),
            aircraft: *state.position(),
            groundspeed: state.speed().groundspeed(),
            target: *target,
            outcome,
        });
    }

    pub fn set_target(&self, target: Option<GeoPosition>) {
        if let Some(t) = &target {
            log_info!(self.logger, "Active target set to {}", t);
        }
        *self.active_target.lock() = target;
    }

    pub fn active_target(&self) -> Option<GeoPosition> {
        *self.active_target.lock()
    }

    /// Audit records, oldest first.
    pub fn history(&self) -> Vec<AuditRecord> {
        self.history.lock().snapshot()
    }

    pub async fn status(&self) -> ControllerStatus {
        let link = match &self.link {
            Some(link) => Some(link.status().await),
            None => None,
        };
        let history = self.history.lock();
        ControllerStatus {
            link,
            active_target: self.active_target(),
            audit_records: history.len(),
            successful_solutions: history.success_count(),
            last_outcome: history.latest().map(|r| r.outcome.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::NoOpLogger;
    use crate::state::SpeedSample;

    fn controller(config: ControllerConfig) -> ReleaseController {
        ReleaseController::offline(
            Arc::new(ReleaseSolver::default()),
            config,
            Arc::new(NoOpLogger),
        )
    }

    fn state_at(captured: Instant, altitude: f64) -> FlightState {
        FlightState::captured_at(
            GeoPosition::new(22.3193, 114.1694, altitude).unwrap(),
            SpeedSample::new(50.0, 45.0).unwrap(),
            captured,
        )
    }

    fn target() -> GeoPosition {
        GeoPosition::on_ground(22.3293, 114.1794).unwrap()
    }

    #[test]
    fn test_evaluate_fresh_state() {
        let ctl = controller(ControllerConfig::default());
        let now = Instant::now();
        let solution = ctl.evaluate(&state_at(now, 500.0), &target(), now).unwrap();
        assert!(solution.release_countdown_s > 0.0);

        let history = ctl.history();
        assert_eq!(history.len(), 1);
        assert!(history[0].outcome.is_success());
    }

    #[test]
    fn test_stale_state_is_refused_before_solving() {
        let ctl = controller(ControllerConfig::default());
        let captured = Instant::now();
        let now = captured + Duration::from_secs(6);

        // Below minimum altitude as well: staleness must win.
        let err = ctl
            .evaluate(&state_at(captured, 10.0), &target(), now)
            .unwrap_err();
        match err {
            EngageError::Stale { age } => assert_eq!(age, Duration::from_secs(6)),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            ctl.history()[0].outcome,
            AuditOutcome::Stale { age_s: 6.0 }
        );
    }

    #[test]
    fn test_solver_failure_is_recorded() {
        let ctl = controller(ControllerConfig::default());
        let now = Instant::now();
        let err = ctl.evaluate(&state_at(now, 10.0), &target(), now).unwrap_err();
        assert!(matches!(
            err,
            EngageError::Release(ReleaseError::BelowMinimumAltitude { .. })
        ));
        assert!(matches!(
            ctl.history()[0].outcome,
            AuditOutcome::Failed { code: 1, .. }
        ));
    }

    #[test]
    fn test_history_is_bounded() {
        let ctl = controller(ControllerConfig::default().with_history_size(3));
        let now = Instant::now();
        for _ in 0..5 {
            let _ = ctl.evaluate(&state_at(now, 500.0), &target(), now);
        }
        assert_eq!(ctl.history().len(), 3);
    }

    #[tokio::test]
    async fn test_engage_offline_is_not_connected() {
        let ctl = controller(ControllerConfig::default());
        let err = ctl.engage(&target()).await.unwrap_err();
        assert!(matches!(
            err,
            EngageError::Acquisition(AcquisitionError::NotConnected)
        ));
        assert_eq!(ctl.active_target(), Some(target()));
        assert!(ctl.history().is_empty());
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let ctl = controller(ControllerConfig::default());
        let now = Instant::now();
        let _ = ctl.evaluate(&state_at(now, 500.0), &target(), now);
        ctl.set_target(Some(target()));

        let status = ctl.status().await;
        assert!(status.link.is_none());
        assert_eq!(status.audit_records, 1);
        assert_eq!(status.successful_solutions, 1);
        assert!(status.last_outcome.unwrap().is_success());

        let json = serde_json::to_value(ctl.status().await).unwrap();
        assert_eq!(json["active_target"]["latitude"], 22.3293);
    }
}
