//! End-to-end release scenarios through the public solver and controller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bombsight::controller::{ControllerConfig, EngageError, ReleaseController};
use bombsight::geo::GeoPosition;
use bombsight::log::{LogLevel, MemoryLogger, NoOpLogger};
use bombsight::solver::{
    AuditOutcome, HeadTailWindEstimator, ReleaseConfig, ReleaseError, ReleaseSolver,
};
use bombsight::state::{FlightState, SpeedSample};

fn aircraft(altitude: f64) -> FlightState {
    FlightState::new(
        GeoPosition::new(22.3193, 114.1694, altitude).unwrap(),
        SpeedSample::new(50.0, 45.0).unwrap(),
    )
}

fn target() -> GeoPosition {
    GeoPosition::on_ground(22.3293, 114.1794).unwrap()
}

fn controller() -> ReleaseController {
    ReleaseController::offline(
        Arc::new(ReleaseSolver::default()),
        ControllerConfig::default(),
        Arc::new(NoOpLogger),
    )
}

#[test]
fn scenario_a_nominal_release() {
    let solution = ReleaseSolver::default()
        .solve(&aircraft(500.0), &target())
        .unwrap();

    let distance = solution.target_distance_m();
    assert!((1500.0..1530.0).contains(&distance), "distance {}", distance);
    assert!(solution.release_countdown_s > 0.0);
    assert!(solution.flight_time_s > 0.0 && solution.flight_time_s <= 60.0);
    assert!(solution.standoff_distance_m <= 2.0 * distance);
    // Airspeed above groundspeed reads as a 5 m/s headwind.
    assert_eq!(solution.wind_speed, 5.0);
    assert!((solution.diagnostics.bearing_deg - 42.7).abs() < 1.0);
}

#[test]
fn scenario_b_below_minimum_altitude() {
    let err = ReleaseSolver::default()
        .solve(&aircraft(10.0), &target())
        .unwrap_err();
    assert!(matches!(err, ReleaseError::BelowMinimumAltitude { .. }));
    assert_eq!(err.code(), 1);
}

#[test]
fn scenario_c_target_out_of_range() {
    let far = GeoPosition::on_ground(23.0, 115.0).unwrap();
    let err = ReleaseSolver::default()
        .solve(&aircraft(500.0), &far)
        .unwrap_err();
    assert!(matches!(err, ReleaseError::TargetOutOfRange { .. }));
    assert_eq!(err.code(), 3);
}

#[test]
fn scenario_d_stale_state_is_refused_before_solving() {
    let controller = controller();
    let captured = Instant::now();
    let state = FlightState::captured_at(
        *aircraft(500.0).position(),
        *aircraft(500.0).speed(),
        captured,
    );

    let err = controller
        .evaluate(&state, &target(), captured + Duration::from_secs(6))
        .unwrap_err();
    assert!(matches!(err, EngageError::Stale { .. }));

    let history = controller.history();
    assert_eq!(history.len(), 1);
    assert!(matches!(history[0].outcome, AuditOutcome::Stale { .. }));
}

#[test]
fn solving_twice_gives_identical_results() {
    let solver = ReleaseSolver::default();
    let state = aircraft(500.0);
    assert_eq!(
        solver.solve(&state, &target()).unwrap(),
        solver.solve(&state, &target()).unwrap()
    );
}

#[test]
fn solver_is_shareable_across_threads() {
    let solver = Arc::new(ReleaseSolver::default());
    let state = aircraft(500.0);
    let expected = solver.solve(&state, &target()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let solver = Arc::clone(&solver);
            std::thread::spawn(move || solver.solve(&state, &target()).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn stricter_altitude_floor_from_config() {
    let solver = ReleaseSolver::with_config(
        ReleaseConfig::default().with_min_release_height(600.0),
    );
    let err = solver.solve(&aircraft(500.0), &target()).unwrap_err();
    assert!(matches!(
        err,
        ReleaseError::BelowMinimumAltitude { minimum_m, .. } if minimum_m == 600.0
    ));
}

#[test]
fn outcomes_are_logged_through_injected_logger() {
    let logger = Arc::new(MemoryLogger::new());
    let solver = ReleaseSolver::new(
        ReleaseConfig::default(),
        Arc::new(HeadTailWindEstimator),
        logger.clone(),
    );

    solver.solve(&aircraft(500.0), &target()).unwrap();
    solver.solve(&aircraft(10.0), &target()).unwrap_err();

    assert!(!logger.at_least(LogLevel::Info).is_empty());
    assert!(!logger.at_least(LogLevel::Warn).is_empty());
}

#[test]
fn audit_history_keeps_the_most_recent_outcomes() {
    let controller = ReleaseController::offline(
        Arc::new(ReleaseSolver::default()),
        ControllerConfig::default().with_history_size(3),
        Arc::new(NoOpLogger),
    );

    let now = Instant::now();
    for altitude in [10.0, 500.0, 500.0, 20.0] {
        let state = FlightState::captured_at(
            *aircraft(altitude).position(),
            *aircraft(altitude).speed(),
            now,
        );
        let _ = controller.evaluate(&state, &target(), now);
    }

    let history = controller.history();
    assert_eq!(history.len(), 3);
    assert!(history[0].outcome.is_success());
    assert!(history[1].outcome.is_success());
    assert!(matches!(
        history[2].outcome,
        AuditOutcome::Failed { code: 1, .. }
    ));
}
