//! Run command - service mode against live telemetry.
//!
//! Connects through the configured primary and alternative targets, keeps a
//! liveness monitor running in the background and solves once per interval
//! until Ctrl+C. When no target connects the service stays up in offline
//! mode and the monitor keeps trying.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bombsight::controller::{ControllerStatus, EngageError, ReleaseController};
use bombsight::geo::GeoPosition;
use bombsight::telemetry::{AcquisitionError, ConnectionTarget, TelemetryLink};

use super::common::{countdown_line, TargetArgs};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Default seconds between solves.
pub const DEFAULT_INTERVAL_SECS: f64 = 1.0;

/// Arguments for the run command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Primary connection target, e.g. udp:0.0.0.0:14550 (overrides config)
    #[arg(long)]
    pub connection: Option<String>,

    /// Seconds between solves
    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval: f64,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Counters kept by the service loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub solved: u64,
    pub refused: u64,
    pub no_telemetry: u64,
}

impl CycleStats {
    fn record(&mut self, result: &Result<(), &EngageError>) {
        self.cycles += 1;
        match result {
            Ok(()) => self.solved += 1,
            Err(EngageError::Acquisition(_)) => self.no_telemetry += 1,
            Err(_) => self.refused += 1,
        }
    }
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let interval = parse_interval(args.interval)?;
    let primary = args
        .connection
        .as_deref()
        .map(str::parse::<ConnectionTarget>)
        .transpose()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup("run");

    let (label, target) = args.target.resolve()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Failed to start async runtime: {}", e)))?;

    // Set up signal handler for graceful shutdown
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Failed to set signal handler: {}", e)))?;

    let engine = runner.engine_config();
    let monitor_interval = engine.supervisor.monitor_interval;

    let (stats, status) = runtime.block_on(async {
        // The link and its UDP socket belong to this runtime.
        let link = runner.create_link(primary);
        let controller = ReleaseController::new(
            runner.create_solver(),
            Arc::clone(&link),
            engine.controller.clone(),
            runner.logger(),
        );
        controller.set_target(Some(target));

        println!("Bombsight v{}", bombsight::VERSION);
        println!("Target: {}", label);
        println!();

        connect(&link).await;

        let monitor = tokio::spawn(
            Arc::clone(&link).run_monitor(monitor_interval, shutdown.child_token()),
        );

        let stats = service_loop(&controller, &target, interval, &shutdown).await;

        shutdown.cancel();
        if let Err(e) = monitor.await {
            warn!(error = %e, "Telemetry monitor task failed");
        }
        link.disconnect().await;

        (stats, controller.status().await)
    });

    print_summary(&stats, &status);
    info!(
        cycles = stats.cycles,
        solved = stats.solved,
        "Bombsight service stopped"
    );
    Ok(())
}

fn parse_interval(secs: f64) -> Result<Duration, CliError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(CliError::InvalidArgument(format!(
            "--interval must be a positive number of seconds, got {}",
            secs
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

async fn connect(link: &TelemetryLink) {
    println!("Connecting to telemetry...");
    match link.connect().await {
        Ok(target) => {
            info!(target = %target, "Telemetry connected");
            println!("Connected: {}", target);
        }
        Err(e) => {
            warn!(error = %e, "Telemetry unavailable, continuing in offline mode");
            println!("Telemetry unavailable ({}); running offline, will retry", e);
        }
    }
    println!();
}

async fn service_loop(
    controller: &ReleaseController,
    target: &GeoPosition,
    interval: Duration,
    shutdown: &CancellationToken,
) -> CycleStats {
    let mut stats = CycleStats::default();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = controller.engage(target) => result,
        };

        match &result {
            Ok(solution) => println!("{}", countdown_line(solution)),
            Err(EngageError::Acquisition(AcquisitionError::NotConnected)) => {
                println!("waiting for telemetry link");
            }
            Err(e) => println!("no solution: {}", e),
        }
        stats.record(&result.as_ref().map(|_| ()));
    }

    println!();
    println!("Shutting down...");
    stats
}

fn print_summary(stats: &CycleStats, status: &ControllerStatus) {
    println!();
    println!("Session summary");
    println!("  Cycles:           {}", stats.cycles);
    println!("  Solutions:        {}", stats.solved);
    println!("  Refused:          {}", stats.refused);
    println!("  No telemetry:     {}", stats.no_telemetry);
    println!(
        "  Audit history:    {} records, {} successful",
        status.audit_records, status.successful_solutions
    );
    if let Some(outcome) = &status.last_outcome {
        match serde_json::to_string(outcome) {
            Ok(text) => println!("  Last outcome:     {}", text),
            Err(e) => warn!(error = %e, "Failed to serialize last outcome"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bombsight::solver::ReleaseError;

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval(0.5).unwrap(), Duration::from_millis(500));
        assert!(parse_interval(0.0).is_err());
        assert!(parse_interval(-1.0).is_err());
        assert!(parse_interval(f64::NAN).is_err());
    }

    #[test]
    fn test_cycle_stats() {
        let mut stats = CycleStats::default();
        stats.record(&Ok(()));
        let not_connected = EngageError::Acquisition(AcquisitionError::NotConnected);
        stats.record(&Err(&not_connected));
        let refused = EngageError::Release(ReleaseError::ReleaseWindowMissed { overshoot_s: 1.0 });
        stats.record(&Err(&refused));

        assert_eq!(
            stats,
            CycleStats {
                cycles: 3,
                solved: 1,
                refused: 1,
                no_telemetry: 1,
            }
        );
    }
}
