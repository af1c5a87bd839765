//! Calc command - offline one-shot release calculation.
//!
//! Solves once for a hand-entered flight state, without telemetry. Useful
//! for mission planning and for checking the solver against known cases.

use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use serde_json::json;

use bombsight::config::ConfigFile;
use bombsight::controller::ReleaseController;
use bombsight::geo::GeoPosition;
use bombsight::log::TracingLogger;
use bombsight::solver::BombingSolution;
use bombsight::state::{FlightState, SpeedSample};

use super::common::{describe_solution, failure_code, TargetArgs};
use crate::error::CliError;
use crate::runner::build_solver;

/// Arguments for the calc command.
#[derive(Debug, Clone, Args)]
pub struct CalcArgs {
    /// Aircraft latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub aircraft_lat: f64,

    /// Aircraft longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub aircraft_lon: f64,

    /// Aircraft altitude in meters
    #[arg(long, allow_hyphen_values = true)]
    pub aircraft_alt: f64,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Indicated airspeed in m/s
    #[arg(long)]
    pub airspeed: f64,

    /// Groundspeed in m/s
    #[arg(long)]
    pub groundspeed: f64,

    /// Print the solution as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the calc command.
pub fn run(args: CalcArgs) -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    let engine = config.engine_config();

    let (label, target) = args.target.resolve()?;
    let state = flight_state(&args)?;

    let solver = Arc::new(build_solver(&engine, Arc::new(TracingLogger)));
    let controller =
        ReleaseController::offline(solver, engine.controller, Arc::new(TracingLogger));

    match controller.evaluate(&state, &target, Instant::now()) {
        Ok(solution) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&solution)?);
            } else {
                print_solution(&label, &state, &solution);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                let body = json!({
                    "error": e.to_string(),
                    "code": failure_code(&e),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            Err(CliError::Solve(e))
        }
    }
}

fn flight_state(args: &CalcArgs) -> Result<FlightState, CliError> {
    let position = GeoPosition::new(args.aircraft_lat, args.aircraft_lon, args.aircraft_alt)?;
    let speed = SpeedSample::new(args.airspeed, args.groundspeed)?;
    if let Some(warning) = speed.plausibility_warning() {
        eprintln!("Warning: {}", warning);
    }
    Ok(FlightState::new(position, speed))
}

fn print_solution(label: &str, state: &FlightState, solution: &BombingSolution) {
    println!("Aircraft: {}", state.position());
    println!("Target:   {}", label);
    println!();
    println!("{}", describe_solution(solution));
}
