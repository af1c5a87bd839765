//! Bombsight CLI - Command-line interface
//!
//! Offline release calculation, the live service loop and configuration
//! management on top of the `bombsight` library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::calc::CalcArgs;
use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "bombsight")]
#[command(version = bombsight::VERSION)]
#[command(about = "Payload release countdown from live MAVLink telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve once for a hand-entered flight state
    Calc(CalcArgs),

    /// Connect to telemetry and print a release countdown until Ctrl+C
    Run(RunArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Calc(args) => commands::calc::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
