//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and a single exit path.

use std::fmt;
use std::process;

use bombsight::config::ConfigFileError;
use bombsight::controller::EngageError;
use bombsight::geo::ValidationError;
use bombsight::targets::TargetCatalogError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file could not be read or written
    Config(ConfigFileError),
    /// Bad command-line input
    InvalidArgument(String),
    /// Coordinates or speeds failed validation
    Validation(ValidationError),
    /// Target catalog error
    Targets(TargetCatalogError),
    /// The one-shot calculation produced no solution
    Solve(EngageError),
    /// Async runtime or signal handler setup failed
    Runtime(String),
    /// Failed to serialize output
    Output(serde_json::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(ConfigFileError::InvalidValue { .. }) => {
                eprintln!();
                eprintln!("Fix the value in the config file, or regenerate defaults with:");
                eprintln!("  bombsight config init --force");
            }
            CliError::Targets(TargetCatalogError::NotFound(_)) => {
                eprintln!();
                eprintln!("Target names are matched case-insensitively against the catalog.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Validation(e) => write!(f, "Invalid input: {}", e),
            CliError::Targets(e) => write!(f, "Target catalog error: {}", e),
            CliError::Solve(e) => write!(f, "No release solution: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Output(e) => write!(f, "Failed to format output: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Validation(e) => Some(e),
            CliError::Targets(e) => Some(e),
            CliError::Solve(e) => Some(e),
            CliError::Output(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Validation(e)
    }
}

impl From<TargetCatalogError> for CliError {
    fn from(e: TargetCatalogError) -> Self {
        CliError::Targets(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}
