//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and construction of
//! the solver and telemetry link so command handlers stay short.

use std::sync::Arc;

use tracing::info;

use bombsight::config::{ConfigFile, EngineConfig};
use bombsight::log::{Logger, TracingLogger};
use bombsight::logging::{init_logging_full, LoggingGuard};
use bombsight::solver::{HeadTailWindEstimator, ReleaseSolver};
use bombsight::telemetry::{
    ConnectionSupervisor, ConnectionTarget, TelemetryLink, TelemetrySource, UdpTransport,
};

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
    logger: Arc<dyn Logger>,
}

impl CliRunner {
    /// Load config and initialize file logging.
    ///
    /// Stdout logging stays off: the service prints its countdown there.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - Debug-level logging, regardless of RUST_LOG
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let debug = debug_mode || config.logging.debug;

        let logging_guard =
            init_logging_full(&config.logging.directory, &config.logging.file, false, debug)
                .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            logger: Arc::new(TracingLogger),
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        self.config.engine_config()
    }

    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Bombsight v{}", bombsight::VERSION);
        info!("Bombsight CLI: {} command", command);
    }

    /// Solver built from the loaded configuration.
    pub fn create_solver(&self) -> Arc<ReleaseSolver> {
        Arc::new(build_solver(&self.engine_config(), self.logger()))
    }

    /// Telemetry link over UDP, optionally overriding the primary target.
    pub fn create_link(&self, primary: Option<ConnectionTarget>) -> Arc<TelemetryLink> {
        let engine = self.engine_config();
        let mut supervisor_config = engine.supervisor;
        if let Some(target) = primary {
            supervisor_config = supervisor_config.with_primary(target);
        }

        info!(
            primary = %supervisor_config.primary,
            alternatives = supervisor_config.alternatives.len(),
            "Creating telemetry link"
        );

        let supervisor = ConnectionSupervisor::new(
            Arc::new(UdpTransport::new()),
            supervisor_config,
            self.logger(),
        );
        let source = TelemetrySource::new(engine.telemetry, self.logger());
        Arc::new(TelemetryLink::new(supervisor, source))
    }
}

/// Solver for `engine`, reporting through `logger`.
pub fn build_solver(engine: &EngineConfig, logger: Arc<dyn Logger>) -> ReleaseSolver {
    ReleaseSolver::new(
        engine.release.clone(),
        Arc::new(HeadTailWindEstimator),
        logger,
    )
}
