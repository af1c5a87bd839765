//! Configuration file support.
//!
//! The core consumes plain structs (`ReleaseConfig`, `TelemetryConfig`,
//! `SupervisorConfig`, `ControllerConfig`). This module loads them from an
//! INI file at `<config_dir>/bombsight/config.ini`:
//!
//! ```text
//! [solver]       min_release_height, max_target_range, history_size
//! [ballistics]   gravity, drag_multiplier, max_flight_time, payload ...
//! [telemetry]    speed_ceiling, message_timeout, freshness_window ...
//! [connection]   primary, alternatives, liveness_window, auto_reconnect ...
//! [logging]      directory, file, debug
//! ```
//!
//! A missing file yields defaults. A present but invalid value is an error
//! naming its section and key.

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    BallisticsSettings, ConfigFile, ConnectionSettings, EngineConfig, LoggingSettings,
    SolverSettings, TelemetrySettings,
};
