//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`calc`] - Offline one-shot release calculation
//! - [`config`] - Configuration management (init, show, path)
//! - [`run`] - Service mode against live telemetry

pub mod calc;
pub mod common;
pub mod config;
pub mod run;
