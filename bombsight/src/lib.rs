//! Bombsight - payload release-point solver for airborne platforms
//!
//! This library computes, on every control cycle, when a payload must be
//! released so that it lands on a ground target, and keeps a live,
//! freshness-bounded flight state flowing in from a MAVLink telemetry stream.
//!
//! # Architecture
//!
//! ```text
//! UdpTransport ──► ConnectionSupervisor ──► TelemetrySource ──► FlightState
//!                  (session lifecycle)      (validated pulls)        │
//!                                                                    ▼
//!                          GeoPosition (target) ──────────────► ReleaseSolver
//!                                                                    │
//!                                               Geodesy · WindEstimator · BallisticModel
//!                                                                    ▼
//!                                                     BombingSolution | ReleaseError
//! ```
//!
//! The engine (`geo`, `solver`) is pure and reentrant. The telemetry layer
//! (`telemetry`) performs deadline-bounded async I/O and is owned by a
//! single-writer `TelemetryLink`. `controller::ReleaseController` joins the
//! two and keeps a bounded audit history.

pub mod config;
pub mod controller;
pub mod geo;
pub mod log;
pub mod logging;
pub mod solver;
pub mod state;
pub mod targets;
pub mod telemetry;

/// Library version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
