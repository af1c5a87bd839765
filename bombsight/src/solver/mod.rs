//! Release-point solver.
//!
//! Combines great-circle geometry, a wind estimate and a closed-form
//! ballistic time-of-flight into a release countdown, with range and
//! altitude gates applied before any ballistic work.
//!
//! # Pipeline
//!
//! ```text
//! FlightState + target
//!   1. altitude >= min release height        else BelowMinimumAltitude
//!   2. geodesy: distance <= max target range else TargetOutOfRange
//!   3. WindEstimator (never fails)
//!   4. BallisticModel time of flight         else TrajectoryUnresolvable
//!   5. standoff <= 2 x distance              else NumericallyUnstable
//!   6. countdown >= 0                        else ReleaseWindowMissed
//!   7. BombingSolution
//! ```
//!
//! The solver holds no per-call state and can be shared across tasks.

mod ballistics;
mod config;
mod history;
mod release;
mod solution;
mod wind;

pub use ballistics::{
    BallisticError, BallisticEstimate, BallisticModel, NoSolutionReason, PayloadProfile,
};
pub use config::{BallisticConfig, ReleaseConfig};
pub use history::{
    AuditOutcome, AuditRecord, SolutionHistory, DEFAULT_HISTORY_SIZE, MAX_HISTORY_SIZE,
};
pub use release::{ReleaseError, ReleaseSolver};
pub use solution::{BombingSolution, SolutionDiagnostics};
pub use wind::{HeadTailWindEstimator, WindEstimate, WindEstimator};
