//! Bounded audit history of solver outcomes.
//!
//! Oldest records are evicted first once the history is full. Nothing is
//! persisted.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::release::ReleaseError;
use super::solution::BombingSolution;
use crate::geo::GeoPosition;

/// Default number of records retained.
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Largest number of records a history will retain.
pub const MAX_HISTORY_SIZE: usize = 10_000;

/// What happened on one engagement attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The solver produced a solution.
    Solved {
        release_countdown_s: f64,
        standoff_distance_m: f64,
        flight_time_s: f64,
        target_distance_m: f64,
    },
    /// The solver refused with a domain-bound failure.
    Failed { code: u8, reason: String },
    /// The flight state was stale and the solver was not called.
    Stale { age_s: f64 },
}

impl AuditOutcome {
    pub fn from_result(result: &Result<BombingSolution, ReleaseError>) -> Self {
        match result {
            Ok(solution) => AuditOutcome::Solved {
                release_countdown_s: solution.release_countdown_s,
                standoff_distance_m: solution.standoff_distance_m,
                flight_time_s: solution.flight_time_s,
                target_distance_m: solution.diagnostics.target_distance_m,
            },
            Err(e) => AuditOutcome::Failed {
                code: e.code(),
                reason: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuditOutcome::Solved { .. })
    }
}

/// One entry in the audit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// Wall-clock time the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Aircraft position used for the solve.
    pub aircraft: GeoPosition,
    /// Groundspeed at capture (m/s).
    pub groundspeed: f64,
    pub target: GeoPosition,
    pub outcome: AuditOutcome,
}

/// FIFO of the most recent audit records.
#[derive(Debug, Clone)]
pub struct SolutionHistory {
    records: VecDeque<AuditRecord>,
    capacity: usize,
}

impl Default for SolutionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl SolutionHistory {
    /// Create a history retaining at most `capacity` records, clamped to
    /// `1..=MAX_HISTORY_SIZE`. Storage grows as records arrive.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::new(),
            capacity: capacity.clamp(1, MAX_HISTORY_SIZE),
        }
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&mut self, record: AuditRecord) {
        self.records.push_back(record);
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&AuditRecord> {
        self.records.back()
    }

    /// Records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &AuditRecord> {
        self.records.iter()
    }

    /// Owned copy of the records, oldest first.
    pub fn snapshot(&self) -> Vec<AuditRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained records that hold a solution.
    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_success()).count()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
