//! In-memory logger that retains what it is given.

use std::fmt::Arguments;

use parking_lot::Mutex;

use crate::log::{LogLevel, Logger};

/// A single captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

/// Logger that keeps every record in memory.
///
/// Used where the caller wants to surface warnings (for example the
/// airspeed/groundspeed plausibility warning) without a subscriber installed.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record captured so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Records at or above the given level.
    pub fn at_least(&self, level: LogLevel) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level >= level)
            .cloned()
            .collect()
    }

    /// Whether any record at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.records.lock().push(LogRecord {
            level,
            message: args.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{log_info, log_warn};

    #[test]
    fn test_memory_logger_captures_records() {
        let logger = MemoryLogger::new();
        log_info!(logger, "cycle {}", 3);
        log_warn!(logger, "speed divergence {:.0}%", 55.0);

        let records = logger.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "cycle 3");
        assert!(logger.contains(LogLevel::Warn, "divergence 55%"));
        assert_eq!(logger.at_least(LogLevel::Warn).len(), 1);
    }

    #[test]
    fn test_memory_logger_clear() {
        let logger = MemoryLogger::new();
        log_info!(logger, "one");
        logger.clear();
        assert!(logger.records().is_empty());
    }
}
