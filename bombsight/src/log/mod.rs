//! Logging abstraction layer.
//!
//! Components never reach for a process-wide logger. Each one that logs is
//! handed an `Arc<dyn Logger>` when it is constructed, so the solver and the
//! telemetry layer can be exercised silently in tests and routed through
//! `tracing` in the service.
//!
//! # Architecture
//!
//! - `Logger` trait: the interface components log through
//! - `TracingLogger`: production adapter that delegates to `tracing`
//! - `NoOpLogger`: discards everything
//! - `MemoryLogger`: keeps records in memory so callers can inspect them
//!
//! # Usage
//!
//! ```
//! use bombsight::log::{Logger, NoOpLogger};
//! use bombsight::{log_debug, log_info};
//! use std::sync::Arc;
//!
//! struct Component {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! impl Component {
//!     fn work(&self) {
//!         log_info!(self.logger, "starting cycle {}", 1);
//!         log_debug!(self.logger, "cycle done");
//!     }
//! }
//!
//! Component { logger: Arc::new(NoOpLogger) }.work();
//! ```

mod memory;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use memory::{LogRecord, MemoryLogger};
pub use noop::NoOpLogger;
pub use r#trait::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;
