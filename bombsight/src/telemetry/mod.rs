//! Telemetry acquisition.
//!
//! Feeds the solver validated, timestamped flight state from a MAVLink
//! stream and manages connection loss and recovery.
//!
//! ```text
//! TelemetryTransport ──► ConnectionSupervisor ──► TelemetrySource
//!   (udp, channel)        owns ConnectionSession    borrows it per pull
//!                                  │
//!                           TelemetryLink  (one async mutex, monitor loop)
//! ```
//!
//! Every pull takes an explicit timeout and returns within it. The monitor
//! in `TelemetryLink::run_monitor` is the only reconnect initiator.

mod config;
mod error;
mod link;
mod source;
mod supervisor;
pub mod transport;

pub use config::{
    ConnectionTarget, SupervisorConfig, TargetParseError, TelemetryConfig,
    DEFAULT_ALTERNATIVE_TARGETS, DEFAULT_CONNECT_TIMEOUT, DEFAULT_FLIGHT_STATE_BUDGET,
    DEFAULT_LIVENESS_WINDOW, DEFAULT_MAX_DEGRADED_CHECKS, DEFAULT_MESSAGE_TIMEOUT,
    DEFAULT_MONITOR_INTERVAL, DEFAULT_PRIMARY_TARGET, DEFAULT_SPEED_CEILING,
};
pub use error::{AcquisitionError, ConnectError, PullStage, TransportError};
pub use link::{LinkStatus, TelemetryLink};
pub use source::TelemetrySource;
pub use supervisor::{ConnectionSession, ConnectionSupervisor, LinkState};
pub use transport::{
    ChannelFeed, ChannelTransport, MessageKind, ReceivedMessage, TelemetryMessage,
    TelemetryTransport, TransportHandle, UdpTransport,
};
