//! Telemetry transports.
//!
//! A transport opens a `TransportHandle` on a `ConnectionTarget`; the handle
//! yields decoded messages of a requested kind under an explicit deadline.
//! Nothing here blocks past the timeout the caller passes in.
//!
//! # Implementations
//!
//! - `UdpTransport`: MAVLink over UDP datagrams
//! - `ChannelTransport`: in-memory feed for simulation and tests

mod channel;
pub mod mavlink;
mod message;
mod udp;

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use super::config::ConnectionTarget;
use super::error::TransportError;

pub use channel::{ChannelFeed, ChannelTransport};
pub use message::{
    HeartbeatReport, MessageKind, PositionReport, ReceivedMessage, SpeedReport, TelemetryMessage,
    HEADING_UNKNOWN,
};
pub use udp::UdpTransport;

/// A boxed future that is Send and has a specific lifetime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opens sessions on connection targets.
///
/// Uses boxed futures so it can be held as `Arc<dyn TelemetryTransport>`.
pub trait TelemetryTransport: Send + Sync {
    /// Transport name for logs and errors.
    fn name(&self) -> &'static str;

    /// Open a handle on `target`.
    ///
    /// Must resolve within `timeout`. Does not wait for a heartbeat; that
    /// is the supervisor's job.
    fn connect<'a>(
        &'a self,
        target: &'a ConnectionTarget,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Box<dyn TransportHandle>, TransportError>>;
}

/// One open telemetry stream.
pub trait TransportHandle: Send {
    /// Wait up to `timeout` for a message of `kind`, stamped with its
    /// arrival time.
    ///
    /// Returns the newest message of `kind` that has arrived; older ones of
    /// that kind are superseded. Messages of other kinds are held (newest
    /// of each) for later receives, and heartbeats refresh `last_heartbeat`.
    /// Returns `Ok(None)` when the deadline passes. A zero timeout only
    /// looks at what has already arrived.
    fn receive(
        &mut self,
        kind: MessageKind,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<ReceivedMessage>, TransportError>>;

    /// Whether the underlying stream is still open.
    fn is_live(&self) -> bool;

    /// Arrival time of the most recent heartbeat seen by this handle.
    fn last_heartbeat(&self) -> Option<Instant>;

    /// Release the stream. Later receives fail with `TransportError::Closed`.
    fn close(&mut self);
}
