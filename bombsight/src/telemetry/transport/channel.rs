//! In-memory transport.
//!
//! Each registered target gets an unbounded queue. The `ChannelFeed` side
//! pushes messages stamped with their send time; handles opened on the
//! target pop them. Dropping every feed for a target closes its stream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::message::{
    LatestMessages, MessageKind, PositionReport, ReceivedMessage, SpeedReport, TelemetryMessage,
};
use super::{BoxFuture, TelemetryTransport, TransportHandle};
use crate::telemetry::config::ConnectionTarget;
use crate::telemetry::error::TransportError;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ReceivedMessage>>>;

struct Endpoint {
    rx: SharedReceiver,
    reachable: Arc<AtomicBool>,
}

/// Producer side of an in-memory endpoint.
#[derive(Debug, Clone)]
pub struct ChannelFeed {
    tx: mpsc::UnboundedSender<ReceivedMessage>,
    reachable: Arc<AtomicBool>,
}

impl ChannelFeed {
    /// Queue a message arriving now. Returns false once every handle is gone.
    pub fn send(&self, message: TelemetryMessage) -> bool {
        self.send_at(message, Instant::now())
    }

    /// Queue a message as if it had arrived at `received_at`.
    pub fn send_at(&self, message: TelemetryMessage, received_at: Instant) -> bool {
        self.tx
            .send(ReceivedMessage {
                message,
                received_at,
            })
            .is_ok()
    }

    pub fn heartbeat(&self) -> bool {
        self.send(TelemetryMessage::heartbeat())
    }

    pub fn position(&self, latitude: f64, longitude: f64, altitude_m: f64) -> bool {
        self.send(TelemetryMessage::Position(PositionReport::from_degrees(
            latitude, longitude, altitude_m,
        )))
    }

    pub fn speed(&self, airspeed: f32, groundspeed: f32) -> bool {
        self.send(TelemetryMessage::Speed(SpeedReport::new(airspeed, groundspeed)))
    }

    /// Toggle whether new connects to this endpoint succeed.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

/// Transport backed by in-process queues.
#[derive(Default)]
pub struct ChannelTransport {
    endpoints: Mutex<HashMap<ConnectionTarget, Endpoint>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target` (replacing any previous endpoint) and return its feed.
    pub fn endpoint(&self, target: &ConnectionTarget) -> ChannelFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        let reachable = Arc::new(AtomicBool::new(true));
        self.endpoints.lock().insert(
            target.clone(),
            Endpoint {
                rx: Arc::new(tokio::sync::Mutex::new(rx)),
                reachable: Arc::clone(&reachable),
            },
        );
        ChannelFeed { tx, reachable }
    }
}

impl TelemetryTransport for ChannelTransport {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn connect<'a>(
        &'a self,
        target: &'a ConnectionTarget,
        _timeout: Duration,
    ) -> BoxFuture<'a, Result<Box<dyn TransportHandle>, TransportError>> {
        Box::pin(async move {
            let endpoints = self.endpoints.lock();
            let endpoint = endpoints
                .get(target)
                .filter(|e| e.reachable.load(Ordering::SeqCst))
                .ok_or_else(|| TransportError::Unreachable {
                    target: target.clone(),
                })?;

            let handle: Box<dyn TransportHandle> = Box::new(ChannelHandle {
                rx: Arc::clone(&endpoint.rx),
                live: true,
                latest: LatestMessages::default(),
            });
            Ok(handle)
        })
    }
}

struct ChannelHandle {
    rx: SharedReceiver,
    live: bool,
    latest: LatestMessages,
}

impl TransportHandle for ChannelHandle {
    fn receive(
        &mut self,
        kind: MessageKind,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<ReceivedMessage>, TransportError>> {
        Box::pin(async move {
            if !self.live {
                return Err(TransportError::Closed);
            }

            let deadline = tokio::time::Instant::now() + timeout;
            let rx = Arc::clone(&self.rx);
            let mut rx = rx.lock().await;

            loop {
                let mut disconnected = false;
                loop {
                    match rx.try_recv() {
                        Ok(received) => self.latest.store(received),
                        Err(mpsc::error::TryRecvError::Empty) => break,
                        Err(mpsc::error::TryRecvError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }

                if let Some(received) = self.latest.take(kind) {
                    return Ok(Some(received));
                }
                if disconnected {
                    self.live = false;
                    return Err(TransportError::Closed);
                }

                match tokio::time::timeout_at(deadline, rx.recv()).await {
                    Ok(Some(received)) => self.latest.store(received),
                    Ok(None) => {
                        self.live = false;
                        return Err(TransportError::Closed);
                    }
                    Err(_) => return Ok(None),
                }
            }
        })
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn last_heartbeat(&self) -> Option<Instant> {
        self.latest.last_heartbeat()
    }

    fn close(&mut self) {
        self.live = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ConnectionTarget {
        ConnectionTarget::udp("sim", 1)
    }

    #[tokio::test]
    async fn test_unknown_target_is_unreachable() {
        let transport = ChannelTransport::new();
        let result = transport.connect(&target(), Duration::from_millis(10)).await;
        assert!(matches!(result, Err(TransportError::Unreachable { .. })));
    }

    #[tokio::test]
    async fn test_receive_filters_by_kind_and_tracks_heartbeat() {
        let transport = ChannelTransport::new();
        let feed = transport.endpoint(&target());
        let mut handle = transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .unwrap();

        feed.heartbeat();
        feed.speed(50.0, 45.0);
        let msg = handle
            .receive(MessageKind::Speed, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(msg.map(|r| r.kind()), Some(MessageKind::Speed));
        assert!(handle.last_heartbeat().is_some());
    }

    #[tokio::test]
    async fn test_receive_times_out_with_none() {
        let transport = ChannelTransport::new();
        let _feed = transport.endpoint(&target());
        let mut handle = transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .unwrap();

        let start = Instant::now();
        let msg = handle
            .receive(MessageKind::Position, Duration::from_millis(50))
            .await
            .unwrap();
        assert!(msg.is_none());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_timeout_drains_queue() {
        let transport = ChannelTransport::new();
        let feed = transport.endpoint(&target());
        let mut handle = transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .unwrap();

        feed.position(1.0, 2.0, 3.0);
        feed.heartbeat();
        let msg = handle
            .receive(MessageKind::Heartbeat, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(msg.map(|r| r.message), Some(TelemetryMessage::heartbeat()));

        let held = handle
            .receive(MessageKind::Position, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(
            held.map(|r| r.message),
            Some(TelemetryMessage::Position(PositionReport::from_degrees(
                1.0, 2.0, 3.0
            )))
        );
    }

    #[tokio::test]
    async fn test_receive_returns_newest_with_arrival_time() {
        let transport = ChannelTransport::new();
        let feed = transport.endpoint(&target());
        let mut handle = transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .unwrap();

        let old = Instant::now() - Duration::from_secs(5);
        feed.send_at(
            TelemetryMessage::Position(PositionReport::from_degrees(10.0, 0.0, 500.0)),
            old,
        );
        feed.position(20.0, 0.0, 500.0);

        let received = handle
            .receive(MessageKind::Position, Duration::from_millis(100))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            received.message,
            TelemetryMessage::Position(PositionReport::from_degrees(20.0, 0.0, 500.0))
        );
        assert!(received.received_at > old);
        assert!(handle
            .receive(MessageKind::Position, Duration::ZERO)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_dropped_feed_closes_stream() {
        let transport = ChannelTransport::new();
        let feed = transport.endpoint(&target());
        let mut handle = transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .unwrap();

        drop(feed);
        let result = handle
            .receive(MessageKind::Heartbeat, Duration::from_millis(50))
            .await;
        assert!(matches!(result, Err(TransportError::Closed)));
        assert!(!handle.is_live());
    }

    #[tokio::test]
    async fn test_unreachable_toggle() {
        let transport = ChannelTransport::new();
        let feed = transport.endpoint(&target());
        feed.set_reachable(false);
        assert!(transport
            .connect(&target(), Duration::from_millis(10))
            .await
            .is_err());
    }
}
