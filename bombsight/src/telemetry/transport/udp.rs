//! MAVLink over UDP.
//!
//! `udp:<host>:<port>` binds a socket on that address and listens for
//! datagrams from the autopilot or a ground-station forwarder. Serial
//! targets are refused with `TransportError::UnsupportedTarget`, so the
//! reconnect policy moves on to the next target.
//!
//! A reader task owns the socket for the life of the handle. It stamps
//! each datagram as it arrives and keeps the newest decoded message of
//! each kind, so a report that waited in the queue keeps its arrival time.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::mavlink::{DecoderStats, MavlinkDecoder};
use super::message::{LatestMessages, MessageKind, ReceivedMessage};
use super::{BoxFuture, TelemetryTransport, TransportHandle};
use crate::telemetry::config::ConnectionTarget;
use crate::telemetry::error::TransportError;

/// Largest datagram accepted.
const MAX_DATAGRAM_SIZE: usize = 2048;

/// Pause between bind attempts while a closed handle still holds the port.
const REBIND_INTERVAL: Duration = Duration::from_millis(20);

/// Transport that listens for MAVLink datagrams.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpTransport;

impl UdpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryTransport for UdpTransport {
    fn name(&self) -> &'static str {
        "udp"
    }

    fn connect<'a>(
        &'a self,
        target: &'a ConnectionTarget,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<Box<dyn TransportHandle>, TransportError>> {
        Box::pin(async move {
            let (host, port) = match target {
                ConnectionTarget::Udp { host, port } => (host.as_str(), *port),
                ConnectionTarget::Serial { .. } => {
                    return Err(TransportError::UnsupportedTarget {
                        transport: "udp",
                        target: target.clone(),
                    })
                }
            };

            let deadline = tokio::time::Instant::now() + timeout;
            let socket = loop {
                match tokio::time::timeout_at(deadline, UdpSocket::bind((host, port))).await {
                    Ok(Ok(socket)) => break socket,
                    Ok(Err(source))
                        if source.kind() == io::ErrorKind::AddrInUse
                            && tokio::time::Instant::now() + REBIND_INTERVAL < deadline =>
                    {
                        trace!(target = %target, "UDP port busy, retrying bind");
                        tokio::time::sleep(REBIND_INTERVAL).await;
                    }
                    Ok(Err(source)) => {
                        return Err(TransportError::Io {
                            target: target.clone(),
                            source,
                        })
                    }
                    Err(_) => {
                        return Err(TransportError::Unreachable {
                            target: target.clone(),
                        })
                    }
                }
            };

            debug!(
                target = %target,
                local_addr = ?socket.local_addr().ok(),
                "UDP telemetry socket bound"
            );

            let shared = Arc::new(Shared::default());
            let reader = tokio::spawn(read_datagrams(socket, Arc::clone(&shared)));

            let handle: Box<dyn TransportHandle> = Box::new(UdpHandle {
                target: target.clone(),
                shared,
                reader: Some(reader),
            });
            Ok(handle)
        })
    }
}

/// What the reader task has seen and not yet handed out.
#[derive(Default)]
struct ReaderState {
    latest: LatestMessages,
    failure: Option<io::Error>,
    stats: DecoderStats,
}

#[derive(Default)]
struct Shared {
    state: Mutex<ReaderState>,
    arrived: Notify,
}

async fn read_datagrams(socket: UdpSocket, shared: Arc<Shared>) {
    let mut decoder = MavlinkDecoder::new();
    let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        match socket.recv(&mut buffer).await {
            Ok(len) => {
                let received_at = Instant::now();
                let messages = decoder.decode(&buffer[..len]);
                trace!(len, decoded = messages.len(), "Telemetry datagram");

                let mut state = shared.state.lock();
                for message in messages {
                    state.latest.store(ReceivedMessage {
                        message,
                        received_at,
                    });
                }
                state.stats = decoder.stats();
                drop(state);
                shared.arrived.notify_one();
            }
            Err(source) => {
                shared.state.lock().failure = Some(source);
                shared.arrived.notify_one();
                return;
            }
        }
    }
}

struct UdpHandle {
    target: ConnectionTarget,
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,
}

impl TransportHandle for UdpHandle {
    fn receive(
        &mut self,
        kind: MessageKind,
        timeout: Duration,
    ) -> BoxFuture<'_, Result<Option<ReceivedMessage>, TransportError>> {
        Box::pin(async move {
            let deadline = tokio::time::Instant::now() + timeout;

            loop {
                if self.reader.is_none() {
                    return Err(TransportError::Closed);
                }

                let failure = {
                    let mut state = self.shared.state.lock();
                    if let Some(received) = state.latest.take(kind) {
                        return Ok(Some(received));
                    }
                    state.failure.take()
                };

                if let Some(source) = failure {
                    self.close();
                    return Err(TransportError::Io {
                        target: self.target.clone(),
                        source,
                    });
                }

                let arrived = self.shared.arrived.notified();
                if tokio::time::timeout_at(deadline, arrived).await.is_err() {
                    return Ok(None);
                }
            }
        })
    }

    fn is_live(&self) -> bool {
        self.reader.as_ref().is_some_and(|r| !r.is_finished())
    }

    fn last_heartbeat(&self) -> Option<Instant> {
        self.shared.state.lock().latest.last_heartbeat()
    }

    fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            let stats = self.shared.state.lock().stats;
            debug!(
                target = %self.target,
                frames = stats.frames_decoded,
                crc_errors = stats.crc_errors,
                "UDP telemetry socket closed"
            );
        }
    }
}

impl Drop for UdpHandle {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}
