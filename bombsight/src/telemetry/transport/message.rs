//! Decoded telemetry messages.

use std::fmt;
use std::time::Instant;

/// Sentinel for an unknown heading in a position report.
pub const HEADING_UNKNOWN: u16 = u16::MAX;

/// Message kinds a caller can wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Heartbeat,
    Position,
    Speed,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Heartbeat => write!(f, "heartbeat"),
            MessageKind::Position => write!(f, "position"),
            MessageKind::Speed => write!(f, "speed"),
        }
    }
}

/// Periodic liveness signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeartbeatReport {
    pub custom_mode: u32,
    pub vehicle_type: u8,
    pub autopilot: u8,
    pub base_mode: u8,
    pub system_status: u8,
    pub mavlink_version: u8,
}

/// Fused global position.
///
/// Coordinates are fixed-point 1e-7 degrees; altitudes are millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionReport {
    pub time_boot_ms: u32,
    pub lat_e7: i32,
    pub lon_e7: i32,
    /// Altitude above mean sea level (mm).
    pub alt_mm: i32,
    /// Altitude above home (mm).
    pub relative_alt_mm: i32,
    /// Ground velocity components (cm/s).
    pub vx: i16,
    pub vy: i16,
    pub vz: i16,
    /// Heading in centidegrees, `HEADING_UNKNOWN` when not available.
    pub heading_cdeg: u16,
}

impl PositionReport {
    /// Build a report from floating-point values (simulation, tests).
    pub fn from_degrees(latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            lat_e7: (latitude * 1e7).round() as i32,
            lon_e7: (longitude * 1e7).round() as i32,
            alt_mm: (altitude_m * 1000.0).round() as i32,
            relative_alt_mm: (altitude_m * 1000.0).round() as i32,
            heading_cdeg: HEADING_UNKNOWN,
            ..Default::default()
        }
    }

    pub fn with_heading(mut self, heading_deg: f64) -> Self {
        self.heading_cdeg = (heading_deg.rem_euclid(360.0) * 100.0).round() as u16;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.lat_e7 as f64 / 1e7
    }

    pub fn longitude(&self) -> f64 {
        self.lon_e7 as f64 / 1e7
    }

    /// Altitude above mean sea level in meters.
    pub fn altitude_m(&self) -> f64 {
        self.alt_mm as f64 / 1000.0
    }

    /// Heading in degrees, if reported.
    pub fn heading_deg(&self) -> Option<f64> {
        (self.heading_cdeg != HEADING_UNKNOWN).then(|| self.heading_cdeg as f64 / 100.0)
    }
}

/// Head-up display speeds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpeedReport {
    /// Indicated airspeed (m/s).
    pub airspeed: f32,
    /// Groundspeed (m/s).
    pub groundspeed: f32,
    /// Altitude MSL (m).
    pub altitude: f32,
    /// Climb rate (m/s).
    pub climb: f32,
    /// Heading in degrees, 0..360.
    pub heading: i16,
    /// Throttle percentage.
    pub throttle: u16,
}

impl SpeedReport {
    pub fn new(airspeed: f32, groundspeed: f32) -> Self {
        Self {
            airspeed,
            groundspeed,
            ..Default::default()
        }
    }
}

/// A message produced by a transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetryMessage {
    Heartbeat(HeartbeatReport),
    Position(PositionReport),
    Speed(SpeedReport),
}

impl TelemetryMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            TelemetryMessage::Heartbeat(_) => MessageKind::Heartbeat,
            TelemetryMessage::Position(_) => MessageKind::Position,
            TelemetryMessage::Speed(_) => MessageKind::Speed,
        }
    }

    /// A default heartbeat.
    pub fn heartbeat() -> Self {
        TelemetryMessage::Heartbeat(HeartbeatReport {
            mavlink_version: 3,
            ..Default::default()
        })
    }
}

/// A message with the instant it arrived at the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReceivedMessage {
    pub message: TelemetryMessage,
    pub received_at: Instant,
}

impl ReceivedMessage {
    /// Stamp `message` as arriving now.
    pub fn now(message: TelemetryMessage) -> Self {
        Self {
            message,
            received_at: Instant::now(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.message.kind()
    }
}

/// Newest message of each kind not yet taken by a receive.
///
/// A newer arrival replaces the held message of its kind; an older one
/// is dropped.
#[derive(Debug, Default)]
pub(crate) struct LatestMessages {
    heartbeat: Option<ReceivedMessage>,
    position: Option<ReceivedMessage>,
    speed: Option<ReceivedMessage>,
    last_heartbeat: Option<Instant>,
}

impl LatestMessages {
    pub(crate) fn store(&mut self, received: ReceivedMessage) {
        let kind = received.kind();
        if kind == MessageKind::Heartbeat {
            self.last_heartbeat = self.last_heartbeat.max(Some(received.received_at));
        }
        let slot = self.slot(kind);
        if slot
            .as_ref()
            .map_or(true, |held| held.received_at <= received.received_at)
        {
            *slot = Some(received);
        }
    }

    pub(crate) fn take(&mut self, kind: MessageKind) -> Option<ReceivedMessage> {
        self.slot(kind).take()
    }

    /// Arrival of the newest heartbeat ever stored, taken or not.
    pub(crate) fn last_heartbeat(&self) -> Option<Instant> {
        self.last_heartbeat
    }

    fn slot(&mut self, kind: MessageKind) -> &mut Option<ReceivedMessage> {
        match kind {
            MessageKind::Heartbeat => &mut self.heartbeat,
            MessageKind::Position => &mut self.position,
            MessageKind::Speed => &mut self.speed,
        }
    }
}
