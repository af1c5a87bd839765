//! MAVLink frame codec for the messages the solver consumes.
//!
//! Only `HEARTBEAT`, `GLOBAL_POSITION_INT` and `VFR_HUD` are understood.
//! Everything else on the wire is skipped.
//!
//! # Frame layout
//!
//! ```text
//! v1: FE len seq sys comp id                 payload crc16
//! v2: FD len incompat compat seq sys comp id24 payload crc16 [signature 13]
//! ```
//!
//! The checksum is X.25 (MCRF4XX) over every byte after the magic, followed
//! by the per-message CRC-extra byte. v2 senders strip trailing zero bytes
//! from the payload; the decoder zero-extends them back.

use super::message::{HeartbeatReport, PositionReport, SpeedReport, TelemetryMessage};

/// v1 start-of-frame marker.
pub const MAGIC_V1: u8 = 0xFE;

/// v2 start-of-frame marker.
pub const MAGIC_V2: u8 = 0xFD;

const V1_HEADER_LEN: usize = 6;
const V2_HEADER_LEN: usize = 10;
const CRC_LEN: usize = 2;
const SIGNATURE_LEN: usize = 13;
const INCOMPAT_FLAG_SIGNED: u8 = 0x01;

const MSG_ID_HEARTBEAT: u32 = 0;
const MSG_ID_GLOBAL_POSITION_INT: u32 = 33;
const MSG_ID_VFR_HUD: u32 = 74;

/// Wire protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MavlinkVersion {
    V1,
    V2,
}

/// Payload length and CRC-extra for a known message id.
fn message_layout(msg_id: u32) -> Option<(usize, u8)> {
    match msg_id {
        MSG_ID_HEARTBEAT => Some((9, 50)),
        MSG_ID_GLOBAL_POSITION_INT => Some((28, 104)),
        MSG_ID_VFR_HUD => Some((20, 20)),
        _ => None,
    }
}

/// Fold one byte into an X.25 checksum.
pub fn crc_accumulate(byte: u8, crc: u16) -> u16 {
    let mut tmp = byte ^ (crc & 0xFF) as u8;
    tmp ^= tmp << 4;
    let tmp = tmp as u16;
    (crc >> 8) ^ (tmp << 8) ^ (tmp << 3) ^ (tmp >> 4)
}

/// X.25 checksum of a byte slice, seeded with 0xFFFF.
pub fn crc_calculate(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0xFFFF, |crc, &b| crc_accumulate(b, crc))
}

/// Counters kept across decoded datagrams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames_decoded: u64,
    pub crc_errors: u64,
    pub unknown_messages: u64,
    pub truncated_frames: u64,
}

/// Stateless-per-datagram frame decoder with running statistics.
#[derive(Debug, Default)]
pub struct MavlinkDecoder {
    stats: DecoderStats,
}

impl MavlinkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Decode every recognised frame in `buf`.
    ///
    /// Bytes before a start marker, corrupt frames and unknown message ids
    /// are skipped. A frame cut off at the end of the buffer is dropped.
    pub fn decode(&mut self, buf: &[u8]) -> Vec<TelemetryMessage> {
        let mut messages = Vec::new();
        let mut pos = 0;

        while pos < buf.len() {
            let step = match buf[pos] {
                MAGIC_V1 => self.decode_v1(&buf[pos..], &mut messages),
                MAGIC_V2 => self.decode_v2(&buf[pos..], &mut messages),
                _ => Step::Skip(1),
            };
            match step {
                Step::Skip(n) => pos += n,
                Step::Incomplete => {
                    self.stats.truncated_frames += 1;
                    break;
                }
            }
        }

        messages
    }

    fn decode_v1(&mut self, frame: &[u8], out: &mut Vec<TelemetryMessage>) -> Step {
        if frame.len() < V1_HEADER_LEN {
            return Step::Incomplete;
        }
        let len = frame[1] as usize;
        let total = V1_HEADER_LEN + len + CRC_LEN;
        if frame.len() < total {
            return Step::Incomplete;
        }
        let msg_id = frame[5] as u32;
        let payload = &frame[V1_HEADER_LEN..V1_HEADER_LEN + len];
        let crc_bytes = &frame[V1_HEADER_LEN + len..total];
        self.finish_frame(
            msg_id,
            &frame[1..V1_HEADER_LEN + len],
            payload,
            crc_bytes,
            total,
            out,
        )
    }

    fn decode_v2(&mut self, frame: &[u8], out: &mut Vec<TelemetryMessage>) -> Step {
        if frame.len() < V2_HEADER_LEN {
            return Step::Incomplete;
        }
        let len = frame[1] as usize;
        let signed = frame[2] & INCOMPAT_FLAG_SIGNED != 0;
        let body = V2_HEADER_LEN + len;
        let total = body + CRC_LEN + if signed { SIGNATURE_LEN } else { 0 };
        if frame.len() < total {
            return Step::Incomplete;
        }
        let msg_id = u32::from_le_bytes([frame[7], frame[8], frame[9], 0]);
        let payload = &frame[V2_HEADER_LEN..body];
        let crc_bytes = &frame[body..body + CRC_LEN];
        self.finish_frame(msg_id, &frame[1..body], payload, crc_bytes, total, out)
    }

    fn finish_frame(
        &mut self,
        msg_id: u32,
        checked: &[u8],
        payload: &[u8],
        crc_bytes: &[u8],
        total: usize,
        out: &mut Vec<TelemetryMessage>,
    ) -> Step {
        let Some((expected_len, crc_extra)) = message_layout(msg_id) else {
            self.stats.unknown_messages += 1;
            tracing::trace!(msg_id, "Skipping unsupported MAVLink message");
            return Step::Skip(total);
        };

        let crc = crc_accumulate(crc_extra, crc_calculate(checked));
        let received = u16::from_le_bytes([crc_bytes[0], crc_bytes[1]]);
        if crc != received || payload.len() > expected_len {
            self.stats.crc_errors += 1;
            tracing::trace!(msg_id, "Dropping MAVLink frame with bad checksum");
            // Resynchronise on the next byte; the length field may be corrupt.
            return Step::Skip(1);
        }

        let mut padded = [0u8; 32];
        padded[..payload.len()].copy_from_slice(payload);
        out.push(parse_payload(msg_id, &padded));
        self.stats.frames_decoded += 1;
        Step::Skip(total)
    }
}

enum Step {
    Skip(usize),
    Incomplete,
}

fn u16_at(p: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([p[at], p[at + 1]])
}

fn i16_at(p: &[u8], at: usize) -> i16 {
    i16::from_le_bytes([p[at], p[at + 1]])
}

fn u32_at(p: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}

fn i32_at(p: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}

fn f32_at(p: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([p[at], p[at + 1], p[at + 2], p[at + 3]])
}

/// `p` is zero-extended to at least the message's full length.
fn parse_payload(msg_id: u32, p: &[u8]) -> TelemetryMessage {
    match msg_id {
        MSG_ID_GLOBAL_POSITION_INT => TelemetryMessage::Position(PositionReport {
            time_boot_ms: u32_at(p, 0),
            lat_e7: i32_at(p, 4),
            lon_e7: i32_at(p, 8),
            alt_mm: i32_at(p, 12),
            relative_alt_mm: i32_at(p, 16),
            vx: i16_at(p, 20),
            vy: i16_at(p, 22),
            vz: i16_at(p, 24),
            heading_cdeg: u16_at(p, 26),
        }),
        MSG_ID_VFR_HUD => TelemetryMessage::Speed(SpeedReport {
            airspeed: f32_at(p, 0),
            groundspeed: f32_at(p, 4),
            altitude: f32_at(p, 8),
            climb: f32_at(p, 12),
            heading: i16_at(p, 16),
            throttle: u16_at(p, 18),
        }),
        _ => TelemetryMessage::Heartbeat(HeartbeatReport {
            custom_mode: u32_at(p, 0),
            vehicle_type: p[4],
            autopilot: p[5],
            base_mode: p[6],
            system_status: p[7],
            mavlink_version: p[8],
        }),
    }
}

fn message_payload(message: &TelemetryMessage) -> (u32, Vec<u8>) {
    let mut p = Vec::with_capacity(28);
    let id = match message {
        TelemetryMessage::Heartbeat(hb) => {
            p.extend_from_slice(&hb.custom_mode.to_le_bytes());
            p.extend_from_slice(&[
                hb.vehicle_type,
                hb.autopilot,
                hb.base_mode,
                hb.system_status,
                hb.mavlink_version,
            ]);
            MSG_ID_HEARTBEAT
        }
        TelemetryMessage::Position(pos) => {
            p.extend_from_slice(&pos.time_boot_ms.to_le_bytes());
            p.extend_from_slice(&pos.lat_e7.to_le_bytes());
            p.extend_from_slice(&pos.lon_e7.to_le_bytes());
            p.extend_from_slice(&pos.alt_mm.to_le_bytes());
            p.extend_from_slice(&pos.relative_alt_mm.to_le_bytes());
            p.extend_from_slice(&pos.vx.to_le_bytes());
            p.extend_from_slice(&pos.vy.to_le_bytes());
            p.extend_from_slice(&pos.vz.to_le_bytes());
            p.extend_from_slice(&pos.heading_cdeg.to_le_bytes());
            MSG_ID_GLOBAL_POSITION_INT
        }
        TelemetryMessage::Speed(hud) => {
            p.extend_from_slice(&hud.airspeed.to_le_bytes());
            p.extend_from_slice(&hud.groundspeed.to_le_bytes());
            p.extend_from_slice(&hud.altitude.to_le_bytes());
            p.extend_from_slice(&hud.climb.to_le_bytes());
            p.extend_from_slice(&hud.heading.to_le_bytes());
            p.extend_from_slice(&hud.throttle.to_le_bytes());
            MSG_ID_VFR_HUD
        }
    };
    (id, p)
}

/// Frame encoder for simulated telemetry streams.
#[derive(Debug, Clone)]
pub struct MavlinkEncoder {
    version: MavlinkVersion,
    system_id: u8,
    component_id: u8,
    sequence: u8,
}

impl Default for MavlinkEncoder {
    fn default() -> Self {
        Self::new(MavlinkVersion::V2)
    }
}

impl MavlinkEncoder {
    pub fn new(version: MavlinkVersion) -> Self {
        Self {
            version,
            system_id: 1,
            component_id: 1,
            sequence: 0,
        }
    }

    pub fn with_ids(mut self, system_id: u8, component_id: u8) -> Self {
        self.system_id = system_id;
        self.component_id = component_id;
        self
    }

    /// Encode one message into a complete frame.
    pub fn encode(&mut self, message: &TelemetryMessage) -> Vec<u8> {
        let (msg_id, mut payload) = message_payload(message);
        let crc_extra = message_layout(msg_id).map(|(_, extra)| extra).unwrap_or(0);
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);

        let mut frame = match self.version {
            MavlinkVersion::V1 => {
                let mut f = Vec::with_capacity(V1_HEADER_LEN + payload.len() + CRC_LEN);
                f.extend_from_slice(&[
                    MAGIC_V1,
                    payload.len() as u8,
                    seq,
                    self.system_id,
                    self.component_id,
                    msg_id as u8,
                ]);
                f
            }
            MavlinkVersion::V2 => {
                while payload.len() > 1 && payload.last() == Some(&0) {
                    payload.pop();
                }
                let id = msg_id.to_le_bytes();
                let mut f = Vec::with_capacity(V2_HEADER_LEN + payload.len() + CRC_LEN);
                f.extend_from_slice(&[
                    MAGIC_V2,
                    payload.len() as u8,
                    0,
                    0,
                    seq,
                    self.system_id,
                    self.component_id,
                    id[0],
                    id[1],
                    id[2],
                ]);
                f
            }
        };

        frame.extend_from_slice(&payload);
        let crc = crc_accumulate(crc_extra, crc_calculate(&frame[1..]));
        frame.extend_from_slice(&crc.to_le_bytes());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::super::message::MessageKind;
    use super::*;

    #[test]
    fn test_crc_check_value() {
        assert_eq!(crc_calculate(b"123456789"), 0x6F91);
    }

    #[test]
    fn test_v1_position_roundtrip() {
        let report = PositionReport::from_degrees(22.3193, 114.1694, 500.0).with_heading(42.0);
        let frame = MavlinkEncoder::new(MavlinkVersion::V1).encode(&TelemetryMessage::Position(report));

        assert_eq!(frame[0], MAGIC_V1);
        assert_eq!(frame.len(), V1_HEADER_LEN + 28 + CRC_LEN);

        let mut decoder = MavlinkDecoder::new();
        let messages = decoder.decode(&frame);
        assert_eq!(messages, vec![TelemetryMessage::Position(report)]);
        assert_eq!(decoder.stats().frames_decoded, 1);
    }

    #[test]
    fn test_v2_truncated_payload_is_zero_extended() {
        // heading and throttle are zero, so the v2 payload loses its tail.
        let hud = SpeedReport::new(50.0, 45.0);
        let frame = MavlinkEncoder::new(MavlinkVersion::V2).encode(&TelemetryMessage::Speed(hud));
        assert_eq!(frame[0], MAGIC_V2);
        assert!((frame[1] as usize) < 20);

        let messages = MavlinkDecoder::new().decode(&frame);
        assert_eq!(messages, vec![TelemetryMessage::Speed(hud)]);
    }

    #[test]
    fn test_corrupt_frame_is_skipped() {
        let mut encoder = MavlinkEncoder::default();
        let good = encoder.encode(&TelemetryMessage::Speed(SpeedReport::new(30.0, 28.0)));
        let mut bad = encoder.encode(&TelemetryMessage::heartbeat());
        bad[V2_HEADER_LEN] ^= 0xFF;

        let mut datagram = good;
        datagram.extend_from_slice(&bad);

        let mut decoder = MavlinkDecoder::new();
        let messages = decoder.decode(&datagram);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind(), MessageKind::Speed);
        assert!(decoder.stats().crc_errors >= 1);
    }

    #[test]
    fn test_several_frames_with_leading_garbage() {
        let mut encoder = MavlinkEncoder::new(MavlinkVersion::V1);
        let mut datagram = vec![0x00, 0x13, 0x37];
        datagram.extend(encoder.encode(&TelemetryMessage::heartbeat()));
        datagram.extend(encoder.encode(&TelemetryMessage::Speed(SpeedReport::new(50.0, 45.0))));

        let messages = MavlinkDecoder::new().decode(&datagram);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], TelemetryMessage::heartbeat());
    }

    #[test]
    fn test_unknown_message_is_skipped() {
        // ATTITUDE (id 30), 28 byte payload of zeros; checksum irrelevant.
        let mut frame = vec![MAGIC_V1, 28, 0, 1, 1, 30];
        frame.extend_from_slice(&[0u8; 28]);
        frame.extend_from_slice(&[0, 0]);
        let hb = MavlinkEncoder::new(MavlinkVersion::V1).encode(&TelemetryMessage::heartbeat());
        frame.extend_from_slice(&hb);

        let mut decoder = MavlinkDecoder::new();
        let messages = decoder.decode(&frame);
        assert_eq!(messages, vec![TelemetryMessage::heartbeat()]);
        assert_eq!(decoder.stats().unknown_messages, 1);
    }

    #[test]
    fn test_signed_v2_frame() {
        let mut frame = MavlinkEncoder::new(MavlinkVersion::V2).encode(&TelemetryMessage::heartbeat());
        frame[2] |= INCOMPAT_FLAG_SIGNED;
        // Incompat flags are covered by the checksum: recompute it.
        let body = frame.len() - CRC_LEN;
        let crc = crc_accumulate(50, crc_calculate(&frame[1..body]));
        frame.truncate(body);
        frame.extend_from_slice(&crc.to_le_bytes());
        frame.extend_from_slice(&[0xAA; SIGNATURE_LEN]);

        let messages = MavlinkDecoder::new().decode(&frame);
        assert_eq!(messages, vec![TelemetryMessage::heartbeat()]);
    }

    #[test]
    fn test_truncated_buffer_counts_incomplete() {
        let frame = MavlinkEncoder::new(MavlinkVersion::V1).encode(&TelemetryMessage::heartbeat());
        let mut decoder = MavlinkDecoder::new();
        assert!(decoder.decode(&frame[..frame.len() - 3]).is_empty());
        assert_eq!(decoder.stats().truncated_frames, 1);
    }

    #[test]
    fn test_sequence_wraps() {
        let mut encoder = MavlinkEncoder::new(MavlinkVersion::V1);
        for _ in 0..256 {
            encoder.encode(&TelemetryMessage::heartbeat());
        }
        let frame = encoder.encode(&TelemetryMessage::heartbeat());
        assert_eq!(frame[2], 0);
    }
}
