//! telemetry/counters.rs
//! Mutable counters updated while frames are encoded and decoded.

use bincode::{Decode, Encode};
use std::ops::AddAssign;

use crate::protocol::FrameKind;

/// Deterministic counters collected by one protocol handler.
#[derive(Default, Clone, Debug, Encode, Decode, PartialEq, Eq)]
pub struct ProtocolCounters {
    pub frames_single: u64,
    pub frames_first: u64,
    pub frames_consecutive: u64,
    pub frames_flow_control: u64,
    /// Frames refused with a protocol error.
    pub frames_rejected: u64,
    pub messages_completed: u64,
    /// Partial messages dropped by a restart or an explicit reset.
    pub messages_discarded: u64,
    /// Partial messages dropped because the frame gap ran out.
    pub messages_expired: u64,
    /// Payload bytes of completed messages.
    pub bytes_payload: u64,
}

impl ProtocolCounters {
    /// Record one accepted frame.
    pub fn add_frame(&mut self, kind: FrameKind) {
        match kind {
            FrameKind::Single => self.frames_single += 1,
            FrameKind::First => self.frames_first += 1,
            FrameKind::Consecutive => self.frames_consecutive += 1,
            FrameKind::FlowControl => self.frames_flow_control += 1,
        }
    }

    pub fn add_rejected(&mut self) {
        self.frames_rejected += 1;
    }

    /// Record one reassembled message of `len` payload bytes.
    pub fn add_completed(&mut self, len: usize) {
        self.messages_completed += 1;
        self.bytes_payload += len as u64;
    }

    pub fn add_discarded(&mut self) {
        self.messages_discarded += 1;
    }

    pub fn add_expired(&mut self) {
        self.messages_expired += 1;
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_single + self.frames_first + self.frames_consecutive + self.frames_flow_control
    }

    pub fn merge(&mut self, other: &ProtocolCounters) {
        self.frames_single += other.frames_single;
        self.frames_first += other.frames_first;
        self.frames_consecutive += other.frames_consecutive;
        self.frames_flow_control += other.frames_flow_control;
        self.frames_rejected += other.frames_rejected;

        self.messages_completed += other.messages_completed;
        self.messages_discarded += other.messages_discarded;
        self.messages_expired += other.messages_expired;
        self.bytes_payload += other.bytes_payload;
    }

    /// Compact binary form for persisting counters between runs.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        let (counters, _) = bincode::decode_from_slice(buf, bincode::config::standard())?;
        Ok(counters)
    }
}

impl AddAssign for ProtocolCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
