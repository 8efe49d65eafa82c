//! telemetry/snapshot.rs
//! Immutable view of protocol counters with a few derived ratios.

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::ProtocolCounters;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub frames_single: u64,
    pub frames_first: u64,
    pub frames_consecutive: u64,
    pub frames_flow_control: u64,
    pub frames_rejected: u64,
    pub messages_completed: u64,
    pub messages_discarded: u64,
    pub messages_expired: u64,
    pub bytes_payload: u64,
    /// Average payload length of completed messages.
    pub avg_message_len: f64,
    /// Rejected frames over all frames seen.
    pub reject_ratio: f64,
}

impl TelemetrySnapshot {
    pub fn from(counters: &ProtocolCounters) -> Self {
        let avg_message_len = if counters.messages_completed > 0 {
            counters.bytes_payload as f64 / counters.messages_completed as f64
        } else {
            0.0
        };

        let seen = counters.frames_total() + counters.frames_rejected;
        let reject_ratio = if seen > 0 {
            counters.frames_rejected as f64 / seen as f64
        } else {
            0.0
        };

        Self {
            frames_single: counters.frames_single,
            frames_first: counters.frames_first,
            frames_consecutive: counters.frames_consecutive,
            frames_flow_control: counters.frames_flow_control,
            frames_rejected: counters.frames_rejected,
            messages_completed: counters.messages_completed,
            messages_discarded: counters.messages_discarded,
            messages_expired: counters.messages_expired,
            bytes_payload: counters.bytes_payload,
            avg_message_len,
            reject_ratio,
        }
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_single + self.frames_first + self.frames_consecutive + self.frames_flow_control
    }

    /// Invariants every snapshot must satisfy.
    pub fn sanity_check(&self) -> bool {
        self.reject_ratio <= 1.0
            && self.messages_completed <= self.frames_single + self.frames_first
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
