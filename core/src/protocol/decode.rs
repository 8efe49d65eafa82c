use std::mem;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::{ProtocolConfig, RestartPolicy};
use crate::constants::{
    ADDRESS_OFFSET, CONSECUTIVE_FRAME_HEADER, CONSECUTIVE_FRAME_PAYLOAD, FIRST_FRAME_HEADER,
    FIRST_SEQUENCE_NUMBER, LINK_FRAME_LEN, MIN_MULTI_FRAME_LEN, SEQUENCE_MODULO,
    SINGLE_FRAME_HEADER, SINGLE_FRAME_MAX_PAYLOAD,
};
use crate::link::LinkFrame;
use crate::message::DiagMessage;
use crate::protocol::types::{FrameKind, Pci, ProtocolError, SequenceFault};
use crate::telemetry::ProtocolCounters;

/// Reassembly state. A completed message is never stored: it is handed back
/// to the caller and the state drops to `Idle` in the same call.
#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Receiving {
        message: DiagMessage,
        received: usize,
        expected_seq: u8,
        /// Time of the last accepted frame. `None` once any frame of the message
        /// arrived through `parse_frame`: such a message never expires.
        last_frame_at: Option<Instant>,
    },
}

/// Stateful decoder for one reassembly stream.
///
/// Frames are pushed one at a time; a call returns `Ok(Some(msg))` when a message
/// completes, `Ok(None)` while one is still being received.
///
/// On `Err` the handler keeps whatever state it had before the offending frame.
/// Callers must call [`DiagProtocol::reset`] before relying on it again.
///
/// One instance serves exactly one stream. Peers talking concurrently need one
/// handler each; the handler does no locking.
#[derive(Debug, Default)]
pub struct DiagProtocol {
    config: ProtocolConfig,
    state: State,
    counters: ProtocolCounters,
}

fn reject(counters: &mut ProtocolCounters, frame: &LinkFrame, err: ProtocolError) -> ProtocolError {
    counters.add_rejected();
    warn!(id = frame.id(), bytes = %hex::encode(frame.payload()), error = %err, "frame rejected");
    err
}

impl DiagProtocol {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProtocolConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn counters(&self) -> &ProtocolCounters {
        &self.counters
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self.state, State::Receiving { .. })
    }

    /// `(received, declared)` bytes of the message in progress.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match &self.state {
            State::Receiving { message, received, .. } => Some((*received, message.declared_length())),
            State::Idle => None,
        }
    }

    /// Sequence number the next consecutive frame must carry.
    pub fn expected_sequence(&self) -> Option<u8> {
        match &self.state {
            State::Receiving { expected_seq, .. } => Some(*expected_seq),
            State::Idle => None,
        }
    }

    /// Abort the message in progress, if any. Idempotent.
    pub fn reset(&mut self) {
        if let State::Receiving { message, received, .. } = mem::take(&mut self.state) {
            self.counters.add_discarded();
            debug!(
                id = message.id,
                received,
                declared = message.declared_length(),
                "reassembly aborted"
            );
        }
    }

    /// Drop the message in progress if the configured frame gap has run out.
    ///
    /// Returns `true` when a message was dropped. Without `max_frame_gap_ms`, nothing
    /// ever expires. Neither does a message whose last accepted frame came through
    /// [`DiagProtocol::parse_frame`]; a later timed frame restarts its clock.
    pub fn expire(&mut self, now: Instant) -> bool {
        let Some(gap) = self.config.max_frame_gap() else {
            return false;
        };

        let expired = match &self.state {
            State::Receiving { last_frame_at: Some(at), .. } => now.saturating_duration_since(*at) > gap,
            _ => false,
        };
        if !expired {
            return false;
        }

        if let State::Receiving { message, received, .. } = mem::take(&mut self.state) {
            self.counters.add_expired();
            warn!(
                id = message.id,
                received,
                declared = message.declared_length(),
                gap_ms = gap.as_millis() as u64,
                "reassembly expired"
            );
        }
        true
    }

    /// Push one frame without any notion of time.
    ///
    /// A message touched by this call is exempt from the frame gap until the next
    /// [`DiagProtocol::parse_frame_at`] accepts one of its frames.
    pub fn parse_frame(&mut self, frame: &LinkFrame) -> Result<Option<DiagMessage>, ProtocolError> {
        self.process(frame, None)
    }

    /// Push one frame received at `now`, expiring a stale message first.
    pub fn parse_frame_at(
        &mut self,
        frame: &LinkFrame,
        now: Instant,
    ) -> Result<Option<DiagMessage>, ProtocolError> {
        self.expire(now);
        self.process(frame, Some(now))
    }

    /// Push frames in order and collect every completed message.
    ///
    /// Stops at the first error; messages completed before it are lost with it.
    pub fn feed<'f, I>(&mut self, frames: I) -> Result<Vec<DiagMessage>, ProtocolError>
    where
        I: IntoIterator<Item = &'f LinkFrame>,
    {
        let mut out = Vec::new();
        for frame in frames {
            if let Some(msg) = self.parse_frame(frame)? {
                out.push(msg);
            }
        }
        Ok(out)
    }

    fn process(
        &mut self,
        frame: &LinkFrame,
        now: Option<Instant>,
    ) -> Result<Option<DiagMessage>, ProtocolError> {
        trace!(id = frame.id(), bytes = %hex::encode(frame.payload()), "frame in");

        let pci = match Pci::parse(frame.payload()) {
            Ok(pci) => pci,
            Err(e) => return Err(reject(&mut self.counters, frame, e)),
        };

        match pci {
            Pci::Single { length } => self.single_frame(frame, length),
            Pci::First { length } => self.first_frame(frame, length, now).map(|_| None),
            Pci::Consecutive { sequence } => self.consecutive_frame(frame, sequence, now),
            Pci::FlowControl => {
                // Sender pacing is not implemented; the frame is only counted.
                self.counters.add_frame(FrameKind::FlowControl);
                Ok(None)
            }
        }
    }

    /// Apply the restart policy before a single/first frame takes over.
    fn begin(&mut self, frame: &LinkFrame) -> Result<(), ProtocolError> {
        if let State::Receiving { message, received, .. } = &self.state {
            let declared = message.declared_length();
            match self.config.restart_policy {
                RestartPolicy::Reject => {
                    let err = ProtocolError::MessageInProgress { declared, received: *received };
                    return Err(reject(&mut self.counters, frame, err));
                }
                RestartPolicy::Restart => {
                    warn!(id = message.id, received = *received, declared, "partial message discarded");
                    self.counters.add_discarded();
                }
            }
        }
        Ok(())
    }

    fn single_frame(
        &mut self,
        frame: &LinkFrame,
        length: u8,
    ) -> Result<Option<DiagMessage>, ProtocolError> {
        let len = length as usize;
        if !(1..=SINGLE_FRAME_MAX_PAYLOAD).contains(&len) {
            let err = ProtocolError::InvalidLength { kind: FrameKind::Single.as_str(), length: length as u16 };
            return Err(reject(&mut self.counters, frame, err));
        }

        let bytes = frame.payload();
        let need = SINGLE_FRAME_HEADER + len;
        if bytes.len() < need {
            let err = ProtocolError::TruncatedFrame { need, have: bytes.len() };
            return Err(reject(&mut self.counters, frame, err));
        }

        self.begin(frame)?;
        self.state = State::Idle;

        let mut message = DiagMessage::start(frame.id(), bytes[ADDRESS_OFFSET], length as u16);
        message.data.extend_from_slice(&bytes[SINGLE_FRAME_HEADER..need]);

        self.counters.add_frame(FrameKind::Single);
        self.counters.add_completed(len);
        debug!(id = message.id, destination = message.destination, len, "single frame message");

        Ok(Some(message))
    }

    fn first_frame(
        &mut self,
        frame: &LinkFrame,
        length: u16,
        now: Option<Instant>,
    ) -> Result<(), ProtocolError> {
        let len = length as usize;
        if len < MIN_MULTI_FRAME_LEN {
            let err = ProtocolError::InvalidLength { kind: FrameKind::First.as_str(), length };
            return Err(reject(&mut self.counters, frame, err));
        }

        let bytes = frame.payload();
        let need = (len + FIRST_FRAME_HEADER).min(LINK_FRAME_LEN);
        if bytes.len() < need {
            let err = ProtocolError::TruncatedFrame { need, have: bytes.len() };
            return Err(reject(&mut self.counters, frame, err));
        }

        self.begin(frame)?;

        let mut message = DiagMessage::start(frame.id(), bytes[ADDRESS_OFFSET], length);
        message.data.extend_from_slice(&bytes[FIRST_FRAME_HEADER..need]);
        let received = need - FIRST_FRAME_HEADER;

        self.counters.add_frame(FrameKind::First);
        debug!(id = message.id, destination = message.destination, declared = len, "first frame");

        self.state = State::Receiving {
            message,
            received,
            expected_seq: FIRST_SEQUENCE_NUMBER,
            last_frame_at: now,
        };
        Ok(())
    }

    fn consecutive_frame(
        &mut self,
        frame: &LinkFrame,
        sequence: u8,
        now: Option<Instant>,
    ) -> Result<Option<DiagMessage>, ProtocolError> {
        let State::Receiving { message, received, expected_seq, last_frame_at } = &mut self.state else {
            let err = ProtocolError::SequenceError(SequenceFault::NoFirstFrame { got: sequence });
            return Err(reject(&mut self.counters, frame, err));
        };

        if sequence != *expected_seq {
            let err = ProtocolError::SequenceError(SequenceFault::OutOfOrder {
                expected: *expected_seq,
                got: sequence,
            });
            return Err(reject(&mut self.counters, frame, err));
        }

        let declared = message.declared_length();
        let take = declared.saturating_sub(*received).min(CONSECUTIVE_FRAME_PAYLOAD);
        let bytes = frame.payload();
        let need = CONSECUTIVE_FRAME_HEADER + take;
        if bytes.len() < need {
            let err = ProtocolError::TruncatedFrame { need, have: bytes.len() };
            return Err(reject(&mut self.counters, frame, err));
        }

        if *received + take > declared {
            let err = ProtocolError::LengthMismatch { declared, received: *received + take };
            return Err(reject(&mut self.counters, frame, err));
        }

        message.data.extend_from_slice(&bytes[CONSECUTIVE_FRAME_HEADER..need]);
        *received += take;
        self.counters.add_frame(FrameKind::Consecutive);

        // An untimed frame takes the message out of expiry, same as an untimed first frame.
        *last_frame_at = now;

        if *received < declared {
            *expected_seq = (*expected_seq + 1) % SEQUENCE_MODULO;
            return Ok(None);
        }

        let message = mem::replace(message, DiagMessage::start(frame.id(), 0, 0));
        self.state = State::Idle;

        self.counters.add_completed(message.data.len());
        debug!(id = message.id, destination = message.destination, len = message.data.len(), "message reassembled");
        Ok(Some(message))
    }
}
