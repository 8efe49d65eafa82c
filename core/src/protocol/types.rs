use num_enum::TryFromPrimitive;
use thiserror::Error;

use crate::constants::{pci, FIRST_FRAME_HEADER, MIN_FRAME_LEN, PCI_OFFSET};

/// Frame kind carried in the upper nibble of the PCI byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum FrameKind {
    Single      = 0x0,
    First       = 0x1,
    Consecutive = 0x2,
    FlowControl = 0x3,
}

impl FrameKind {
    /// Upper-nibble PCI value for this kind.
    #[inline]
    pub const fn pci_bits(self) -> u8 {
        (self as u8) << 4
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FrameKind::Single => "single",
            FrameKind::First => "first",
            FrameKind::Consecutive => "consecutive",
            FrameKind::FlowControl => "flow_control",
        }
    }
}

/// Decoded protocol control information of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pci {
    Single { length: u8 },
    First { length: u16 },
    Consecutive { sequence: u8 },
    FlowControl,
}

impl Pci {
    /// Parse the PCI of a frame's valid bytes (address byte included).
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < MIN_FRAME_LEN {
            return Err(ProtocolError::TruncatedFrame {
                need: MIN_FRAME_LEN,
                have: bytes.len(),
            });
        }

        let pci_byte = bytes[PCI_OFFSET];
        let nibble = (pci_byte & pci::KIND_MASK) >> 4;
        let low = pci_byte & pci::LOW_MASK;

        let kind = FrameKind::try_from_primitive(nibble)
            .map_err(|_| ProtocolError::UnknownDiscriminator(nibble))?;

        match kind {
            FrameKind::Single => Ok(Pci::Single { length: low }),
            FrameKind::First => {
                if bytes.len() < FIRST_FRAME_HEADER {
                    return Err(ProtocolError::TruncatedFrame {
                        need: FIRST_FRAME_HEADER,
                        have: bytes.len(),
                    });
                }
                let length = ((low as u16) << 8) | bytes[PCI_OFFSET + 1] as u16;
                Ok(Pci::First { length })
            }
            FrameKind::Consecutive => Ok(Pci::Consecutive { sequence: low }),
            FrameKind::FlowControl => Ok(Pci::FlowControl),
        }
    }

    #[inline]
    pub fn kind(&self) -> FrameKind {
        match self {
            Pci::Single { .. } => FrameKind::Single,
            Pci::First { .. } => FrameKind::First,
            Pci::Consecutive { .. } => FrameKind::Consecutive,
            Pci::FlowControl => FrameKind::FlowControl,
        }
    }
}

/// Errors raised while reassembling frames.
///
/// None of these reset the handler. The in-progress message (if any) is left as it
/// was before the offending frame; call `DiagProtocol::reset` before reuse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Single frame length outside 1..=6, or first frame length outside 7..=4095.
    #[error("invalid {kind} frame length: {length}")]
    InvalidLength { kind: &'static str, length: u16 },

    /// Consecutive frame out of order, or with no first frame before it.
    #[error("sequence error: {0}")]
    SequenceError(SequenceFault),

    /// More bytes accumulated than the first frame declared.
    ///
    /// Defensive: consecutive frames are sliced to the remaining length, so
    /// well-formed input cannot reach it.
    #[error("data length mismatch: declared {declared}, received {received}")]
    LengthMismatch { declared: usize, received: usize },

    /// PCI upper nibble outside 0..=3.
    #[error("unknown frame type discriminator: {0:#x}")]
    UnknownDiscriminator(u8),

    /// Frame length indicator too short for what its PCI promises.
    #[error("truncated frame: need {need} bytes, have {have}")]
    TruncatedFrame { need: usize, have: usize },

    /// New single/first frame while a message is still being received.
    #[error("message in progress: {received} of {declared} bytes received")]
    MessageInProgress { declared: usize, received: usize },
}

impl ProtocolError {
    #[inline]
    pub fn is_sequence_error(&self) -> bool {
        matches!(self, ProtocolError::SequenceError(_))
    }
}

/// Why a consecutive frame was refused.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SequenceFault {
    #[error("expected sequence number {expected}, got {got}")]
    OutOfOrder { expected: u8, got: u8 },

    #[error("consecutive frame before first frame")]
    NoFirstFrame { got: u8 },
}
