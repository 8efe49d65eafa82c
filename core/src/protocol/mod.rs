//! Segmentation and reassembly of diagnostic messages.
//!
//! Responsibilities:
//! - Split a message into single / first / consecutive frames
//! - Reassemble incoming frames with strict PCI, length and sequence checks
//!
//! Non-responsibilities:
//! - Flow control pacing (flow-control frames are accepted and ignored)
//! - Timers (callers supply timestamps when they want a frame gap enforced)
//! - IO

pub mod types;
pub mod encode;
pub mod decode;

pub use types::{
    FrameKind,
    Pci,
    ProtocolError,
    SequenceFault,
};
pub use encode::{
    frame_count,
    generate_frames,
    Segmenter,
};
pub use decode::{
    DiagProtocol,
};
