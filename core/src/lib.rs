//! diag-core
//!
//! Address-prefixed ISO-TP segmentation and reassembly for vehicle diagnostics.
//! Pure Rust, synchronous, no IO.
//!
//! ```
//! use diag_core::prelude::*;
//!
//! let msg = DiagMessage::new(0x6F1, 0x10, vec![0x22, 0xF1, 0x90]).unwrap();
//! let frames = generate_frames(&msg);
//!
//! let mut rx = DiagProtocol::new();
//! let out = rx.feed(&frames).unwrap();
//! assert_eq!(out, vec![msg]);
//! ```

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;

pub mod link;
pub mod message;
pub mod protocol;
pub mod telemetry;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::config::{ProtocolConfig, RestartPolicy};
    pub use crate::link::LinkFrame;
    pub use crate::message::{AddressBook, DiagMessage, KnownDevices};
    pub use crate::protocol::{generate_frames, DiagProtocol, FrameKind, ProtocolError, Segmenter};
    pub use crate::types::DiagError;
}
