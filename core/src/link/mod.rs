//! Link-layer frame value type.
//!
//! Responsibilities:
//! - Hold one fixed-size frame (id, length indicator, up to 8 bytes)
//! - Expose the valid bytes of a frame
//!
//! Non-responsibilities:
//! - Bus access, transmission, reception
//! - Arbitration and timing

pub mod types;

pub use types::{
    LinkFrame,
    FrameError,
};
