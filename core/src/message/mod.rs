//! Diagnostic messages exchanged by upper layers.
//!
//! Responsibilities:
//! - Own the payload and addressing of one logical message
//! - Render messages for humans through a swappable address book
//!
//! Non-responsibilities:
//! - Framing (see `protocol`)
//! - Meaning of the diagnostic payload

pub mod types;
pub mod display;

pub use types::{
    DiagMessage,
    MessageError,
};
pub use display::{
    AddressBook,
    KnownDevices,
    MessageDisplay,
};
