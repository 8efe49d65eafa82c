use thiserror::Error;

use crate::constants::MAX_MESSAGE_LEN;

/// One diagnostic message.
///
/// The channel `id` is shared with every frame of the message; its low byte is the
/// sender's node address. `destination` is the address byte that prefixes each frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagMessage {
    pub id: u32,
    pub destination: u8,
    /// Total payload length announced on the wire.
    pub length: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message payload is empty")]
    Empty,

    #[error("message payload too long: {have} bytes (max {max})")]
    TooLong { have: usize, max: usize },
}

impl DiagMessage {
    /// Build an outbound message; the declared length is taken from the payload.
    pub fn new(id: u32, destination: u8, data: impl Into<Vec<u8>>) -> Result<Self, MessageError> {
        let data = data.into();
        if data.is_empty() {
            return Err(MessageError::Empty);
        }
        if data.len() > MAX_MESSAGE_LEN {
            return Err(MessageError::TooLong {
                have: data.len(),
                max: MAX_MESSAGE_LEN,
            });
        }

        Ok(Self {
            id,
            destination,
            length: data.len() as u16,
            data,
        })
    }

    /// Empty message awaiting reassembly.
    pub(crate) fn start(id: u32, destination: u8, length: u16) -> Self {
        Self {
            id,
            destination,
            length,
            data: Vec::with_capacity(length as usize),
        }
    }

    /// Node address of the sender (low byte of the channel id).
    #[inline]
    pub fn source_address(&self) -> u8 {
        (self.id & 0xFF) as u8
    }

    #[inline]
    pub fn destination_address(&self) -> u8 {
        self.destination
    }

    #[inline]
    pub fn declared_length(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.data
    }
}
