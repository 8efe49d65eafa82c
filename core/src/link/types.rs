use std::fmt;
use thiserror::Error;

use crate::constants::LINK_FRAME_LEN;

/// One link-layer frame.
///
/// `length` is the count of valid bytes in `data`; bytes past it are padding
/// and are never read by the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkFrame {
    id: u32,
    length: u8,
    data: [u8; LINK_FRAME_LEN],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// More bytes than a link frame can carry.
    #[error("link frame too long: {have} bytes (max {max})")]
    FrameTooLong { have: usize, max: usize },
}

impl LinkFrame {
    /// Build a frame from its valid bytes.
    pub fn new(id: u32, bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() > LINK_FRAME_LEN {
            return Err(FrameError::FrameTooLong {
                have: bytes.len(),
                max: LINK_FRAME_LEN,
            });
        }

        let mut data = [0u8; LINK_FRAME_LEN];
        data[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            id,
            length: bytes.len() as u8,
            data,
        })
    }

    /// Build a frame from a raw 8-byte buffer and a length indicator.
    ///
    /// This mirrors what a bus driver hands over: a full buffer plus a DLC.
    pub fn from_raw(id: u32, length: u8, data: [u8; LINK_FRAME_LEN]) -> Result<Self, FrameError> {
        if length as usize > LINK_FRAME_LEN {
            return Err(FrameError::FrameTooLong {
                have: length as usize,
                max: LINK_FRAME_LEN,
            });
        }
        Ok(Self { id, length, data })
    }

    /// Internal constructor for frames built by the encoder.
    #[inline]
    pub(crate) fn assemble(id: u32, length: usize, data: [u8; LINK_FRAME_LEN]) -> Self {
        debug_assert!(length <= LINK_FRAME_LEN);
        Self {
            id,
            length: length as u8,
            data,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Length indicator (count of valid bytes).
    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Valid bytes of the frame.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len()]
    }

    /// Full 8-byte buffer including padding.
    #[inline]
    pub fn raw(&self) -> &[u8; LINK_FRAME_LEN] {
        &self.data
    }
}

impl fmt::Display for LinkFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03X} [{}]", self.id, self.length)?;
        for b in self.payload() {
            write!(f, " {:02X}", b)?;
        }
        Ok(())
    }
}
