//! constants.rs
//! Wire constants for the address-prefixed transport layer.
//!
//! Every link frame carries at most 8 data bytes. Byte 0 is always the node address,
//! byte 1 carries the PCI (frame kind in the upper nibble), the rest is payload.

/// Maximum number of data bytes in one link frame.
pub const LINK_FRAME_LEN: usize = 8;

/// Offset of the address byte.
pub const ADDRESS_OFFSET: usize = 0;
/// Offset of the PCI byte.
pub const PCI_OFFSET: usize = 1;

/// Smallest frame the decoder can look at (address + PCI).
pub const MIN_FRAME_LEN: usize = 2;

/// Payload bytes carried by a single frame.
pub const SINGLE_FRAME_MAX_PAYLOAD: usize = 6;
/// Payload bytes carried by a first frame (after the 12-bit length).
pub const FIRST_FRAME_PAYLOAD: usize = 5;
/// Payload bytes carried by a consecutive frame.
pub const CONSECUTIVE_FRAME_PAYLOAD: usize = 6;

/// Header bytes in front of the payload.
pub const SINGLE_FRAME_HEADER: usize = 2;
pub const FIRST_FRAME_HEADER: usize = 3;
pub const CONSECUTIVE_FRAME_HEADER: usize = 2;

/// Largest length a 12-bit first-frame length field can declare.
pub const MAX_MESSAGE_LEN: usize = 0x0FFF;
/// Smallest length that must go through first + consecutive frames.
pub const MIN_MULTI_FRAME_LEN: usize = SINGLE_FRAME_MAX_PAYLOAD + 1;

/// Sequence numbers are 4 bits wide.
pub const SEQUENCE_MODULO: u8 = 0x10;
/// First consecutive frame after a first frame carries this sequence number.
pub const FIRST_SEQUENCE_NUMBER: u8 = 1;

/// PCI nibble masks.
pub mod pci {
    pub const KIND_MASK: u8 = 0xF0;
    pub const LOW_MASK: u8 = 0x0F;

    pub const SINGLE: u8 = 0x00;
    pub const FIRST: u8 = 0x10;
    pub const CONSECUTIVE: u8 = 0x20;
    pub const FLOW_CONTROL: u8 = 0x30;
}
