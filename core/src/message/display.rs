//! message/display.rs
//! Human-readable rendering of messages.
//!
//! Purely cosmetic: the protocol never consults an address book.

use std::fmt;

use crate::message::types::DiagMessage;

/// Address → node name lookup.
pub trait AddressBook {
    fn name(&self, address: u8) -> Option<&str>;
}

impl<B: AddressBook + ?Sized> AddressBook for &B {
    fn name(&self, address: u8) -> Option<&str> {
        (**self).name(address)
    }
}

impl AddressBook for std::collections::HashMap<u8, String> {
    fn name(&self, address: u8) -> Option<&str> {
        self.get(&address).map(String::as_str)
    }
}

/// Built-in table of vehicle module addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownDevices;

impl AddressBook for KnownDevices {
    fn name(&self, address: u8) -> Option<&str> {
        let name = match address {
            0x01 => "ACSM2",
            0x06 => "ICAM2",
            0x07 => "SME2",
            0x09 => "RDME",
            0x0A => "REME",
            0x10 => "BDC_GW_MSM",
            0x12 => "EDME",
            0x14 => "LIM",
            0x15 => "UCX",
            0x1A => "AE",
            0x1D => "TFM2",
            0x22 => "SAS",
            0x29 => "DSC2",
            0x2C => "PMA2",
            0x30 => "EPS",
            0x35 => "TBX",
            0x40 => "BDC_BODY",
            0x43 | 0x44 => "FLE",
            0x5D => "KAFAS2",
            0x5E => "GWS",
            0x60 => "BKOMBI",
            0x61 => "TCB",
            0x63 => "HU_NBT",
            0x67 => "ZBE3",
            0x78 => "IHKA3",
            0xDF => "BROADCAST",
            0xF1 => "ESYS_OBD",
            0xF4 => "ESYS_IK",
            _ => return None,
        };
        Some(name)
    }
}

/// `FROM <src> TO <dst>:\t[AA BB ..]`
pub struct MessageDisplay<'a, B: AddressBook> {
    message: &'a DiagMessage,
    book: B,
}

impl DiagMessage {
    /// Render with a caller-supplied address book.
    pub fn display_with<B: AddressBook>(&self, book: B) -> MessageDisplay<'_, B> {
        MessageDisplay { message: self, book }
    }
}

fn write_node<B: AddressBook>(f: &mut fmt::Formatter<'_>, book: &B, address: u8) -> fmt::Result {
    match book.name(address) {
        Some(name) => f.write_str(name),
        None => write!(f, "{:#x}", address),
    }
}

impl<B: AddressBook> fmt::Display for MessageDisplay<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FROM ")?;
        write_node(f, &self.book, self.message.source_address())?;
        f.write_str(" TO ")?;
        write_node(f, &self.book, self.message.destination)?;
        f.write_str(":\t[")?;
        for (i, b) in self.message.data.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for DiagMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display_with(KnownDevices), f)
    }
}
