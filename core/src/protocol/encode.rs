use tracing::debug;

use crate::constants::{
    pci, ADDRESS_OFFSET, CONSECUTIVE_FRAME_HEADER, CONSECUTIVE_FRAME_PAYLOAD, FIRST_FRAME_HEADER,
    FIRST_FRAME_PAYLOAD, FIRST_SEQUENCE_NUMBER, LINK_FRAME_LEN, SEQUENCE_MODULO,
    SINGLE_FRAME_HEADER, SINGLE_FRAME_MAX_PAYLOAD,
};
use crate::link::LinkFrame;
use crate::message::DiagMessage;

/// Number of link frames needed for a payload of `len` bytes.
pub fn frame_count(len: usize) -> usize {
    if len <= SINGLE_FRAME_MAX_PAYLOAD {
        1
    } else {
        let rest = len - FIRST_FRAME_PAYLOAD;
        1 + rest.div_ceil(CONSECUTIVE_FRAME_PAYLOAD)
    }
}

/// Lazily splits one message into link frames.
///
/// Layout:
///
/// ```text
/// single:      [ addr ][ 0x0 | len ][ payload (1..=6) ]
/// first:       [ addr ][ 0x1 | len[11:8] ][ len[7:0] ][ payload (5) ]
/// consecutive: [ addr ][ 0x2 | seq ][ payload (1..=6) ]
/// ```
///
/// The declared length is taken from the payload. Payloads longer than
/// `MAX_MESSAGE_LEN` do not fit the 12-bit length field; `DiagMessage::new`
/// refuses them, callers building messages by hand must do the same.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    id: u32,
    destination: u8,
    data: &'a [u8],
    offset: usize,
    sequence: u8,
    started: bool,
}

impl<'a> Segmenter<'a> {
    pub fn new(msg: &'a DiagMessage) -> Self {
        Self::from_parts(msg.id, msg.destination, &msg.data)
    }

    pub fn from_parts(id: u32, destination: u8, data: &'a [u8]) -> Self {
        Self {
            id,
            destination,
            data,
            offset: 0,
            sequence: FIRST_SEQUENCE_NUMBER,
            started: false,
        }
    }

    fn single_frame(&mut self) -> LinkFrame {
        let len = self.data.len();
        let mut buf = [0u8; LINK_FRAME_LEN];
        buf[ADDRESS_OFFSET] = self.destination;
        buf[1] = pci::SINGLE | (len as u8 & pci::LOW_MASK);
        buf[SINGLE_FRAME_HEADER..SINGLE_FRAME_HEADER + len].copy_from_slice(self.data);

        self.offset = len;
        LinkFrame::assemble(self.id, len + SINGLE_FRAME_HEADER, buf)
    }

    fn first_frame(&mut self) -> LinkFrame {
        let len = self.data.len();
        let mut buf = [0u8; LINK_FRAME_LEN];
        buf[ADDRESS_OFFSET] = self.destination;
        buf[1] = pci::FIRST | ((len >> 8) as u8 & pci::LOW_MASK);
        buf[2] = (len & 0xFF) as u8;
        buf[FIRST_FRAME_HEADER..].copy_from_slice(&self.data[..FIRST_FRAME_PAYLOAD]);

        self.offset = FIRST_FRAME_PAYLOAD;
        LinkFrame::assemble(self.id, (len + FIRST_FRAME_HEADER).min(LINK_FRAME_LEN), buf)
    }

    fn consecutive_frame(&mut self) -> LinkFrame {
        let n = (self.data.len() - self.offset).min(CONSECUTIVE_FRAME_PAYLOAD);
        let mut buf = [0u8; LINK_FRAME_LEN];
        buf[ADDRESS_OFFSET] = self.destination;
        buf[1] = pci::CONSECUTIVE | self.sequence;
        buf[CONSECUTIVE_FRAME_HEADER..CONSECUTIVE_FRAME_HEADER + n]
            .copy_from_slice(&self.data[self.offset..self.offset + n]);

        self.offset += n;
        self.sequence = (self.sequence + 1) % SEQUENCE_MODULO;
        LinkFrame::assemble(self.id, n + CONSECUTIVE_FRAME_HEADER, buf)
    }

    fn remaining_frames(&self) -> usize {
        if !self.started {
            return frame_count(self.data.len());
        }
        (self.data.len() - self.offset).div_ceil(CONSECUTIVE_FRAME_PAYLOAD)
    }
}

impl Iterator for Segmenter<'_> {
    type Item = LinkFrame;

    fn next(&mut self) -> Option<LinkFrame> {
        if !self.started {
            self.started = true;
            return Some(if self.data.len() <= SINGLE_FRAME_MAX_PAYLOAD {
                self.single_frame()
            } else {
                self.first_frame()
            });
        }

        if self.offset >= self.data.len() {
            return None;
        }
        Some(self.consecutive_frame())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining_frames();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Segmenter<'_> {}

/// Split a message into the ordered frames to transmit.
pub fn generate_frames(msg: &DiagMessage) -> Vec<LinkFrame> {
    let frames: Vec<LinkFrame> = Segmenter::new(msg).collect();
    debug!(
        id = msg.id,
        destination = msg.destination,
        len = msg.data.len(),
        frames = frames.len(),
        "segmented message"
    );
    frames
}
