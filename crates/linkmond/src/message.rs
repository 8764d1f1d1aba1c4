//! Netlink message framing
//!
//! A datagram read from a netlink socket carries zero or more messages laid
//! out back to back:
//!
//! ```text
//! ┌──────────────────────┬───────────────────┬─────────┬──────────────── ...
//! │ nlmsghdr (16 bytes)  │ payload           │ padding │ next nlmsghdr
//! └──────────────────────┴───────────────────┴─────────┴──────────────── ...
//!   <------- nlmsg_len ------------------->
//!   <------- NLMSG_ALIGN(nlmsg_len) --------------->
//! ```
//!
//! [`MessageFramer`] walks that layout lazily. The declared length of every
//! message is checked against the header size and the bytes left in the
//! datagram before anything past the header is touched.

use std::iter::FusedIterator;
use thiserror::Error;

/// Netlink messages and attributes are padded to this boundary
pub const NLMSG_ALIGNTO: usize = 4;

/// Size of `struct nlmsghdr`
pub const NLMSG_HDRLEN: usize = 16;

/// Round `len` up to the netlink alignment boundary
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

#[inline]
pub(crate) fn read_u16(buf: &[u8], at: usize) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&buf[at..at + 2]);
    u16::from_ne_bytes(raw)
}

#[inline]
pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&buf[at..at + 4]);
    u32::from_ne_bytes(raw)
}

/// A message whose declared length cannot be framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid message length {declared_len} at offset {offset}")]
pub struct FramingError {
    /// `nlmsg_len` as read from the header
    pub declared_len: u32,
    /// Byte offset of the offending header within the datagram
    pub offset: usize,
}

/// One framed netlink message, borrowed from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMessage<'a> {
    /// `nlmsg_type`
    pub message_type: u16,
    /// `nlmsg_flags`
    pub flags: u16,
    /// `nlmsg_seq`
    pub sequence: u32,
    /// `nlmsg_pid` of the originator (0 for the kernel)
    pub port_id: u32,
    /// Bytes following the header, `nlmsg_len - NLMSG_HDRLEN` long
    pub payload: &'a [u8],
}

impl RawMessage<'_> {
    /// Declared total length of the message, header included
    pub fn len(&self) -> usize {
        NLMSG_HDRLEN + self.payload.len()
    }

    /// True when the message carries no payload
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Lazy iterator over the messages of one datagram
///
/// Yields `Ok` for each well-formed message in buffer order. On the first
/// malformed header it yields a single `Err` and then stays exhausted.
#[derive(Debug, Clone)]
pub struct MessageFramer<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> MessageFramer<'a> {
    /// Frame the valid prefix of a receive buffer
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }
}

impl<'a> Iterator for MessageFramer<'a> {
    type Item = Result<RawMessage<'a>, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining() < NLMSG_HDRLEN {
            return None;
        }

        let start = self.offset;
        let declared_len = read_u32(self.buf, start);
        let len = declared_len as usize;

        if len < NLMSG_HDRLEN || len > self.remaining() {
            self.failed = true;
            return Some(Err(FramingError {
                declared_len,
                offset: start,
            }));
        }

        let message = RawMessage {
            message_type: read_u16(self.buf, start + 4),
            flags: read_u16(self.buf, start + 6),
            sequence: read_u32(self.buf, start + 8),
            port_id: read_u32(self.buf, start + 12),
            payload: &self.buf[start + NLMSG_HDRLEN..start + len],
        };

        // The final message of a datagram may omit its trailing padding
        self.offset = (start + nlmsg_align(len)).min(self.buf.len());

        Some(Ok(message))
    }
}

impl FusedIterator for MessageFramer<'_> {}

/// Frame every message in `buf`
pub fn frame_messages(buf: &[u8]) -> MessageFramer<'_> {
    MessageFramer::new(buf)
}
