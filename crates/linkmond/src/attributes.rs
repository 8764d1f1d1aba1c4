//! Route attribute (rtattr) table decoding
//!
//! Link messages carry a run of type-length-value attributes after their
//! fixed header. Each attribute is `len: u16, type: u16` followed by
//! `len - 4` payload bytes, padded to 4 bytes. The table keeps the last
//! attribute seen for each type code up to a caller-supplied maximum.

use crate::message::{nlmsg_align, read_u16, read_u32};
use std::borrow::Cow;
use tracing::trace;

/// Size of `struct rtattr`
pub const NLA_HDRLEN: usize = 4;

/// Attribute carries nested attributes
pub const NLA_F_NESTED: u16 = 1 << 15;

/// Attribute payload is in network byte order
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;

/// Bits of `rta_type` that hold the type code
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// One attribute, borrowed from the enclosing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Type code with flag bits removed
    pub attr_type: u16,
    /// Payload without header or padding
    pub payload: &'a [u8],
}

impl<'a> Attribute<'a> {
    /// First payload byte, for one-byte enumerations
    pub fn as_u8(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Payload as a native-endian `u32`, if it holds at least four bytes
    pub fn as_u32(&self) -> Option<u32> {
        (self.payload.len() >= 4).then(|| read_u32(self.payload, 0))
    }

    /// Payload as text up to the first NUL, lossily decoded
    pub fn as_str(&self) -> Cow<'a, str> {
        let payload = self.payload;
        let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
        String::from_utf8_lossy(&payload[..end])
    }
}

/// Sparse attribute lookup indexed by type code
#[derive(Debug, Clone)]
pub struct AttributeTable<'a> {
    entries: Vec<Option<Attribute<'a>>>,
}

impl<'a> AttributeTable<'a> {
    /// Decode the attributes in `buf`, keeping codes up to `max_type`
    ///
    /// Decoding stops quietly at the first attribute whose declared length
    /// is shorter than its header or overruns `buf`; everything before it
    /// is kept.
    pub fn parse(buf: &'a [u8], max_type: u16) -> Self {
        let mut entries = vec![None; usize::from(max_type) + 1];
        let mut rest = buf;

        while rest.len() >= NLA_HDRLEN {
            let len = usize::from(read_u16(rest, 0));
            if len < NLA_HDRLEN || len > rest.len() {
                trace!(
                    declared_len = len,
                    remaining = rest.len(),
                    "Truncating attribute decode"
                );
                break;
            }

            let attr_type = read_u16(rest, 2) & NLA_TYPE_MASK;
            if attr_type <= max_type {
                entries[usize::from(attr_type)] = Some(Attribute {
                    attr_type,
                    payload: &rest[NLA_HDRLEN..len],
                });
            }

            rest = &rest[nlmsg_align(len).min(rest.len())..];
        }

        Self { entries }
    }

    /// Highest type code the table can hold
    pub fn max_type(&self) -> u16 {
        // entries is never empty: parse sizes it to max_type + 1
        (self.entries.len() - 1) as u16
    }

    /// Attribute stored for `attr_type`, if present and in range
    pub fn get(&self, attr_type: u16) -> Option<&Attribute<'a>> {
        self.entries.get(usize::from(attr_type))?.as_ref()
    }

    /// True when an attribute with `attr_type` was decoded
    pub fn contains(&self, attr_type: u16) -> bool {
        self.get(attr_type).is_some()
    }

    /// Number of distinct type codes present
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// True when no attribute was decoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present attributes in ascending type order
    pub fn iter(&self) -> impl Iterator<Item = &Attribute<'a>> {
        self.entries.iter().flatten()
    }
}
