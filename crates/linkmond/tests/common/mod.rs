//! Wire-format builders shared by the integration tests

#![allow(dead_code)]

use linkmond::link::{IFINFOMSG_LEN, IFLA_CARRIER, IFLA_IFNAME, IFLA_OPERSTATE};
use linkmond::message::{NLMSG_HDRLEN, nlmsg_align};

/// Encode one netlink message, padded to alignment
pub fn nlmsg(message_type: u16, sequence: u32, payload: &[u8]) -> Vec<u8> {
    let len = NLMSG_HDRLEN + payload.len();
    let mut buf = Vec::with_capacity(nlmsg_align(len));
    buf.extend_from_slice(&(len as u32).to_ne_bytes());
    buf.extend_from_slice(&message_type.to_ne_bytes());
    buf.extend_from_slice(&0u16.to_ne_bytes());
    buf.extend_from_slice(&sequence.to_ne_bytes());
    buf.extend_from_slice(&0u32.to_ne_bytes());
    buf.extend_from_slice(payload);
    buf.resize(nlmsg_align(len), 0);
    buf
}

/// Builder for an ifinfomsg payload and its IFLA attributes
pub struct LinkPayload {
    buf: Vec<u8>,
}

impl LinkPayload {
    pub fn new(index: i32, flags: u32) -> Self {
        let mut buf = vec![0u8; IFINFOMSG_LEN];
        buf[2..4].copy_from_slice(&1u16.to_ne_bytes());
        buf[4..8].copy_from_slice(&index.to_ne_bytes());
        buf[8..12].copy_from_slice(&flags.to_ne_bytes());
        Self { buf }
    }

    pub fn attr(mut self, attr_type: u16, payload: &[u8]) -> Self {
        let len = 4 + payload.len();
        self.buf.extend_from_slice(&(len as u16).to_ne_bytes());
        self.buf.extend_from_slice(&attr_type.to_ne_bytes());
        self.buf.extend_from_slice(payload);
        self.buf.resize(nlmsg_align(self.buf.len()), 0);
        self
    }

    pub fn name(self, name: &str) -> Self {
        let mut raw = name.as_bytes().to_vec();
        raw.push(0);
        self.attr(IFLA_IFNAME, &raw)
    }

    pub fn carrier(self, carrier: u32) -> Self {
        self.attr(IFLA_CARRIER, &carrier.to_ne_bytes())
    }

    pub fn operstate(self, code: u8) -> Self {
        self.attr(IFLA_OPERSTATE, &[code])
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
