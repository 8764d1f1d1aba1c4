//! Interface link events from RTM_NEWLINK / RTM_DELLINK / RTM_GETLINK
//!
//! A link message payload is a `struct ifinfomsg` followed by IFLA_*
//! attributes. The extractor reads the fixed header, decodes the attributes
//! that follow it and builds an [`InterfaceLinkEvent`]. Missing attributes
//! leave the matching field unset; they never fail the message.

use crate::attributes::AttributeTable;
use crate::message::{RawMessage, read_u16, read_u32};
use std::fmt;
use thiserror::Error;

/// New or changed link
pub const RTM_NEWLINK: u16 = 16;
/// Removed link
pub const RTM_DELLINK: u16 = 17;
/// Link query / dump reply
pub const RTM_GETLINK: u16 = 18;

/// Size of `struct ifinfomsg`
pub const IFINFOMSG_LEN: usize = 16;

/// Interface is administratively up
pub const IFF_UP: u32 = 0x1;
/// Interface has resources allocated and is operational
pub const IFF_RUNNING: u32 = 0x40;

/// Interface name, NUL terminated
pub const IFLA_IFNAME: u16 = 3;
/// RFC 2863 operational state, one byte
pub const IFLA_OPERSTATE: u16 = 16;
/// Carrier present, u32
pub const IFLA_CARRIER: u16 = 33;
/// Highest IFLA_* code kept in the attribute table
pub const IFLA_MAX: u16 = 65;

/// Which link message variant produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMessageKind {
    /// RTM_NEWLINK
    New,
    /// RTM_DELLINK
    Delete,
    /// RTM_GETLINK
    Get,
}

impl LinkMessageKind {
    /// Classify a netlink message type, `None` for non-link messages
    pub fn from_message_type(message_type: u16) -> Option<Self> {
        match message_type {
            RTM_NEWLINK => Some(Self::New),
            RTM_DELLINK => Some(Self::Delete),
            RTM_GETLINK => Some(Self::Get),
            _ => None,
        }
    }

    /// Netlink message type code
    pub fn message_type(&self) -> u16 {
        match self {
            Self::New => RTM_NEWLINK,
            Self::Delete => RTM_DELLINK,
            Self::Get => RTM_GETLINK,
        }
    }
}

/// Administrative state from IFF_UP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminState {
    Up,
    Down,
}

impl AdminState {
    pub fn from_flags(flags: u32) -> Self {
        if flags & IFF_UP != 0 {
            Self::Up
        } else {
            Self::Down
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

/// Running state from IFF_RUNNING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    NotRunning,
}

impl RunState {
    pub fn from_flags(flags: u32) -> Self {
        if flags & IFF_RUNNING != 0 {
            Self::Running
        } else {
            Self::NotRunning
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::NotRunning => "NOT RUNNING",
        }
    }
}

/// Operational state (`IF_OPER_*`, RFC 2863)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperState {
    Unknown,
    NotPresent,
    Down,
    LowerLayerDown,
    Testing,
    Dormant,
    Up,
    /// Code the kernel ABI does not define (yet)
    Other(u8),
}

impl OperState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Unknown,
            1 => Self::NotPresent,
            2 => Self::Down,
            3 => Self::LowerLayerDown,
            4 => Self::Testing,
            5 => Self::Dormant,
            6 => Self::Up,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::NotPresent => 1,
            Self::Down => 2,
            Self::LowerLayerDown => 3,
            Self::Testing => 4,
            Self::Dormant => 5,
            Self::Up => 6,
            Self::Other(code) => *code,
        }
    }
}

impl fmt::Display for OperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "UNKNOWN",
            Self::NotPresent => "NOTPRESENT",
            Self::Down => "DOWN",
            Self::LowerLayerDown => "LOWERLAYERDOWN",
            Self::Testing => "TESTING",
            Self::Dormant => "DORMANT",
            Self::Up => "UP",
            Self::Other(code) => return write!(f, "{}", code),
        };
        f.write_str(name)
    }
}

/// Attributes every link event is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedAttribute {
    IfName,
    Carrier,
    OperState,
}

impl ExpectedAttribute {
    /// Kernel name of the attribute
    pub fn name(&self) -> &'static str {
        match self {
            Self::IfName => "IFLA_IFNAME",
            Self::Carrier => "IFLA_CARRIER",
            Self::OperState => "IFLA_OPERSTATE",
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::IfName => IFLA_IFNAME,
            Self::Carrier => IFLA_CARRIER,
            Self::OperState => IFLA_OPERSTATE,
        }
    }
}

/// Link message could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkDecodeError {
    /// Payload cannot hold `struct ifinfomsg`
    #[error("link message payload of {len} bytes is shorter than ifinfomsg")]
    TooShort { len: usize },

    /// Message type is not RTM_{NEW,DEL,GET}LINK
    #[error("message type {0} is not a link message")]
    NotLinkMessage(u16),
}

/// Fixed `struct ifinfomsg` header of a link message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfoHeader {
    /// `ifi_family`
    pub family: u8,
    /// `ifi_type` (ARPHRD_*)
    pub device_type: u16,
    /// `ifi_index`
    pub index: i32,
    /// `ifi_flags` (IFF_*)
    pub flags: u32,
    /// `ifi_change` mask
    pub change: u32,
}

impl LinkInfoHeader {
    /// Read the header from the start of a link message payload
    pub fn parse(payload: &[u8]) -> Result<Self, LinkDecodeError> {
        if payload.len() < IFINFOMSG_LEN {
            return Err(LinkDecodeError::TooShort { len: payload.len() });
        }

        Ok(Self {
            family: payload[0],
            device_type: read_u16(payload, 2),
            index: read_u32(payload, 4) as i32,
            flags: read_u32(payload, 8),
            change: read_u32(payload, 12),
        })
    }
}

/// Decoded state of one interface as reported by a link message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceLinkEvent {
    pub kind: LinkMessageKind,
    pub index: i32,
    pub name: Option<String>,
    pub carrier: Option<u32>,
    /// Raw IFLA_OPERSTATE code
    pub operstate: Option<u8>,
    pub admin_state: AdminState,
    pub run_state: RunState,
    pub device_type: u16,
    pub flags: u32,
    pub change: u32,
}

impl InterfaceLinkEvent {
    /// Build an event from a decoded header and attribute table
    pub fn from_parts(
        kind: LinkMessageKind,
        header: &LinkInfoHeader,
        attrs: &AttributeTable<'_>,
    ) -> Self {
        Self {
            kind,
            index: header.index,
            name: attrs.get(IFLA_IFNAME).map(|a| a.as_str().into_owned()),
            carrier: attrs.get(IFLA_CARRIER).and_then(|a| a.as_u32()),
            operstate: attrs.get(IFLA_OPERSTATE).and_then(|a| a.as_u8()),
            admin_state: AdminState::from_flags(header.flags),
            run_state: RunState::from_flags(header.flags),
            device_type: header.device_type,
            flags: header.flags,
            change: header.change,
        }
    }

    /// Symbolic operational state
    pub fn oper_state(&self) -> Option<OperState> {
        self.operstate.map(OperState::from_code)
    }

    /// Expected attributes absent from the message, in reporting order
    pub fn missing_attributes(&self) -> Vec<ExpectedAttribute> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push(ExpectedAttribute::IfName);
        }
        if self.carrier.is_none() {
            missing.push(ExpectedAttribute::Carrier);
        }
        if self.operstate.is_none() {
            missing.push(ExpectedAttribute::OperState);
        }
        missing
    }
}

/// Extract an interface event from a link message
///
/// Attributes are decoded from the payload that follows `ifinfomsg`, bounded
/// by the message's own declared length.
pub fn extract_link_event(msg: &RawMessage<'_>) -> Result<InterfaceLinkEvent, LinkDecodeError> {
    let kind = LinkMessageKind::from_message_type(msg.message_type)
        .ok_or(LinkDecodeError::NotLinkMessage(msg.message_type))?;
    let header = LinkInfoHeader::parse(msg.payload)?;
    let attrs = AttributeTable::parse(&msg.payload[IFINFOMSG_LEN..], IFLA_MAX);

    Ok(InterfaceLinkEvent::from_parts(kind, &header, &attrs))
}
