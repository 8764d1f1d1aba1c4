//! Link Monitor Daemon
//!
//! Decodes kernel rtnetlink multicast traffic into interface link events.
//! Each received datagram is framed into netlink messages; RTM_NEWLINK,
//! RTM_DELLINK and RTM_GETLINK messages are decoded into
//! [`InterfaceLinkEvent`]s and every message is rendered as a text line.
//! Datagrams are decoded independently; no interface state is kept.

pub mod attributes;
pub mod config_file;
pub mod error;
pub mod link;
pub mod message;
pub mod monitor;
pub mod netlink_socket;
pub mod render;

pub use attributes::{Attribute, AttributeTable};
pub use config_file::{GroupConfig, LinkmonConfig, LoggingConfig, MonitorConfig};
pub use error::*;
pub use link::{
    AdminState, ExpectedAttribute, InterfaceLinkEvent, LinkDecodeError, LinkInfoHeader,
    LinkMessageKind, OperState, RunState, extract_link_event,
};
pub use message::{FramingError, MessageFramer, RawMessage, frame_messages};
pub use monitor::{
    CycleOutcome, DatagramSource, Monitor, MonitorState, MonitorStats, Reception,
    process_datagram,
};
pub use netlink_socket::NetlinkSocket;
pub use render::{LineSink, Report, WriterSink, render};
