//! Human-readable rendering of decoded messages
//!
//! Every framed message becomes a [`Report`], and every report becomes one or
//! more text lines handed to a [`LineSink`].

use crate::link::{InterfaceLinkEvent, LinkDecodeError, extract_link_event};
use crate::message::{FramingError, RawMessage};
use std::fmt;
use std::io::{self, Write};
use tracing::debug;

/// Placeholder printed for a field whose attribute was missing
pub const ABSENT: &str = "(none)";

/// Outcome of decoding one message (or failing to frame one)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// Link message decoded into an interface event
    Link(InterfaceLinkEvent),
    /// Framed message of a type this monitor does not decode
    Unhandled { message_type: u16 },
    /// Declared length is unusable, either for framing or for the message type
    InvalidLength { declared_len: u32 },
}

impl Report {
    /// Dispatch one framed message by type
    pub fn from_message(msg: &RawMessage<'_>) -> Self {
        match extract_link_event(msg) {
            Ok(event) => Self::Link(event),
            Err(LinkDecodeError::NotLinkMessage(message_type)) => {
                Self::Unhandled { message_type }
            }
            Err(err @ LinkDecodeError::TooShort { .. }) => {
                debug!(error = %err, "Link message rejected");
                Self::InvalidLength {
                    declared_len: msg.len() as u32,
                }
            }
        }
    }

    /// Lines describing this report, in output order
    ///
    /// Missing-attribute diagnostics precede the event line they belong to.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Link(event) => {
                let mut lines: Vec<String> = event
                    .missing_attributes()
                    .iter()
                    .map(|attr| format!("{} attr not present", attr.name()))
                    .collect();
                lines.push(LinkLine(event).to_string());
                lines
            }
            Self::Unhandled { message_type } => {
                vec![format!("Unhandled message type: {}", message_type)]
            }
            Self::InvalidLength { declared_len } => {
                vec![format!("Invalid message length: {}", declared_len)]
            }
        }
    }
}

impl From<FramingError> for Report {
    fn from(err: FramingError) -> Self {
        Self::InvalidLength {
            declared_len: err.declared_len,
        }
    }
}

struct LinkLine<'a>(&'a InterfaceLinkEvent);

impl fmt::Display for LinkLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = self.0;
        write!(f, "Network interface {}", event.name.as_deref().unwrap_or(ABSENT))?;
        write!(f, ", index: {}", event.index)?;
        match event.carrier {
            Some(carrier) => write!(f, ", carrier: {}", carrier)?,
            None => write!(f, ", carrier: {}", ABSENT)?,
        }
        match event.oper_state() {
            Some(state) => write!(f, ", operstate: {}", state)?,
            None => write!(f, ", operstate: {}", ABSENT)?,
        }
        write!(
            f,
            ", state: {}, run state: {}",
            event.admin_state.as_str(),
            event.run_state.as_str()
        )
    }
}

/// Line-oriented consumer of rendered reports
pub trait LineSink {
    /// Accept one line, without trailing newline
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

impl LineSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Sink writing newline-terminated lines to any writer
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<io::Stdout> {
    /// Sink for process stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }
}

/// Write every line of `report` to `sink`
pub fn render(report: &Report, sink: &mut dyn LineSink) -> io::Result<()> {
    for line in report.lines() {
        sink.emit(&line)?;
    }
    Ok(())
}
