//! Receive loop driving the decode pipeline
//!
//! The monitor owns the subscription source, the line sink and a single
//! zero-initialised receive buffer reused by every cycle. Each cycle blocks
//! for at most the source's receive timeout, then frames the bytes the
//! source reported, decodes each message and renders the result. Nothing
//! decoded from the buffer outlives the cycle that received it.

use crate::message::frame_messages;
use crate::render::{LineSink, Report, render};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, trace, warn};

/// Result of one receive call on a [`DatagramSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reception {
    /// First `len` bytes of the buffer hold a datagram from a netlink sender
    Datagram { len: usize },
    /// Receive timeout expired with nothing to read
    TimedOut,
    /// Receive was interrupted before any data arrived
    Interrupted,
    /// `len` bytes arrived but the sender address was not a netlink address
    AddressMismatch { len: usize },
}

/// Datagram-oriented event subscription
pub trait DatagramSource {
    /// Receive one datagram into `buf`
    ///
    /// Implementations write at most `buf.len()` bytes and report how many
    /// in the returned [`Reception`]. Errors are receive failures other than
    /// timeout and interruption.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Reception>;
}

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Waiting,
    Processing,
}

/// What one cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    TimedOut,
    Interrupted,
    ReceiveFailed,
    Discarded,
    Processed { messages: usize },
}

/// Running totals since the monitor started
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub datagrams: u64,
    pub messages: u64,
    pub link_events: u64,
    pub unhandled: u64,
    pub invalid_messages: u64,
    pub framing_errors: u64,
    pub receive_errors: u64,
    pub discarded: u64,
}

impl MonitorStats {
    fn record(&mut self, report: &Report) {
        match report {
            Report::Link(_) => self.link_events += 1,
            Report::Unhandled { .. } => self.unhandled += 1,
            Report::InvalidLength { .. } => self.invalid_messages += 1,
        }
    }
}

/// Frame, decode and render every message of one datagram
///
/// Returns the number of messages framed. A framing error is rendered and
/// ends processing of this datagram.
pub fn process_datagram(
    datagram: &[u8],
    sink: &mut dyn LineSink,
    stats: &mut MonitorStats,
) -> usize {
    let mut framed = 0;

    for result in frame_messages(datagram) {
        let report = match result {
            Ok(msg) => {
                framed += 1;
                trace!(
                    message_type = msg.message_type,
                    len = msg.len(),
                    sequence = msg.sequence,
                    "Framed message"
                );
                let report = Report::from_message(&msg);
                stats.record(&report);
                report
            }
            Err(err) => {
                warn!(error = %err, "Dropping rest of datagram");
                stats.framing_errors += 1;
                Report::from(err)
            }
        };

        if let Err(e) = render(&report, sink) {
            warn!(error = %e, "Failed to write report");
        }
    }

    stats.messages += framed as u64;
    framed
}

/// Single-threaded link event monitor
pub struct Monitor<S, K> {
    source: S,
    sink: K,
    buffer: Vec<u8>,
    state: MonitorState,
    stats: MonitorStats,
}

impl<S: DatagramSource, K: LineSink> Monitor<S, K> {
    /// Create a monitor with a receive buffer of `buffer_size` bytes
    pub fn new(source: S, sink: K, buffer_size: usize) -> Self {
        Self {
            source,
            sink,
            buffer: vec![0; buffer_size],
            state: MonitorState::Waiting,
            stats: MonitorStats::default(),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Run one receive cycle and return to waiting
    pub fn poll_once(&mut self) -> CycleOutcome {
        let reception = match self.source.receive(&mut self.buffer) {
            Ok(reception) => reception,
            Err(e) => {
                warn!(error = %e, "Netlink receive failed");
                self.stats.receive_errors += 1;
                return CycleOutcome::ReceiveFailed;
            }
        };

        match reception {
            Reception::TimedOut => CycleOutcome::TimedOut,
            Reception::Interrupted => CycleOutcome::Interrupted,
            Reception::AddressMismatch { len } => {
                warn!(bytes = len, "Sender is not a netlink address, discarding datagram");
                self.stats.discarded += 1;
                CycleOutcome::Discarded
            }
            Reception::Datagram { len } => {
                self.state = MonitorState::Processing;
                self.stats.datagrams += 1;
                let datagram = &self.buffer[..len.min(self.buffer.len())];
                let messages = process_datagram(datagram, &mut self.sink, &mut self.stats);
                debug!(bytes = datagram.len(), messages, "Processed datagram");
                self.state = MonitorState::Waiting;
                CycleOutcome::Processed { messages }
            }
        }
    }

    /// Receive until `shutdown` is set
    ///
    /// The flag is checked between cycles; the receive timeout bounds how
    /// long a set flag goes unnoticed.
    pub fn run(&mut self, shutdown: &AtomicBool) -> &MonitorStats {
        info!("Listening for link events");

        while !shutdown.load(Ordering::Acquire) {
            self.poll_once();
        }

        info!(
            datagrams = self.stats.datagrams,
            messages = self.stats.messages,
            link_events = self.stats.link_events,
            unhandled = self.stats.unhandled,
            invalid_messages = self.stats.invalid_messages,
            framing_errors = self.stats.framing_errors,
            receive_errors = self.stats.receive_errors,
            discarded = self.stats.discarded,
            "Monitor loop stopped"
        );
        &self.stats
    }
}
