//! Kernel netlink socket for rtnetlink multicast events
//!
//! This module provides the NETLINK_ROUTE subscription the monitor reads
//! from on Linux. The socket is bound to the configured RTMGRP_* groups and
//! carries an SO_RCVTIMEO so every receive returns within the timeout.
//! On non-Linux platforms (macOS, etc.), uses a mock implementation for development.

use crate::error::Result;
use crate::monitor::{DatagramSource, Reception};
use std::io;
use std::time::Duration;

#[cfg(target_os = "linux")]
mod linux {
    use super::*;
    use crate::error::LinkmonError;
    use netlink_sys::{Socket, SocketAddr, protocols::NETLINK_ROUTE};
    use nix::errno::Errno;
    use nix::sys::socket::{NetlinkAddr, recvfrom, setsockopt, sockopt};
    use nix::sys::time::{TimeVal, TimeValLike};
    use std::os::fd::AsRawFd;
    use tracing::{debug, instrument};

    /// Netlink socket subscribed to rtnetlink multicast groups
    pub struct NetlinkSocket {
        socket: Socket,
        groups: u32,
    }

    impl NetlinkSocket {
        /// Create, configure and bind the subscription socket
        ///
        /// Any failure here is a setup failure; the caller is expected to
        /// give up rather than retry.
        #[instrument]
        pub fn subscribe(groups: u32, recv_timeout: Duration) -> Result<Self> {
            let mut socket = Socket::new(NETLINK_ROUTE)
                .map_err(|e| LinkmonError::Netlink(format!("Failed to create socket: {}", e)))?;

            let timeout = TimeVal::microseconds(recv_timeout.as_micros() as i64);
            setsockopt(&socket, sockopt::ReceiveTimeout, &timeout).map_err(|e| {
                LinkmonError::Netlink(format!("Failed to set SO_RCVTIMEO: {}", e))
            })?;
            debug!(timeout = %timeout, "Set socket receive timeout");

            // Port id 0 lets the kernel assign one
            let addr = SocketAddr::new(0, groups);
            socket
                .bind(&addr)
                .map_err(|e| LinkmonError::Netlink(format!("Failed to bind socket: {}", e)))?;

            debug!(groups, "Netlink socket bound to rtnetlink groups");

            Ok(Self { socket, groups })
        }

        /// Multicast groups the socket is bound to
        pub fn groups(&self) -> u32 {
            self.groups
        }
    }

    impl DatagramSource for NetlinkSocket {
        fn receive(&mut self, buf: &mut [u8]) -> io::Result<Reception> {
            match recvfrom::<NetlinkAddr>(self.socket.as_raw_fd(), buf) {
                Ok((len, Some(_sender))) => Ok(Reception::Datagram { len }),
                // Sender address rejected: wrong length or not AF_NETLINK
                Ok((len, None)) => Ok(Reception::AddressMismatch { len }),
                // SO_RCVTIMEO expiry reports EAGAIN (== EWOULDBLOCK)
                Err(Errno::EAGAIN) => Ok(Reception::TimedOut),
                Err(Errno::EINTR) => Ok(Reception::Interrupted),
                Err(errno) => Err(io::Error::from(errno)),
            }
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux::*;

/// Mock implementation for non-Linux platforms (development only)
#[cfg(not(target_os = "linux"))]
mod mock {
    use super::*;
    use tracing::warn;

    pub struct NetlinkSocket {
        groups: u32,
        recv_timeout: Duration,
    }

    impl NetlinkSocket {
        pub fn subscribe(groups: u32, recv_timeout: Duration) -> Result<Self> {
            warn!("Netlink is unavailable on this platform, no events will arrive");
            Ok(Self {
                groups,
                recv_timeout,
            })
        }

        pub fn groups(&self) -> u32 {
            self.groups
        }
    }

    impl DatagramSource for NetlinkSocket {
        fn receive(&mut self, _buf: &mut [u8]) -> io::Result<Reception> {
            std::thread::sleep(self.recv_timeout);
            Ok(Reception::TimedOut)
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub use mock::*;
