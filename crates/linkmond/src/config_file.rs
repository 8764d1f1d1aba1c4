//! Configuration file support for linkmond
//!
//! Loads and validates linkmond configuration from TOML files.
//! Default location: /etc/linkmond/linkmond.toml, overridable with the
//! `LINKMOND_CONFIG` environment variable. A missing file means defaults.

use crate::error::{LinkmonError, Result};
use crate::message::NLMSG_HDRLEN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/linkmond/linkmond.toml";

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "LINKMOND_CONFIG";

/// rtnetlink multicast group bits (RTMGRP_*)
pub const RTMGRP_LINK: u32 = 0x1;
pub const RTMGRP_IPV4_IFADDR: u32 = 0x10;
pub const RTMGRP_IPV4_ROUTE: u32 = 0x40;

/// Receive loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Receive timeout in milliseconds; bounds how long a cycle blocks
    #[serde(default = "default_recv_timeout")]
    pub recv_timeout_ms: u64,

    /// Size of the receive buffer reused by every cycle
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// Multicast groups to subscribe to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Link state changes
    #[serde(default = "default_true")]
    pub link: bool,

    /// IPv4 address changes
    #[serde(default = "default_true")]
    pub ipv4_ifaddr: bool,

    /// IPv4 route changes
    #[serde(default = "default_true")]
    pub ipv4_route: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete linkmond configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkmonConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub groups: GroupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_recv_timeout() -> u64 {
    250
}

fn default_buffer_size() -> usize {
    8192
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            recv_timeout_ms: default_recv_timeout(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            link: true,
            ipv4_ifaddr: true,
            ipv4_route: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl GroupConfig {
    /// Multicast group mask for binding
    pub fn mask(&self) -> u32 {
        let mut groups = 0;
        if self.link {
            groups |= RTMGRP_LINK;
        }
        if self.ipv4_ifaddr {
            groups |= RTMGRP_IPV4_IFADDR;
        }
        if self.ipv4_route {
            groups |= RTMGRP_IPV4_ROUTE;
        }
        groups
    }
}

impl LinkmonConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str(&content).map_err(|e| {
                    LinkmonError::Configuration(format!(
                        "Failed to parse config file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(LinkmonError::Io(e)),
        }
    }

    /// Load from `LINKMOND_CONFIG` or the default location, then validate
    pub fn load() -> Result<Self> {
        let config = Self::load_or_default(Self::path_from_env())?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration path the daemon reads
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Get receive timeout as Duration
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.monitor.recv_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.monitor.recv_timeout_ms == 0 {
            // A zero SO_RCVTIMEO blocks forever and removes the wake points
            return Err(LinkmonError::Configuration(
                "recv_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.monitor.buffer_size < NLMSG_HDRLEN {
            return Err(LinkmonError::Configuration(format!(
                "buffer_size must be at least {} bytes",
                NLMSG_HDRLEN
            )));
        }

        if self.groups.mask() == 0 {
            return Err(LinkmonError::Configuration(
                "at least one multicast group must be enabled".to_string(),
            ));
        }

        Ok(())
    }
}
