//! Error types for linkmond

use thiserror::Error;

/// Link monitor daemon errors
#[derive(Error, Debug)]
pub enum LinkmonError {
    /// Netlink socket setup or receive error
    #[error("Netlink error: {0}")]
    Netlink(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for linkmond operations
pub type Result<T> = std::result::Result<T, LinkmonError>;
