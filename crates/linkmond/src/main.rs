//! Link Monitor Daemon
//!
//! Main entry point for the linkmond daemon.
//! Subscribes to kernel rtnetlink groups and prints one line per decoded
//! message on stdout until SIGINT/SIGTERM. Logs go to stderr.

use anyhow::{Context, anyhow};
use linkmond::{LinkmonConfig, Monitor, NetlinkSocket, WriterSink};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = LinkmonConfig::load().context("Failed to load configuration")?;

    init_logging(&config.logging.level)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        groups = config.groups.mask(),
        recv_timeout_ms = config.monitor.recv_timeout_ms,
        "linkmond: Starting link monitor"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    register(SIGTERM, Arc::clone(&shutdown))?;
    register(SIGINT, Arc::clone(&shutdown))?;

    let source = NetlinkSocket::subscribe(config.groups.mask(), config.recv_timeout())
        .inspect_err(|e| error!(error = %e, "linkmond: Netlink subscription failed"))
        .context("Failed to subscribe to rtnetlink events")?;
    info!(groups = source.groups(), "linkmond: Subscribed to rtnetlink groups");

    let mut monitor = Monitor::new(source, WriterSink::stdout(), config.monitor.buffer_size);
    monitor.run(&shutdown);

    info!("linkmond: Exiting");
    Ok(())
}

/// Initialize structured logging on stderr
///
/// RUST_LOG takes precedence over the configured level.
fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level {:?}", level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("Failed to set logger: {}", e))
}
