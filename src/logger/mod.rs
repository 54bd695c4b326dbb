//! Logger module
//!
//! Provides logging utilities for the actuator server including:
//! - `tracing` subscriber setup
//! - Server lifecycle logging
//! - Access logging with multiple formats

mod format;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Target used for access log lines so they can be filtered separately
pub const ACCESS_TARGET: &str = "access";

/// Initialize the global `tracing` subscriber
///
/// `RUST_LOG` wins over `logging.level` when set. Calling this twice is harmless;
/// the second subscriber is ignored.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        address = %addr,
        grace_period_secs = config.shutdown.grace_period_secs,
        "Starting actuator server at port {}",
        addr.port()
    );
    tracing::info!("  - GET http://{addr}/actuator/health");
    tracing::info!("  - GET http://{addr}/actuator/metrics");
    tracing::info!("  - GET http://{addr}/actuator/env");
    match config.server.workers {
        Some(workers) => tracing::info!("Using {workers} worker threads"),
        None => tracing::info!("Using default worker threads (CPU cores)"),
    }
}

pub fn log_server_disabled() {
    tracing::info!("Actuator server disabled (actuator.enabled = false)");
}

pub fn log_server_stopping(grace: Duration) {
    tracing::info!(grace_period = ?grace, "Stopping server ...");
}

pub fn log_server_stopped() {
    tracing::info!("Actuator server stopped");
}

pub fn log_drain_timeout(remaining: usize) {
    tracing::warn!(
        remaining,
        "Grace period elapsed, dropping in-flight connections"
    );
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "Accepted connection");
}

pub fn log_connection_error(err: &hyper::Error) {
    tracing::warn!(error = %err, "Failed to serve connection");
}

pub fn log_keep_alive_expired(peer_addr: &SocketAddr) {
    tracing::debug!(peer = %peer_addr, "Closing idle keep-alive connection");
}

pub fn log_accept_error(err: &std::io::Error) {
    tracing::error!(error = %err, "Failed to accept connection");
}

pub fn log_dispatch_error(path: &str, err: &crate::error::DispatchError) {
    tracing::error!(path, error = %err, "Request aborted");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
