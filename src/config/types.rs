// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub actuator: ActuatorConfig,
    pub shutdown: ShutdownConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Gate for the whole component
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ActuatorConfig {
    pub enabled: bool,
    /// Reported as `activeProfiles` by the `/env` endpoint
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// Shutdown behaviour
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShutdownConfig {
    /// Time in-flight connections get to finish once `stop()` is called
    pub grace_period_secs: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Per-connection timeouts, in seconds
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    /// Idle time between requests before the connection is closed; 0 disables keep-alive
    pub keep_alive_timeout: u64,
    /// Time allowed to receive a request head, counted from when the connection starts waiting
    pub read_timeout: u64,
}
