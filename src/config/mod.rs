// Configuration module entry point
// Loads settings from an optional TOML file, environment overrides and defaults

mod types;

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};

use crate::error::ServerError;

// Re-export public types
pub use types::{
    ActuatorConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig, ShutdownConfig,
};

/// Prefix for environment overrides, e.g. `ACTUATOR_SERVER__PORT=9090`
const ENV_PREFIX: &str = "ACTUATOR";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error; defaults apply
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from an in-memory TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        with_defaults()?
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse().map_err(|_| ServerError::InvalidAddress(addr))
    }

    /// Runtime worker count; `None` leaves the choice to Tokio
    pub fn worker_threads(&self) -> Result<Option<NonZeroUsize>, ServerError> {
        self.server
            .workers
            .map(|workers| NonZeroUsize::new(workers).ok_or(ServerError::InvalidWorkers(workers)))
            .transpose()
    }

    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown.grace_period_secs)
    }

    /// Time a client gets to send a complete request head
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.performance.read_timeout)
    }

    /// Idle time allowed between requests on one connection, `None` disables keep-alive
    pub const fn keep_alive_timeout(&self) -> Option<Duration> {
        match self.performance.keep_alive_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                workers: None,
            },
            actuator: ActuatorConfig::default(),
            shutdown: ShutdownConfig {
                grace_period_secs: 3,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: true,
                access_log_format: "combined".to_string(),
            },
            performance: PerformanceConfig {
                keep_alive_timeout: 15,
                read_timeout: 30,
            },
        }
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("actuator.enabled", false)?
        .set_default("actuator.profiles", Vec::<String>::new())?
        .set_default("shutdown.grace_period_secs", 3)?
        .set_default("logging.level", "info")?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive_timeout", 15)?
        .set_default("performance.read_timeout", 30)
}
