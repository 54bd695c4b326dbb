//! Error types
//!
//! Startup failures are fatal and surface from `ActuatorServer::start`.
//! Provider failures abort the single request that triggered them.

use std::net::SocketAddr;
use thiserror::Error;

/// Fatal errors raised while bringing the server up
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to register listener with the runtime: {0}")]
    Listener(#[source] std::io::Error),

    #[error("failed to build runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn server thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    #[error("server.workers must be at least 1, got {0}")]
    InvalidWorkers(usize),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Failure reported by a health, metrics or environment provider
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Errors that abort a request instead of producing a response
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{endpoint} provider failed: {source}")]
    Provider {
        endpoint: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("failed to serialize {endpoint} response: {source}")]
    Serialize {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The blocking task running the provider was cancelled or panicked
    #[error("provider task for {path} did not complete: {source}")]
    Aborted {
        path: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
