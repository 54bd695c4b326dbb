//! Health indicators
//!
//! A health indicator reports the state of one subsystem. The `/health`
//! endpoint asks every registered indicator in order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProviderError;

/// Subsystem status, serialized as `UP`, `DOWN`, `OUT_OF_SERVICE` or `UNKNOWN`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Up,
    Down,
    OutOfService,
    Unknown,
}

/// Result of one health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl Health {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            details: Map::new(),
        }
    }

    pub fn up() -> Self {
        Self::new(Status::Up)
    }

    pub fn down() -> Self {
        Self::new(Status::Down)
    }

    pub fn unknown() -> Self {
        Self::new(Status::Unknown)
    }

    pub fn out_of_service() -> Self {
        Self::new(Status::OutOfService)
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Computes the current health of a subsystem
pub trait HealthIndicator: Send + Sync {
    fn health(&self) -> Result<Health, ProviderError>;
}

impl<F> HealthIndicator for F
where
    F: Fn() -> Result<Health, ProviderError> + Send + Sync,
{
    fn health(&self) -> Result<Health, ProviderError> {
        self()
    }
}

/// Always reports `UP`; proves the process can answer requests
#[derive(Debug, Default, Clone, Copy)]
pub struct PingHealthIndicator;

impl HealthIndicator for PingHealthIndicator {
    fn health(&self) -> Result<Health, ProviderError> {
        Ok(Health::up())
    }
}
