//! Actuator data providers
//!
//! The server never computes health, metrics or environment data itself; it
//! queries the providers bundled in [`Providers`] on every request.

pub mod env;
pub mod health;
pub mod metrics;

use std::sync::Arc;

pub use env::{
    EnvironmentSnapshot, EnvironmentSource, ProcessEnvironment, PropertySource, PropertyValue,
};
pub use health::{Health, HealthIndicator, PingHealthIndicator, Status};
pub use metrics::{MetricsRegistry, SimpleMetricsRegistry};

/// Read-only set of providers injected at construction
///
/// Health slots may be empty. An empty slot is positional information and is
/// reported as `null` at the same index of the `/health` array.
#[derive(Clone)]
pub struct Providers {
    pub health: Vec<Option<Arc<dyn HealthIndicator>>>,
    pub metrics: Arc<dyn MetricsRegistry>,
    pub environment: Arc<dyn EnvironmentSource>,
}

impl Providers {
    pub fn new(metrics: Arc<dyn MetricsRegistry>, environment: Arc<dyn EnvironmentSource>) -> Self {
        Self {
            health: Vec::new(),
            metrics,
            environment,
        }
    }

    #[must_use]
    pub fn with_health(mut self, indicator: Arc<dyn HealthIndicator>) -> Self {
        self.health.push(Some(indicator));
        self
    }

    /// Append a slot that may be empty
    #[must_use]
    pub fn with_health_slot(mut self, indicator: Option<Arc<dyn HealthIndicator>>) -> Self {
        self.health.push(indicator);
        self
    }
}

impl Default for Providers {
    /// No health indicators, an empty metrics registry and the process environment
    fn default() -> Self {
        Self::new(
            Arc::new(SimpleMetricsRegistry::new()),
            Arc::new(ProcessEnvironment::default()),
        )
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("health_slots", &self.health.len())
            .finish_non_exhaustive()
    }
}
