//! Metrics registry
//!
//! The `/metrics` endpoint only lists metric names; values are not exposed.

use std::sync::RwLock;

use crate::error::ProviderError;

/// Source of known metric names
pub trait MetricsRegistry: Send + Sync {
    /// Names in registry order
    fn metric_names(&self) -> Result<Vec<String>, ProviderError>;
}

/// In-memory registry keeping names in registration order, without duplicates
#[derive(Debug, Default)]
pub struct SimpleMetricsRegistry {
    names: RwLock<Vec<String>>,
}

impl SimpleMetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::new();
        for name in names {
            registry.register(name);
        }
        registry
    }

    /// Returns false when the name was already known
    pub fn register(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        let mut names = self
            .names
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if names.contains(&name) {
            return false;
        }
        names.push(name);
        true
    }
}

impl MetricsRegistry for SimpleMetricsRegistry {
    fn metric_names(&self) -> Result<Vec<String>, ProviderError> {
        self.names
            .read()
            .map(|names| names.clone())
            .map_err(|_| ProviderError::new("metrics registry lock poisoned"))
    }
}
