//! Environment snapshots
//!
//! The `/env` endpoint dumps every property source without filtering.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::ProviderError;

/// Full environment at the time of the request
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub active_profiles: Vec<String>,
    pub property_sources: Vec<PropertySource>,
}

/// Named group of properties, e.g. process environment variables
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySource {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyValue {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl PropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(
            key.into(),
            PropertyValue {
                value: value.into(),
                origin: None,
            },
        );
        self
    }

    /// Variables of the current process, each with `System Environment Property` origin
    pub fn system_environment() -> Self {
        let properties = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    PropertyValue {
                        value: Value::String(value.to_string_lossy().into_owned()),
                        origin: Some(format!(
                            "System Environment Property \"{}\"",
                            key.to_string_lossy()
                        )),
                    },
                )
            })
            .collect();

        Self {
            name: "systemEnvironment".to_string(),
            properties,
        }
    }

    /// Flatten any serializable settings into dotted keys (`server.port`, ...)
    pub fn from_serializable<T: Serialize>(
        name: impl Into<String>,
        settings: &T,
    ) -> Result<Self, ProviderError> {
        let value = serde_json::to_value(settings)
            .map_err(|e| ProviderError::with_source("failed to capture settings", e))?;

        let mut properties = BTreeMap::new();
        flatten_into(&mut properties, String::new(), value);

        Ok(Self {
            name: name.into(),
            properties,
        })
    }
}

fn flatten_into(out: &mut BTreeMap<String, PropertyValue>, prefix: String, value: Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, key, nested);
            }
        }
        leaf => {
            out.insert(
                prefix,
                PropertyValue {
                    value: leaf,
                    origin: None,
                },
            );
        }
    }
}

/// Produces a snapshot of the environment
pub trait EnvironmentSource: Send + Sync {
    fn snapshot(&self) -> Result<EnvironmentSnapshot, ProviderError>;
}

/// Process environment plus any fixed sources captured at startup
///
/// Environment variables are read on every snapshot, so changes made while
/// the process runs are visible.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnvironment {
    profiles: Vec<String>,
    static_sources: Vec<PropertySource>,
}

impl ProcessEnvironment {
    pub fn new(profiles: Vec<String>) -> Self {
        Self {
            profiles,
            static_sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: PropertySource) -> Self {
        self.static_sources.push(source);
        self
    }
}

impl EnvironmentSource for ProcessEnvironment {
    fn snapshot(&self) -> Result<EnvironmentSnapshot, ProviderError> {
        let mut property_sources = Vec::with_capacity(self.static_sources.len() + 1);
        property_sources.push(PropertySource::system_environment());
        property_sources.extend(self.static_sources.iter().cloned());

        Ok(EnvironmentSnapshot {
            active_profiles: self.profiles.clone(),
            property_sources,
        })
    }
}
