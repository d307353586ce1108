//! Dispatch arguments and deployment configuration.

use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration for deploying a provider on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    /// Name the deployed provider registers under.
    pub name: String,
    /// Service type the deployed provider implements.
    pub service_type: String,
    #[serde(default = "one")]
    pub instances: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn one() -> u32 {
    1
}

impl Deployment {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            instances: 1,
            properties: BTreeMap::new(),
        }
    }

    pub fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An argument passed alongside an exertion to `exert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// Bind `value` at `path` in the exertion's context.
    Parameter { path: String, value: Value },
    /// Target a specific provider by name.
    ProviderName(String),
    /// Deploy a provider before dispatch.
    Deployment(Deployment),
}

impl Arg {
    pub fn parameter(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Arg::Parameter {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn deployment(&self) -> Option<&Deployment> {
        match self {
            Arg::Deployment(deployment) => Some(deployment),
            _ => None,
        }
    }
}
