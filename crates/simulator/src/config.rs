//! Scenario files.
//!
//! A scenario names the providers to register and the exertions to dispatch:
//!
//! ```toml
//! name = "calculator"
//! cataloger = true
//!
//! [dispatch.registry]
//! discovery_wait_ms = 0
//!
//! [[providers]]
//! name = "calc"
//! service_type = "Calculator"
//! behavior = "exclusive"
//! hold_ms = 5
//!
//! [[exertions]]
//! repeat = 4
//! concurrent = true
//! exertion = { kind = "task", name = "add", signatures = [{ service_type = "Calculator", selector = "add" }] }
//! ```

use crate::SimulatorError;
use exertion_dispatch::DispatchConfig;
use exertion_types::{Arg, Exertion};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// What a scripted provider does with the exertions it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    /// Marks the exertion done.
    #[default]
    Echo,
    /// Records a service failure.
    Fail,
    /// Records a runtime fault.
    Crash,
    /// Requires mutual exclusion and holds each call for `hold_ms`.
    Exclusive,
    /// Transport always fails.
    Unreachable,
}

/// A provider registered before the scenario runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub service_type: String,
    #[serde(default)]
    pub behavior: Behavior,
    #[serde(default)]
    pub hold_ms: u64,
}

impl ProviderSpec {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }
}

/// An exertion to dispatch, possibly several times.
#[derive(Debug, Clone, Deserialize)]
pub struct ExertionSpec {
    pub exertion: Exertion,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub args: Vec<Arg>,
    /// Number of copies to dispatch.
    #[serde(default = "one")]
    pub repeat: usize,
    /// Dispatch the copies from separate threads at once.
    #[serde(default)]
    pub concurrent: bool,
}

fn one() -> usize {
    1
}

/// A complete scenario.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    /// Serve providers through a cataloger as well as the registry.
    pub cataloger: bool,
    pub dispatch: DispatchConfig,
    pub providers: Vec<ProviderSpec>,
    pub exertions: Vec<ExertionSpec>,
}

impl ScenarioConfig {
    /// Parse a scenario from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, SimulatorError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a scenario file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimulatorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimulatorError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Total number of dispatches the scenario performs.
    pub fn total_dispatches(&self) -> usize {
        self.exertions.iter().map(|e| e.repeat).sum()
    }
}
