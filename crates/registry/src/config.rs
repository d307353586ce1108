//! Configuration for provider resolution.

use exertion_types::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the cataloger fast path and discovery fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Whether to consult a cataloger before discovery.
    pub use_cataloger: bool,

    /// Name the cataloger registers under. `None` accepts any cataloger.
    pub cataloger_name: Option<String>,

    /// Discovery keeps polling until at least this many providers match.
    pub min_matches: usize,

    /// Upper bound on items returned by a lookup.
    pub max_matches: usize,

    /// How long discovery waits for `min_matches` before giving up.
    #[serde(rename = "discovery_wait_ms", with = "duration::millis")]
    pub discovery_wait: Duration,

    /// Pause between discovery polls.
    #[serde(rename = "poll_interval_ms", with = "duration::millis")]
    pub poll_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            use_cataloger: true,
            cataloger_name: None,
            min_matches: 1,
            max_matches: 1,
            discovery_wait: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl RegistryConfig {
    /// Single-shot discovery: one lookup, no waiting.
    pub fn no_wait() -> Self {
        Self {
            discovery_wait: Duration::ZERO,
            ..Default::default()
        }
    }

    /// Set the discovery wait.
    pub fn with_discovery_wait(mut self, wait: Duration) -> Self {
        self.discovery_wait = wait;
        self
    }

    /// Set the cataloger name.
    pub fn with_cataloger_name(mut self, name: impl Into<String>) -> Self {
        self.cataloger_name = Some(name.into());
        self
    }

    /// Skip the cataloger and always use discovery.
    pub fn without_cataloger(mut self) -> Self {
        self.use_cataloger = false;
        self
    }
}
