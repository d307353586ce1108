//! Configuration for the dispatch shell.

use exertion_mutex::MutexConfig;
use exertion_provisions::ProvisionConfig;
use exertion_registry::RegistryConfig;
use serde::{Deserialize, Serialize};

/// Configuration for [`ExertProcessor`](crate::ExertProcessor).
///
/// Aggregates the configuration of every coordinator the shell drives.
/// Loads from TOML with one table per coordinator:
///
/// ```toml
/// spacer_fallback = true
///
/// [registry]
/// discovery_wait_ms = 500
///
/// [mutex]
/// lock_wait_timeout_ms = 2000
///
/// [provision]
/// enabled = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub registry: RegistryConfig,
    pub mutex: MutexConfig,
    pub provision: ProvisionConfig,

    /// Retry resolution against a Spacer when a pull-access exertion
    /// finds no provider.
    pub spacer_fallback: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            mutex: MutexConfig::default(),
            provision: ProvisionConfig::default(),
            spacer_fallback: true,
        }
    }
}

impl DispatchConfig {
    /// Set the registry configuration.
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the mutual-exclusion configuration.
    pub fn with_mutex(mut self, mutex: MutexConfig) -> Self {
        self.mutex = mutex;
        self
    }

    /// Set the provisioning configuration.
    pub fn with_provision(mut self, provision: ProvisionConfig) -> Self {
        self.provision = provision;
        self
    }

    /// Disable the Spacer fallback for pull access.
    pub fn without_spacer_fallback(mut self) -> Self {
        self.spacer_fallback = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_toml_is_default() {
        let config: DispatchConfig = toml::from_str("").unwrap();
        assert!(config.spacer_fallback);
        assert!(config.registry.use_cataloger);
        assert!(config.mutex.lock_wait_timeout.is_none());
        assert!(config.provision.enabled);
    }

    #[test]
    fn test_nested_tables() {
        let config: DispatchConfig = toml::from_str(
            r#"
            spacer_fallback = false

            [registry]
            discovery_wait_ms = 250
            use_cataloger = false

            [mutex]
            lock_wait_timeout_ms = 2000
            lock_manager_name = "locks"

            [provision]
            deploy_timeout_ms = 100
            "#,
        )
        .unwrap();

        assert!(!config.spacer_fallback);
        assert_eq!(config.registry.discovery_wait, Duration::from_millis(250));
        assert!(!config.registry.use_cataloger);
        assert_eq!(config.registry.max_matches, 1);
        assert_eq!(config.mutex.lock_wait_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.mutex.lock_manager_name.as_deref(), Some("locks"));
        assert_eq!(config.provision.deploy_timeout, Duration::from_millis(100));
    }
}
