//! Configuration for on-demand provisioning.

use exertion_types::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for provisioning deployments before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Whether provisionable exertions get their deployments deployed.
    ///
    /// When disabled, deployment arguments are ignored and dispatch relies
    /// on providers already being registered.
    pub enabled: bool,

    /// Longest a deploy may take.
    ///
    /// A deploy that returns after this is undeployed again and reported as
    /// failed, since dispatch has already waited past its budget.
    #[serde(rename = "deploy_timeout_ms", with = "duration::millis")]
    pub deploy_timeout: Duration,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            deploy_timeout: Duration::from_secs(30),
        }
    }
}

impl ProvisionConfig {
    /// Create a config with a custom deploy timeout.
    pub fn with_deploy_timeout(deploy_timeout: Duration) -> Self {
        Self {
            deploy_timeout,
            ..Default::default()
        }
    }

    /// Create a config with provisioning disabled.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}
