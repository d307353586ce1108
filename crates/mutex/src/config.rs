//! Configuration for mutual exclusion.

use exertion_types::duration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for lock acquisition around exclusive providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    /// How long a lock request waits for a held lock.
    ///
    /// `None` waits until the lock is granted or the manager denies it.
    /// A request that times out is treated as denied.
    #[serde(rename = "lock_wait_timeout_ms", with = "duration::opt_millis")]
    pub lock_wait_timeout: Option<Duration>,

    /// Name the lock manager registers under. `None` accepts any.
    pub lock_manager_name: Option<String>,
}

impl MutexConfig {
    /// Create a config with a lock wait timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            lock_wait_timeout: Some(timeout),
            ..Default::default()
        }
    }
}
