//! Lock requests exchanged with a lock manager.

use exertion_types::{ExertionId, ProviderId, TxnId};
use std::fmt;
use std::time::Duration;

/// Resource guarded by a mutual-exclusion lock: one provider of one service type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey {
    pub service_type: String,
    pub provider_id: ProviderId,
}

impl LockKey {
    pub fn new(service_type: impl Into<String>, provider_id: ProviderId) -> Self {
        Self {
            service_type: service_type.into(),
            provider_id,
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_type, self.provider_id)
    }
}

/// A transaction-scoped lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRequest {
    pub key: LockKey,
    /// Exertion asking for the lock.
    pub owner: ExertionId,
    /// Transaction the grant is scoped to; released on its commit or abort.
    pub txn: TxnId,
    /// How long to wait for a held lock. `None` waits until granted or denied.
    pub wait: Option<Duration>,
}

/// Outcome of a lock request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockResult {
    pub succeeded: bool,
    pub reason: Option<String>,
}

impl LockResult {
    pub fn granted() -> Self {
        Self {
            succeeded: true,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            reason: Some(reason.into()),
        }
    }
}
