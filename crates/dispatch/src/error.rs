//! Errors that escape `exert()`.

use exertion_core::{ProvisionError, RemoteError, TransactionError};
use exertion_mutex::MutexError;
use thiserror::Error;

/// Fatal dispatch failures.
///
/// Everything else (no provider, unselectable signature, lock denied,
/// provider-reported faults) is recorded on the returned exertion instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The exertion or its arguments cannot be dispatched.
    #[error("Exertion rejected: {0}")]
    Exertion(String),

    /// Deployments required before dispatch could not be provisioned.
    #[error("Provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// Beginning, committing or aborting a transaction failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Transport failure invoking the provider.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl From<MutexError> for DispatchError {
    fn from(err: MutexError) -> Self {
        match err {
            MutexError::Transaction(e) => DispatchError::Transaction(e),
            MutexError::Remote(e) => DispatchError::Remote(e),
        }
    }
}
