//! Errors that escape the mutual-exclusion coordinator.

use exertion_core::{RemoteError, TransactionError};
use thiserror::Error;

/// Fatal failures around an exclusive invocation.
///
/// Lock denial and lock-manager failures are not errors: they are recorded
/// on the exertion.
#[derive(Debug, Error)]
pub enum MutexError {
    /// Beginning, committing or aborting the lock transaction failed.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// The provider call failed in transport.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
