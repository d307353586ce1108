//! Error types reported by dispatch collaborators.

use exertion_types::TxnId;
use thiserror::Error;

/// Transport failure talking to a remote service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The remote endpoint could not be reached.
    #[error("Remote endpoint unreachable: {0}")]
    Unreachable(String),

    /// The call reached the endpoint but the exchange broke down.
    #[error("Remote call to {target} failed: {reason}")]
    Call { target: String, reason: String },
}

/// Registry or cataloger lookup failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Registry unavailable: {0}")]
    Unavailable(String),

    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Lock acquisition failure (distinct from a denial).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LockError {
    #[error("Lock manager unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Transaction management failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Unknown transaction: {0}")]
    Unknown(TxnId),

    #[error("Transaction {0} is no longer active")]
    NotActive(TxnId),

    #[error("Transaction manager failure: {0}")]
    Manager(String),
}

/// Provisioning failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProvisionError {
    /// The deployment configuration is malformed.
    #[error("Invalid deployment: {0}")]
    InvalidDeployment(String),

    #[error("Deploying {name} failed: {reason}")]
    Deploy { name: String, reason: String },

    #[error("Undeploy failed: {0}")]
    Undeploy(String),
}

/// Failure of an in-process service operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Unknown selector: {0}")]
    UnknownSelector(String),

    /// The operation ran and reported a failure.
    #[error("Service failed: {0}")]
    Failed(String),

    /// The operation hit a host/runtime error.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ServiceError {
    pub fn is_runtime(&self) -> bool {
        matches!(self, ServiceError::Runtime(_))
    }
}
