//! Contracts of the services dispatch talks to.
//!
//! Every trait here is a seam: production code backs them with remote
//! endpoints, the simulation crate with in-process implementations. All of
//! them are synchronous; a dispatch runs on the caller's thread and blocks on
//! each collaborator in turn.

use crate::{
    LockError, LockRequest, LockResult, ProvisionError, RegistryError, RemoteError,
    ServiceError, ServiceItem, ServiceTemplate, Transaction, TransactionError,
};
use exertion_types::{Context, Deployment, DeploymentId, Exertion, ProviderId, TxnId};

/// A resolved endpoint that executes exertions.
pub trait Provider: Send + Sync {
    /// Execute the exertion and return it with results, status and trace.
    ///
    /// Execution failures are recorded on the returned exertion. `Err` is
    /// reserved for transport failures, after which the exertion is lost to
    /// the caller.
    fn service(
        &self,
        exertion: Exertion,
        txn: Option<&Transaction>,
    ) -> Result<Exertion, RemoteError>;

    /// Whether calls must hold an exclusive lock on this provider.
    fn mutual_exclusion(&self) -> bool {
        false
    }

    fn provider_id(&self) -> ProviderId;

    fn provider_name(&self) -> &str;

    /// Shut the provider down.
    fn destroy(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Directory of currently known providers.
pub trait Cataloger: Send + Sync {
    fn lookup(
        &self,
        template: &ServiceTemplate,
        max_matches: usize,
    ) -> Result<Vec<ServiceItem>, RegistryError>;
}

/// Generic service registry backing both cataloger discovery and the
/// fallback provider lookup.
pub trait ServiceRegistry: Send + Sync {
    /// Return up to `max_matches` items matching `template`.
    fn lookup(
        &self,
        template: &ServiceTemplate,
        max_matches: usize,
    ) -> Result<Vec<ServiceItem>, RegistryError>;

    /// Whether the service behind `item` still answers.
    fn is_alive(&self, item: &ServiceItem) -> bool;
}

/// Grants transaction-scoped mutual-exclusion locks.
pub trait LockManager: Send + Sync {
    /// Request a lock. Blocks until granted, denied, or the request's wait expires.
    fn acquire(&self, request: &LockRequest) -> Result<LockResult, LockError>;
}

/// Creates and completes transactions.
pub trait TransactionManager: Send + Sync {
    fn begin(&self) -> Result<Transaction, TransactionError>;

    fn commit(&self, txn: &Transaction) -> Result<(), TransactionError>;

    fn abort(&self, txn: &Transaction) -> Result<(), TransactionError>;
}

/// Resource manager notified when a transaction completes.
pub trait TransactionParticipant: Send + Sync {
    fn committed(&self, txn: TxnId);

    fn aborted(&self, txn: TxnId);
}

/// Deploys providers on demand.
pub trait Provisioner: Send + Sync {
    /// Deploy every configuration, returning one id per deployment.
    fn deploy_services(
        &self,
        deployments: &[Deployment],
    ) -> Result<Vec<DeploymentId>, ProvisionError>;

    fn undeploy(&self, deployments: &[DeploymentId]) -> Result<(), ProvisionError>;
}

/// An in-process service object executing non-networked signatures.
pub trait LocalService: Send + Sync {
    /// Run `selector` over `context`, returning the updated context.
    fn exec(&self, selector: &str, context: Context) -> Result<Context, ServiceError>;
}
