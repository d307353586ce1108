//! Collaborator contracts for exertion dispatch.
//!
//! The dispatch shell never talks to a transport directly. It sees providers,
//! the service registry, the lock manager, the transaction manager and the
//! provisioner only through the traits defined here.

mod error;
mod lock;
mod template;
mod traits;
mod transaction;

pub use error::{
    LockError, ProvisionError, RegistryError, RemoteError, ServiceError, TransactionError,
};
pub use lock::{LockKey, LockRequest, LockResult};
pub use template::{Entry, ServiceHandle, ServiceItem, ServiceTemplate};
pub use traits::{
    Cataloger, LocalService, LockManager, Provider, Provisioner, ServiceRegistry,
    TransactionManager, TransactionParticipant,
};
pub use transaction::Transaction;
