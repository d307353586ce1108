//! In-process dispatch collaborators.
//!
//! This crate provides working, single-process implementations of the
//! collaborator contracts in `exertion-core`, for the simulator and for tests:
//!
//! - [`InMemoryRegistry`] - service registry with liveness and availability switches
//! - [`InMemoryCataloger`] - provider directory consulted before discovery
//! - [`LocalTransactionManager`] - transaction ledger notifying participants
//! - [`SimProvisioner`] - deploys factory-built providers into the registry
//!
//! The lock manager lives with the mutual-exclusion coordinator in
//! `exertion-mutex`.

mod provisioner;
mod registry;
mod txn;

pub use provisioner::{ProviderFactory, SimProvisioner};
pub use registry::{InMemoryCataloger, InMemoryRegistry};
pub use txn::{LocalTransactionManager, TxnState};
