//! Mutual exclusion for providers that require exclusive access.
//!
//! [`MutexCoordinator`] wraps a provider invocation in a lock keyed by
//! `(service type, provider id)` and scoped to a transaction. The lock
//! manager guarantees at most one in-flight call per key; waiters are served
//! in whatever order the manager wakes them.
//!
//! # Components
//!
//! - [`MutexCoordinator`] - acquire, invoke, commit / abort-and-record
//! - [`LocalLockManager`] - in-process lock manager and transaction participant
//! - [`LockTable`] - bidirectional key/transaction grant index
//! - [`MutexConfig`] - lock wait timeout and lock manager name

mod config;
mod coordinator;
mod error;
mod manager;
mod table;

pub use config::MutexConfig;
pub use coordinator::MutexCoordinator;
pub use error::MutexError;
pub use manager::LocalLockManager;
pub use table::LockTable;
