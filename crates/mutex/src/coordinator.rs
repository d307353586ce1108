//! Mutual-exclusion coordinator.
//!
//! ```text
//! UNLOCKED ──acquire──▶ LOCK_REQUESTED ──granted──▶ LOCKED ──service()──▶ COMMITTED
//!                              │
//!                              └──denied / failed──▶ ABORTED (exception recorded)
//! ```

use crate::{MutexConfig, MutexError};
use exertion_core::{
    LockKey, LockManager, LockRequest, Provider, ServiceTemplate, Transaction,
    TransactionManager,
};
use exertion_registry::ProviderAccessor;
use exertion_types::{Exertion, ThrowableTrace, LOCK_MANAGER};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs provider calls under a transaction-scoped lock on the provider.
///
/// The lock manager handle is resolved lazily through the accessor on first
/// use and cached; until one is found every call re-resolves.
pub struct MutexCoordinator {
    accessor: Arc<ProviderAccessor>,
    txn_manager: Arc<dyn TransactionManager>,
    config: MutexConfig,
    lock_manager: Mutex<Option<Arc<dyn LockManager>>>,
}

impl MutexCoordinator {
    pub fn new(
        accessor: Arc<ProviderAccessor>,
        txn_manager: Arc<dyn TransactionManager>,
        config: MutexConfig,
    ) -> Self {
        Self {
            accessor,
            txn_manager,
            config,
            lock_manager: Mutex::new(None),
        }
    }

    /// Use this lock manager instead of resolving one.
    pub fn with_lock_manager(self, lock_manager: Arc<dyn LockManager>) -> Self {
        *self.lock_manager.lock() = Some(lock_manager);
        self
    }

    fn lock_manager(&self) -> Option<Arc<dyn LockManager>> {
        let mut cached = self.lock_manager.lock();
        if let Some(manager) = cached.as_ref() {
            return Some(manager.clone());
        }

        let mut template = ServiceTemplate::of_type(LOCK_MANAGER);
        if let Some(name) = &self.config.lock_manager_name {
            template = template.with_name(name.clone());
        }
        let found = self
            .accessor
            .lookup_service(&template)
            .and_then(|item| item.lock_manager().cloned());
        if found.is_some() {
            debug!("Resolved lock manager");
        }
        cached.clone_from(&found);
        found
    }

    /// Invoke `provider.service` while holding the provider's lock.
    ///
    /// The lock is scoped to a transaction the coordinator begins for this
    /// call alone, so callers sharing one transaction still take turns. On
    /// grant the call runs and the lock transaction commits; on denial or
    /// lock-manager failure it aborts, the failure is recorded on the
    /// exertion, and the exertion comes back unexecuted.
    ///
    /// `txn`, when given, is what the provider sees. The coordinator never
    /// completes it.
    pub fn exert_exclusive(
        &self,
        provider: &Arc<dyn Provider>,
        mut exertion: Exertion,
        txn: Option<&Transaction>,
    ) -> Result<Exertion, MutexError> {
        let target = format!("{}:{}", provider.provider_name(), provider.provider_id());

        let Some(lock_manager) = self.lock_manager() else {
            warn!(provider = %target, "No lock manager available");
            exertion.report_exception(
                ThrowableTrace::exertion(format!("no lock manager available for: {target}"))
                    .with_origin(exertion.name().to_string()),
            );
            return Ok(exertion);
        };

        let lock_txn = self.txn_manager.begin()?;

        let service_type = exertion
            .process_signature()
            .map(|s| s.service_type.clone())
            .unwrap_or_default();
        let request = LockRequest {
            key: LockKey::new(service_type, provider.provider_id()),
            owner: exertion.id(),
            txn: lock_txn.id(),
            wait: self.config.lock_wait_timeout,
        };

        match lock_manager.acquire(&request) {
            Ok(result) if result.succeeded => {
                debug!(key = %request.key, txn = %lock_txn, "Lock acquired");
                exertion.control_mut().mutex_id = Some(provider.provider_id());

                match provider.service(exertion, Some(txn.unwrap_or(&lock_txn))) {
                    Ok(result) => {
                        self.txn_manager.commit(&lock_txn)?;
                        Ok(result)
                    }
                    Err(e) => {
                        if let Err(abort) = self.txn_manager.abort(&lock_txn) {
                            warn!(txn = %lock_txn, error = %abort, "Abort after failed call failed");
                        }
                        Err(e.into())
                    }
                }
            }
            Ok(result) => {
                self.txn_manager.abort(&lock_txn)?;
                info!(
                    key = %request.key,
                    reason = result.reason.as_deref().unwrap_or("denied"),
                    "Lock denied"
                );
                exertion.report_exception(
                    ThrowableTrace::exertion(format!("no lock available for: {target}"))
                        .with_origin(exertion.name().to_string()),
                );
                Ok(exertion)
            }
            Err(e) => {
                self.txn_manager.abort(&lock_txn)?;
                warn!(key = %request.key, error = %e, "Lock acquisition failed");
                exertion.report_exception(
                    ThrowableTrace::exertion(format!("lock acquisition failed for {target}: {e}"))
                        .with_origin(exertion.name().to_string()),
                );
                Ok(exertion)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalLockManager;
    use exertion_core::{Entry, LockManager, ServiceHandle, ServiceItem, TransactionError};
    use exertion_registry::RegistryConfig;
    use exertion_simulation::{InMemoryRegistry, LocalTransactionManager, TxnState};
    use exertion_test_helpers::{net_task, ExclusiveProvider};
    use exertion_types::{ExecState, ServiceId, TxnId};
    use std::time::Duration;
    use tracing_test::traced_test;

    struct Fixture {
        registry: Arc<InMemoryRegistry>,
        txns: Arc<LocalTransactionManager>,
        locks: Arc<LocalLockManager>,
        coordinator: MutexCoordinator,
    }

    fn fixture(config: MutexConfig) -> Fixture {
        let registry = Arc::new(InMemoryRegistry::new());
        let txns = Arc::new(LocalTransactionManager::new());
        let locks = Arc::new(LocalLockManager::new());
        txns.join(locks.clone());
        registry.register(
            ServiceItem::new(ServiceId(7), ServiceHandle::LockManager(locks.clone()))
                .with_type(LOCK_MANAGER)
                .with_attribute(Entry::Name("locks".into())),
        );
        let accessor = Arc::new(ProviderAccessor::new(
            registry.clone(),
            RegistryConfig::no_wait().without_cataloger(),
        ));
        let coordinator = MutexCoordinator::new(accessor, txns.clone(), config);
        Fixture {
            registry,
            txns,
            locks,
            coordinator,
        }
    }

    fn exclusive() -> (Arc<ExclusiveProvider>, Arc<dyn Provider>) {
        let provider = Arc::new(ExclusiveProvider::new("calc", Duration::from_millis(1)));
        let dyn_provider: Arc<dyn Provider> = provider.clone();
        (provider, dyn_provider)
    }

    #[test]
    fn test_granted_lock_runs_and_commits() {
        let f = fixture(MutexConfig::default());
        let (provider, dyn_provider) = exclusive();
        let txn = f.txns.begin().unwrap();

        let result = f
            .coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), Some(&txn))
            .unwrap();

        assert_eq!(result.status(), ExecState::Done);
        assert_eq!(result.control().mutex_id, Some(provider.provider_id()));
        // The lock transaction commits; the caller's stays open for the caller.
        assert_eq!(f.txns.state(txn.id()), Some(TxnState::Active));
        assert_eq!(f.txns.count(TxnState::Committed), 1);
        assert_eq!(f.locks.held(), 0);
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_callers_sharing_a_transaction_take_turns() {
        let f = fixture(MutexConfig::default());
        let provider = Arc::new(ExclusiveProvider::new("calc", Duration::from_millis(20)));
        let dyn_provider: Arc<dyn Provider> = provider.clone();
        let shared = f.txns.begin().unwrap();

        std::thread::scope(|s| {
            for i in 0..4 {
                let (f, dyn_provider, shared) = (&f, &dyn_provider, &shared);
                s.spawn(move || {
                    let task = net_task(&format!("t{i}"), "Calculator", "add");
                    let result = f
                        .coordinator
                        .exert_exclusive(dyn_provider, task.into(), Some(shared))
                        .unwrap();
                    assert_eq!(result.status(), ExecState::Done);
                });
            }
        });

        assert_eq!(provider.calls(), 4);
        assert_eq!(provider.max_in_flight(), 1);
        assert_eq!(f.txns.state(shared.id()), Some(TxnState::Active));
        assert_eq!(f.txns.count(TxnState::Committed), 4);
        assert_eq!(f.locks.held(), 0);
    }

    #[test]
    fn test_begins_own_transaction_when_none_given() {
        let f = fixture(MutexConfig::default());
        let (_, dyn_provider) = exclusive();

        f.coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), None)
            .unwrap();

        assert_eq!(f.txns.count(TxnState::Committed), 1);
    }

    #[traced_test]
    #[test]
    fn test_denied_lock_aborts_and_skips_service() {
        let f = fixture(MutexConfig::with_timeout(Duration::from_millis(10)));
        let (provider, dyn_provider) = exclusive();

        // Another transaction already holds the provider's lock.
        let holder = f.txns.begin().unwrap();
        let key = LockKey::new("Calculator", provider.provider_id());
        assert!(f
            .locks
            .acquire(&LockRequest {
                key,
                owner: exertion_types::ExertionId(1),
                txn: holder.id(),
                wait: None,
            })
            .unwrap()
            .succeeded);

        let txn = f.txns.begin().unwrap();
        let result = f
            .coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), Some(&txn))
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(f.txns.state(txn.id()), Some(TxnState::Active));
        assert_eq!(f.txns.count(TxnState::Aborted), 1);
        assert!(result.control().mutex_id.is_none());
        let messages: Vec<_> = result.control().exceptions().iter().map(|e| &e.message).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("no lock available for: calc:"));
        assert!(logs_contain("Lock denied"));
    }

    #[test]
    fn test_missing_lock_manager_is_recorded() {
        let f = fixture(MutexConfig::default());
        f.registry.unregister(ServiceId(7));
        let (provider, dyn_provider) = exclusive();

        let result = f
            .coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), None)
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert!(result.control().exceptions()[0]
            .message
            .starts_with("no lock manager available"));
        assert_eq!(f.txns.count(TxnState::Active), 0);
    }

    #[test]
    fn test_lock_manager_failure_aborts() {
        let f = fixture(MutexConfig::default());
        f.locks.set_available(false);
        let (provider, dyn_provider) = exclusive();
        let txn = f.txns.begin().unwrap();

        let result = f
            .coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), Some(&txn))
            .unwrap();

        assert_eq!(provider.calls(), 0);
        assert_eq!(f.txns.state(txn.id()), Some(TxnState::Active));
        assert_eq!(f.txns.count(TxnState::Aborted), 1);
        assert!(result.control().exceptions()[0]
            .message
            .starts_with("lock acquisition failed"));
    }

    #[test]
    fn test_lock_manager_handle_is_cached() {
        let f = fixture(MutexConfig::default());
        let (_, dyn_provider) = exclusive();

        f.coordinator
            .exert_exclusive(&dyn_provider, net_task("a", "Calculator", "add").into(), None)
            .unwrap();
        // Gone from the registry, but the cached handle keeps working.
        f.registry.unregister(ServiceId(7));
        let result = f
            .coordinator
            .exert_exclusive(&dyn_provider, net_task("b", "Calculator", "add").into(), None)
            .unwrap();

        assert_eq!(result.status(), ExecState::Done);
    }

    struct DownTxns;

    impl TransactionManager for DownTxns {
        fn begin(&self) -> Result<Transaction, TransactionError> {
            Err(TransactionError::Manager("down".into()))
        }

        fn commit(&self, txn: &Transaction) -> Result<(), TransactionError> {
            Err(TransactionError::Unknown(txn.id()))
        }

        fn abort(&self, txn: &Transaction) -> Result<(), TransactionError> {
            Err(TransactionError::Unknown(txn.id()))
        }
    }

    #[test]
    fn test_transaction_manager_failure_is_fatal() {
        let f = fixture(MutexConfig::default());
        let coordinator = MutexCoordinator::new(
            Arc::new(ProviderAccessor::new(
                f.registry.clone(),
                RegistryConfig::no_wait().without_cataloger(),
            )),
            Arc::new(DownTxns),
            MutexConfig::default(),
        );
        let (provider, dyn_provider) = exclusive();
        let caller = Transaction::new(TxnId(999));

        let err = coordinator
            .exert_exclusive(&dyn_provider, net_task("t", "Calculator", "add").into(), Some(&caller))
            .unwrap_err();

        assert!(matches!(err, MutexError::Transaction(TransactionError::Manager(_))));
        assert_eq!(provider.calls(), 0);
    }
}
