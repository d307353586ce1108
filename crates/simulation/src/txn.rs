//! In-process transaction manager.

use exertion_core::{Transaction, TransactionError, TransactionManager, TransactionParticipant};
use exertion_types::TxnId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Lifecycle state of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Active,
    Committed,
    Aborted,
}

#[derive(Debug)]
struct Ledger {
    next: TxnId,
    states: HashMap<TxnId, TxnState>,
}

/// Transaction manager that keeps its ledger in memory and notifies
/// participants when a transaction commits or aborts.
pub struct LocalTransactionManager {
    ledger: Mutex<Ledger>,
    participants: RwLock<Vec<Arc<dyn TransactionParticipant>>>,
}

impl Default for LocalTransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalTransactionManager {
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                next: TxnId(1),
                states: HashMap::new(),
            }),
            participants: RwLock::new(Vec::new()),
        }
    }

    /// Enlist a participant in every transaction.
    pub fn join(&self, participant: Arc<dyn TransactionParticipant>) {
        self.participants.write().push(participant);
    }

    pub fn state(&self, txn: TxnId) -> Option<TxnState> {
        self.ledger.lock().states.get(&txn).copied()
    }

    /// Number of transactions in the given state.
    pub fn count(&self, state: TxnState) -> usize {
        self.ledger
            .lock()
            .states
            .values()
            .filter(|s| **s == state)
            .count()
    }

    fn complete(&self, txn: &Transaction, outcome: TxnState) -> Result<(), TransactionError> {
        {
            let mut ledger = self.ledger.lock();
            match ledger.states.get_mut(&txn.id()) {
                None => return Err(TransactionError::Unknown(txn.id())),
                Some(state) if *state != TxnState::Active => {
                    return Err(TransactionError::NotActive(txn.id()))
                }
                Some(state) => *state = outcome,
            }
        }

        debug!(txn = %txn, ?outcome, "Transaction completed");
        for participant in self.participants.read().iter() {
            match outcome {
                TxnState::Committed => participant.committed(txn.id()),
                _ => participant.aborted(txn.id()),
            }
        }
        Ok(())
    }
}

impl TransactionManager for LocalTransactionManager {
    fn begin(&self) -> Result<Transaction, TransactionError> {
        let mut ledger = self.ledger.lock();
        let id = ledger.next;
        ledger.next = id.next();
        ledger.states.insert(id, TxnState::Active);
        Ok(Transaction::new(id))
    }

    fn commit(&self, txn: &Transaction) -> Result<(), TransactionError> {
        self.complete(txn, TxnState::Committed)
    }

    fn abort(&self, txn: &Transaction) -> Result<(), TransactionError> {
        self.complete(txn, TxnState::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        committed: AtomicUsize,
        aborted: AtomicUsize,
    }

    impl TransactionParticipant for Recorder {
        fn committed(&self, _txn: TxnId) {
            self.committed.fetch_add(1, Ordering::SeqCst);
        }

        fn aborted(&self, _txn: TxnId) {
            self.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_begin_commit_abort() {
        let tm = LocalTransactionManager::new();
        let recorder = Arc::new(Recorder::default());
        tm.join(recorder.clone());

        let t1 = tm.begin().unwrap();
        let t2 = tm.begin().unwrap();
        assert_ne!(t1.id(), t2.id());

        tm.commit(&t1).unwrap();
        tm.abort(&t2).unwrap();

        assert_eq!(tm.state(t1.id()), Some(TxnState::Committed));
        assert_eq!(tm.state(t2.id()), Some(TxnState::Aborted));
        assert_eq!(recorder.committed.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.aborted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_completion_fails() {
        let tm = LocalTransactionManager::new();
        let txn = tm.begin().unwrap();
        tm.commit(&txn).unwrap();

        assert_eq!(tm.abort(&txn), Err(TransactionError::NotActive(txn.id())));
    }

    #[test]
    fn test_unknown_transaction() {
        let tm = LocalTransactionManager::new();
        let stray = Transaction::new(TxnId(99));
        assert_eq!(tm.commit(&stray), Err(TransactionError::Unknown(TxnId(99))));
    }
}
