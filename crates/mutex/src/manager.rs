//! In-process lock manager.

use crate::LockTable;
use exertion_core::{LockError, LockManager, LockRequest, LockResult, TransactionParticipant};
use exertion_types::TxnId;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, trace};

/// Lock manager granting locks from a [`LockTable`].
///
/// Requests for a held key block on a condition variable until the holding
/// transaction commits or aborts, or the request's wait expires (a denial).
/// Join it to the transaction manager so completions release locks.
#[derive(Debug)]
pub struct LocalLockManager {
    table: Mutex<LockTable>,
    released: Condvar,
    available: AtomicBool,
}

impl Default for LocalLockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalLockManager {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(LockTable::new()),
            released: Condvar::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Make every request fail while `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Number of locks currently held.
    pub fn held(&self) -> usize {
        self.table.lock().len()
    }

    fn release(&self, txn: TxnId) {
        let released = self.table.lock().release_txn(txn);
        if !released.is_empty() {
            debug!(txn = %txn, count = released.len(), "Released locks");
            self.released.notify_all();
        }
    }
}

impl LockManager for LocalLockManager {
    fn acquire(&self, request: &LockRequest) -> Result<LockResult, LockError> {
        if !self.available.load(Ordering::Relaxed) {
            return Err(LockError::Unavailable("lock manager offline".into()));
        }

        let deadline = request.wait.map(|w| Instant::now() + w);
        let mut table = self.table.lock();

        loop {
            if table.try_grant(&request.key, request.txn) {
                trace!(key = %request.key, txn = %request.txn, "Lock granted");
                return Ok(LockResult::granted());
            }

            match deadline {
                None => self.released.wait(&mut table),
                Some(deadline) => {
                    if self.released.wait_until(&mut table, deadline).timed_out()
                        && !table.try_grant(&request.key, request.txn)
                    {
                        return Ok(LockResult::denied(format!(
                            "timed out waiting for {}",
                            request.key
                        )));
                    }
                }
            }
        }
    }
}

impl TransactionParticipant for LocalLockManager {
    fn committed(&self, txn: TxnId) {
        self.release(txn);
    }

    fn aborted(&self, txn: TxnId) {
        self.release(txn);
    }
}
