//! Lock table for transaction-scoped grants.
//!
//! Tracks which transaction holds which lock, indexed in both directions so a
//! completing transaction can release everything it holds without scanning.

use exertion_core::LockKey;
use exertion_types::TxnId;
use std::collections::{BTreeSet, HashMap};

/// Bidirectional index of lock grants.
///
/// 1. Given a key, which transaction holds it?
/// 2. Given a transaction, which keys does it hold?
///
/// The second lookup is what commit and abort use to release a
/// transaction's locks in one step.
#[derive(Debug, Default)]
pub struct LockTable {
    /// key -> holding transaction
    holders: HashMap<LockKey, TxnId>,
    /// Reverse index: transaction -> keys it holds
    held_by_txn: HashMap<TxnId, BTreeSet<LockKey>>,
}

impl LockTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `key` to `txn` if it is free or already held by `txn`.
    ///
    /// Returns false when another transaction holds the key.
    pub fn try_grant(&mut self, key: &LockKey, txn: TxnId) -> bool {
        match self.holders.get(key) {
            Some(holder) if *holder != txn => false,
            Some(_) => true,
            None => {
                self.holders.insert(key.clone(), txn);
                self.held_by_txn.entry(txn).or_default().insert(key.clone());
                true
            }
        }
    }

    /// Release every lock held by `txn`, returning the released keys.
    ///
    /// Cleans up both the forward and reverse indexes.
    pub fn release_txn(&mut self, txn: TxnId) -> BTreeSet<LockKey> {
        let keys = self.held_by_txn.remove(&txn).unwrap_or_default();
        for key in &keys {
            self.holders.remove(key);
        }
        keys
    }

    /// Get the transaction holding a key.
    pub fn holder(&self, key: &LockKey) -> Option<TxnId> {
        self.holders.get(key).copied()
    }

    /// Get the keys a transaction holds.
    pub fn keys_for_txn(&self, txn: TxnId) -> Option<&BTreeSet<LockKey>> {
        self.held_by_txn.get(&txn)
    }

    /// Get the number of held locks.
    pub fn len(&self) -> usize {
        self.holders.len()
    }

    /// Check if no lock is held.
    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
