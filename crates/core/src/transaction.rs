//! Transaction handles.

use exertion_types::TxnId;

/// Handle to a transaction created by a [`TransactionManager`].
///
/// Only the identifier travels; commit and abort go back through the manager
/// that created it, which notifies its participants.
///
/// # Example
///
/// ```ignore
/// let txn = txn_manager.begin()?;
/// let result = provider.service(exertion, Some(&txn))?;
/// txn_manager.commit(&txn)?;
/// ```
///
/// [`TransactionManager`]: crate::TransactionManager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transaction {
    id: TxnId,
}

impl Transaction {
    /// Create a transaction handle.
    pub fn new(id: TxnId) -> Self {
        Self { id }
    }

    /// Get the transaction id.
    pub fn id(&self) -> TxnId {
        self.id
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
