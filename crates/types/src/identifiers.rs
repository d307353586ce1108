//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exertion identifier.
///
/// Identifies a task or job for its whole lifetime, across dispatch hops.
/// Lock requests use it as the request identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExertionId(pub u64);

impl ExertionId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        ExertionId(rand::random())
    }
}

impl fmt::Display for ExertionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exertion({:016x})", self.0)
    }
}

/// Provider identifier, stable for the life of a provider process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub u64);

impl ProviderId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        ProviderId(rand::random())
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Registry-assigned service identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(pub u64);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service({})", self.0)
    }
}

/// Transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(pub u64);

impl TxnId {
    /// Get the next transaction id.
    pub fn next(self) -> Self {
        TxnId(self.0 + 1)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txn({})", self.0)
    }
}

/// Identifier of one deployment made by a provisioner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentId(pub u64);

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deployment({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txn_id_next() {
        assert_eq!(TxnId(0).next(), TxnId(1));
        assert_eq!(TxnId(41).next().next(), TxnId(43));
    }

    #[test]
    fn test_display_formats() {
        assert_eq!(ProviderId(0xab).to_string(), "00000000000000ab");
        assert_eq!(TxnId(7).to_string(), "Txn(7)");
        assert_eq!(ServiceId(3).to_string(), "Service(3)");
        assert_eq!(ExertionId(1).to_string(), "Exertion(0000000000000001)");
    }

    #[test]
    fn test_ids_are_transparent_in_json() {
        let json = serde_json::to_string(&ProviderId(12)).unwrap();
        assert_eq!(json, "12");
        let back: ProviderId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProviderId(12));
    }
}
