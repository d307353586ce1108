//! Dispatch metadata carried by every exertion.

use crate::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an exertion reaches its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// Direct invocation, jobs go through the push rendezvous.
    #[default]
    Push,
    /// Space-based take-and-execute.
    Pull,
    /// Push with quality-of-service routing.
    QosPush,
    /// Pull with quality-of-service routing.
    QosPull,
}

impl AccessType {
    /// Whether exertions with this access go through the space.
    pub fn is_pull(self) -> bool {
        matches!(self, AccessType::Pull | AccessType::QosPull)
    }

    pub fn is_push(self) -> bool {
        !self.is_pull()
    }
}

/// Classification of a recorded failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Dispatch could not proceed: bad signature, no provider, lock denied.
    Exertion,
    /// The provider or local service reported a failure.
    Service,
    /// A host/runtime error inside the executing code.
    Runtime,
}

/// A recorded failure together with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowableTrace {
    pub kind: FaultKind,
    pub message: String,
    /// Exertion name or provider that produced the failure.
    #[serde(default)]
    pub origin: Option<String>,
}

impl ThrowableTrace {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: None,
        }
    }

    pub fn exertion(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Exertion, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Service, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Runtime, message)
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Whether this wraps a host/runtime error.
    pub fn is_runtime(&self) -> bool {
        self.kind == FaultKind::Runtime
    }
}

impl fmt::Display for ThrowableTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "[{:?}] {} ({})", self.kind, self.message, origin),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

/// Per-exertion dispatch metadata.
///
/// Mutated by the dispatch shell and by the provider that ran the exertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlContext {
    #[serde(default)]
    pub access_type: AccessType,
    /// Provider whose lock was held while this exertion ran.
    #[serde(default)]
    pub mutex_id: Option<ProviderId>,
    #[serde(default)]
    pub monitored: bool,
    /// Whether services for this exertion may be deployed on demand.
    #[serde(default)]
    pub provisionable: bool,
    #[serde(default)]
    pub notify: Vec<String>,
    #[serde(default)]
    trace: Vec<String>,
    #[serde(default)]
    exceptions: Vec<ThrowableTrace>,
}

impl ControlContext {
    pub fn with_access(access_type: AccessType) -> Self {
        Self {
            access_type,
            ..Default::default()
        }
    }

    /// Append a human-readable trace line.
    pub fn append_trace(&mut self, line: impl Into<String>) {
        self.trace.push(line.into());
    }

    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Record a failure.
    pub fn add_exception(&mut self, exception: ThrowableTrace) {
        self.exceptions.push(exception);
    }

    pub fn exceptions(&self) -> &[ThrowableTrace] {
        &self.exceptions
    }

    pub fn has_exceptions(&self) -> bool {
        !self.exceptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_classification() {
        assert!(AccessType::Pull.is_pull());
        assert!(AccessType::QosPull.is_pull());
        assert!(AccessType::Push.is_push());
        assert!(AccessType::QosPush.is_push());
    }

    #[test]
    fn test_control_context_records() {
        let mut cc = ControlContext::with_access(AccessType::Pull);
        assert!(!cc.has_exceptions());

        cc.append_trace("bootstrapping: echo:01");
        cc.add_exception(ThrowableTrace::runtime("boom").with_origin("t1"));

        assert_eq!(cc.trace(), ["bootstrapping: echo:01".to_string()]);
        assert!(cc.exceptions()[0].is_runtime());
        assert_eq!(cc.exceptions()[0].to_string(), "[Runtime] boom (t1)");
    }
}
