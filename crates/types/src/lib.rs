//! Core data types for exertion dispatch.
//!
//! An [`Exertion`] is either a [`Task`] (leaf) or a [`Job`] (ordered children).
//! Each carries a [`Context`] payload, a [`ControlContext`] with dispatch
//! metadata and recorded failures, and one process [`Signature`] naming the
//! service that should execute it.

mod arg;
mod context;
mod control;
pub mod duration;
mod exertion;
mod identifiers;
mod signature;

pub use arg::{Arg, Deployment};
pub use context::{Context, Value};
pub use control::{AccessType, ControlContext, FaultKind, ThrowableTrace};
pub use exertion::{ExecState, Exertion, ExertionKind, Job, Task};
pub use identifiers::{DeploymentId, ExertionId, ProviderId, ServiceId, TxnId};
pub use signature::{
    ProviderBinding, Signature, SignatureKind, SignatureType, ANY, CATALOGER, JOBBER,
    LOCK_MANAGER, SERVICE_SELECTOR, SPACER,
};
