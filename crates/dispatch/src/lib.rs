//! Exertion dispatch.
//!
//! [`ExertProcessor::exert`] decides how and where an exertion runs: local
//! services for non-networked signatures, otherwise a provider resolved
//! through the cataloger or registry discovery, optionally under mutual
//! exclusion and with on-demand provisioning around the call.
//!
//! # Failure model
//!
//! Two channels, never mixed:
//!
//! - `Err(DispatchError)`: the dispatch could not proceed (bad arguments,
//!   provisioning, transaction management, transport).
//! - `Ok(exertion)` with `Failed`/`Error` status and recorded
//!   [`ThrowableTrace`](exertion_types::ThrowableTrace)s: the exertion ran, or
//!   could not be placed, and the caller inspects the result. Jobs keep every
//!   child's result, so partial failure stays observable.
//!
//! Nothing here retries.
//!
//! # Components
//!
//! - [`ExertProcessor`] - the dispatch shell
//! - [`corrector`] - push/pull rendezvous signature correction for jobs
//! - [`LocalServices`] - in-process execution and control flow
//! - [`DispatchConfig`] - configuration for every coordinator

mod config;
pub mod corrector;
mod error;
mod local;
mod processor;

pub use config::DispatchConfig;
pub use error::DispatchError;
pub use local::LocalServices;
pub use processor::{fold_status, ExertProcessor};
