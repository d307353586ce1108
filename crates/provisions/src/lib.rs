//! On-demand provisioning for a single dispatch.
//!
//! A provisionable exertion may name deployments, either as `Arg::Deployment`
//! arguments to `exert()` or on its signatures. Before the provider is
//! resolved, a [`ProvisionManager`] deploys them through the configured
//! [`Provisioner`](exertion_core::Provisioner); after the call, whatever the
//! outcome, it undeploys them again.
//!
//! ```text
//! exert()
//!   │
//!   ├── ProvisionManager::for_exertion   (None unless provisionable + deployments)
//!   ├── deploy_services()                (failure is fatal to the dispatch)
//!   ├── resolve + invoke provider
//!   └── drop / undeploy()                (failure is logged only)
//! ```
//!
//! # Components
//!
//! - [`ProvisionManager`] - per-call deploy and scoped teardown
//! - [`ProvisionConfig`] - enable switch and deploy timeout

mod config;
mod manager;

pub use config::ProvisionConfig;
pub use manager::ProvisionManager;
