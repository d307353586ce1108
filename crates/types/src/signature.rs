//! Service signatures.
//!
//! A signature names the capability an exertion needs: the service type
//! (interface), the selector (operation) and optionally a concrete provider.

use crate::{Deployment, ProviderId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider name matching any provider of the requested type.
pub const ANY: &str = "*";

/// Service type of the space-based rendezvous used for PULL access.
pub const SPACER: &str = "Spacer";

/// Service type of the rendezvous provider used for PUSH access.
pub const JOBBER: &str = "Jobber";

/// Service type of the provider directory consulted before discovery.
pub const CATALOGER: &str = "Cataloger";

/// Service type of the distributed lock manager.
pub const LOCK_MANAGER: &str = "LockManager";

/// Selector every rendezvous provider exposes.
pub const SERVICE_SELECTOR: &str = "service";

/// Role of a signature within an exertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    /// Service invocation; a process type.
    #[default]
    Srv,
    /// Processing operation; a process type.
    Proc,
    /// Runs before the process operation.
    Pre,
    /// Runs after the process operation.
    Post,
    /// Contributes data to the context before anything else runs.
    Append,
}

impl SignatureType {
    /// Whether a signature of this type can drive dispatch.
    pub fn is_process(self) -> bool {
        matches!(self, SignatureType::Srv | SignatureType::Proc)
    }
}

/// Where a signature executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Executed by a remote provider resolved through the registry.
    #[default]
    Net,
    /// Executed by an in-process service object.
    Local,
}

/// The provider a signature was bound to during dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBinding {
    pub id: ProviderId,
    pub name: String,
}

/// Describes the service required to execute an exertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub service_type: String,
    pub selector: String,
    #[serde(default = "any_provider")]
    pub provider_name: String,
    #[serde(default, rename = "type")]
    pub sig_type: SignatureType,
    #[serde(default)]
    pub kind: SignatureKind,
    #[serde(default)]
    pub deployment: Option<Deployment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<ProviderBinding>,
}

fn any_provider() -> String {
    ANY.to_string()
}

impl Signature {
    /// Networked process signature targeting any provider of `service_type`.
    pub fn net(service_type: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            selector: selector.into(),
            provider_name: any_provider(),
            sig_type: SignatureType::Srv,
            kind: SignatureKind::Net,
            deployment: None,
            provider: None,
        }
    }

    /// In-process process signature.
    pub fn local(service_type: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            kind: SignatureKind::Local,
            sig_type: SignatureType::Proc,
            ..Self::net(service_type, selector)
        }
    }

    /// Signature routing a job through the space-based rendezvous.
    pub fn spacer() -> Self {
        Self::net(SPACER, SERVICE_SELECTOR)
    }

    /// Signature routing a job through the push rendezvous.
    pub fn jobber() -> Self {
        Self::net(JOBBER, SERVICE_SELECTOR)
    }

    /// Set a concrete provider name.
    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Set the signature type.
    pub fn with_type(mut self, sig_type: SignatureType) -> Self {
        self.sig_type = sig_type;
        self
    }

    /// Attach a deployment configuration for on-demand provisioning.
    pub fn with_deployment(mut self, deployment: Deployment) -> Self {
        self.deployment = Some(deployment);
        self
    }

    /// Whether this signature can drive dispatch.
    pub fn is_process(&self) -> bool {
        self.sig_type.is_process()
    }

    /// Whether this signature is resolved through the registry.
    pub fn is_networked(&self) -> bool {
        self.kind == SignatureKind::Net
    }

    /// Whether the signature names both a service type and an operation.
    pub fn is_selectable(&self) -> bool {
        !self.service_type.trim().is_empty() && !self.selector.trim().is_empty()
    }

    /// Whether the signature accepts any provider of its type.
    pub fn is_any_provider(&self) -> bool {
        self.provider_name.is_empty() || self.provider_name == ANY
    }

    /// Whether the signature targets the given service type.
    pub fn targets(&self, service_type: &str) -> bool {
        self.service_type == service_type
    }

    /// Record the provider this signature was dispatched to.
    pub fn bind_provider(&mut self, id: ProviderId, name: impl Into<String>) {
        self.provider = Some(ProviderBinding {
            id,
            name: name.into(),
        });
    }

    /// The provider bound during dispatch, if any.
    pub fn provider(&self) -> Option<&ProviderBinding> {
        self.provider.as_ref()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}@{}",
            self.service_type, self.selector, self.provider_name
        )
    }
}
