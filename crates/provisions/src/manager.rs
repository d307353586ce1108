//! Per-dispatch provisioning.

use crate::ProvisionConfig;
use exertion_core::{ProvisionError, Provisioner};
use exertion_types::{Arg, Deployment, DeploymentId, Exertion};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Deploys the providers one dispatch needs and tears them down again.
///
/// A manager belongs to exactly one `exert()` call. Whatever it deployed is
/// undeployed when [`undeploy`](Self::undeploy) is called or, failing that,
/// when the manager is dropped. Teardown failures are logged and never
/// returned.
pub struct ProvisionManager {
    provisioner: Arc<dyn Provisioner>,
    config: ProvisionConfig,
    deployments: Vec<Deployment>,
    deployed: Vec<DeploymentId>,
}

impl std::fmt::Debug for ProvisionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionManager")
            .field("deployments", &self.deployments)
            .field("deployed", &self.deployed)
            .finish()
    }
}

impl ProvisionManager {
    pub fn new(
        provisioner: Arc<dyn Provisioner>,
        deployments: Vec<Deployment>,
        config: ProvisionConfig,
    ) -> Self {
        Self {
            provisioner,
            config,
            deployments,
            deployed: Vec::new(),
        }
    }

    /// Manager for `exertion`, if it needs one.
    ///
    /// Returns `None` unless provisioning is enabled, the exertion is
    /// provisionable, and at least one deployment is configured. Deployments
    /// come from `args` first, then from the signatures of the exertion tree;
    /// duplicates are dropped.
    pub fn for_exertion(
        provisioner: Arc<dyn Provisioner>,
        exertion: &Exertion,
        args: &[Arg],
        config: &ProvisionConfig,
    ) -> Option<Self> {
        if !config.enabled || !exertion.is_provisionable() {
            return None;
        }

        let mut deployments: Vec<Deployment> = Vec::new();
        let candidates = args
            .iter()
            .filter_map(Arg::deployment)
            .chain(exertion.deployments());
        for deployment in candidates {
            if !deployments.contains(deployment) {
                deployments.push(deployment.clone());
            }
        }

        if deployments.is_empty() {
            return None;
        }
        Some(Self::new(provisioner, deployments, config.clone()))
    }

    /// Deployments this manager is responsible for.
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }

    /// Ids of the deployments currently live.
    pub fn deployed(&self) -> &[DeploymentId] {
        &self.deployed
    }

    /// Deploy every configured deployment.
    ///
    /// Configurations are validated before anything is deployed. A deploy
    /// that overruns the configured timeout is undeployed and reported as
    /// failed.
    pub fn deploy_services(&mut self) -> Result<&[DeploymentId], ProvisionError> {
        for deployment in &self.deployments {
            validate(deployment)?;
        }

        let started = Instant::now();
        let ids = self.provisioner.deploy_services(&self.deployments)?;
        self.deployed.extend(ids);

        let elapsed = started.elapsed();
        if elapsed > self.config.deploy_timeout {
            let names = self.names();
            self.undeploy();
            return Err(ProvisionError::Deploy {
                name: names,
                reason: format!(
                    "took {}ms, limit is {}ms",
                    elapsed.as_millis(),
                    self.config.deploy_timeout.as_millis()
                ),
            });
        }

        info!(
            deployments = %self.names(),
            count = self.deployed.len(),
            "Provisioned services"
        );
        Ok(&self.deployed)
    }

    /// Undeploy whatever is live. Safe to call more than once.
    pub fn undeploy(&mut self) {
        if self.deployed.is_empty() {
            return;
        }

        let ids = std::mem::take(&mut self.deployed);
        match self.provisioner.undeploy(&ids) {
            Ok(()) => debug!(count = ids.len(), "Undeployed provisioned services"),
            Err(e) => warn!(error = %e, count = ids.len(), "Undeploy failed"),
        }
    }

    fn names(&self) -> String {
        self.deployments
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Drop for ProvisionManager {
    fn drop(&mut self) {
        self.undeploy();
    }
}

fn validate(deployment: &Deployment) -> Result<(), ProvisionError> {
    if deployment.name.trim().is_empty() {
        return Err(ProvisionError::InvalidDeployment(
            "deployment has no name".into(),
        ));
    }
    if deployment.service_type.trim().is_empty() {
        return Err(ProvisionError::InvalidDeployment(format!(
            "{} has no service type",
            deployment.name
        )));
    }
    if deployment.instances == 0 {
        return Err(ProvisionError::InvalidDeployment(format!(
            "{} requests zero instances",
            deployment.name
        )));
    }
    Ok(())
}
