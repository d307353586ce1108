//! Provisioner deploying providers into an in-memory registry.

use crate::InMemoryRegistry;
use exertion_core::{Provider, ProvisionError, Provisioner};
use exertion_types::{Deployment, DeploymentId, ServiceId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the provider instance for a deployment.
pub type ProviderFactory = Box<dyn Fn(&Deployment) -> Arc<dyn Provider> + Send + Sync>;

/// Deploys providers by registering factory-built instances in an
/// [`InMemoryRegistry`], and removes them again on undeploy.
pub struct SimProvisioner {
    registry: Arc<InMemoryRegistry>,
    factory: ProviderFactory,
    deployed: Mutex<HashMap<DeploymentId, Vec<ServiceId>>>,
    next_id: AtomicU64,
    fail_deploy: AtomicBool,
    fail_undeploy: AtomicBool,
    undeploy_calls: AtomicU64,
}

impl SimProvisioner {
    pub fn new(registry: Arc<InMemoryRegistry>, factory: ProviderFactory) -> Self {
        Self {
            registry,
            factory,
            deployed: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            fail_deploy: AtomicBool::new(false),
            fail_undeploy: AtomicBool::new(false),
            undeploy_calls: AtomicU64::new(0),
        }
    }

    /// Make subsequent deploys fail.
    pub fn set_fail_deploy(&self, fail: bool) {
        self.fail_deploy.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent undeploys fail after removing the services.
    pub fn set_fail_undeploy(&self, fail: bool) {
        self.fail_undeploy.store(fail, Ordering::Relaxed);
    }

    /// Deployments currently live.
    pub fn active_deployments(&self) -> usize {
        self.deployed.lock().len()
    }

    pub fn undeploy_calls(&self) -> u64 {
        self.undeploy_calls.load(Ordering::Relaxed)
    }
}

impl Provisioner for SimProvisioner {
    fn deploy_services(
        &self,
        deployments: &[Deployment],
    ) -> Result<Vec<DeploymentId>, ProvisionError> {
        let mut ids = Vec::with_capacity(deployments.len());
        for deployment in deployments {
            if self.fail_deploy.load(Ordering::Relaxed) {
                return Err(ProvisionError::Deploy {
                    name: deployment.name.clone(),
                    reason: "provisioner refused".into(),
                });
            }

            let services = (0..deployment.instances)
                .map(|_| {
                    let provider = (self.factory)(deployment);
                    self.registry
                        .register_provider(provider, &[deployment.service_type.as_str()])
                })
                .collect::<Vec<_>>();

            let id = DeploymentId(self.next_id.fetch_add(1, Ordering::Relaxed));
            info!(
                deployment = %id,
                name = %deployment.name,
                instances = services.len(),
                "Deployed services"
            );
            self.deployed.lock().insert(id, services);
            ids.push(id);
        }
        Ok(ids)
    }

    fn undeploy(&self, deployments: &[DeploymentId]) -> Result<(), ProvisionError> {
        self.undeploy_calls.fetch_add(1, Ordering::Relaxed);
        let mut unknown = Vec::new();
        for id in deployments {
            match self.deployed.lock().remove(id) {
                Some(services) => {
                    for service in services {
                        self.registry.unregister(service);
                    }
                    debug!(deployment = %id, "Undeployed services");
                }
                None => unknown.push(id.to_string()),
            }
        }

        if self.fail_undeploy.load(Ordering::Relaxed) {
            return Err(ProvisionError::Undeploy("provisioner refused".into()));
        }
        if !unknown.is_empty() {
            return Err(ProvisionError::Undeploy(format!(
                "unknown deployments: {}",
                unknown.join(", ")
            )));
        }
        Ok(())
    }
}
