//! The exertion dispatch shell.
//!
//! ```text
//! exert(exertion, txn, provider_name, args)
//!   │
//!   ├─ bind Arg::Parameter values into the context
//!   ├─ provisionable + deployments? ── ProvisionManager::deploy_services
//!   │
//!   ├─ job with one child task? ──────────── exert the task, copy status
//!   ├─ process signature not networked? ──── LocalServices / local job
//!   │
//!   ├─ corrector::apply  (unselectable → recorded, Failed)
//!   ├─ ProviderAccessor::resolve  (pull → Spacer fallback)
//!   │        └─ none → "Cannot find provider for: ..." , Failed
//!   ├─ trace "bootstrapping: name:id", bind provider
//!   ├─ mutual exclusion? ── MutexCoordinator : Provider::service
//!   │
//!   └─ fold exceptions into status, undeploy
//! ```

use crate::{corrector, DispatchConfig, DispatchError, LocalServices};
use exertion_core::{LockManager, Provider, Provisioner, ServiceRegistry, Transaction, TransactionManager};
use exertion_mutex::MutexCoordinator;
use exertion_provisions::ProvisionManager;
use exertion_registry::{AccessorStats, ProviderAccessor};
use exertion_types::{Arg, ExecState, Exertion, Job, Signature, ThrowableTrace, SPACER};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dispatches exertions to local services or resolved providers.
///
/// One processor serves any number of concurrent `exert()` calls; each call
/// runs on its caller's thread. The cataloger and lock-manager handles are
/// shared across calls, provisioning state is not.
pub struct ExertProcessor {
    accessor: Arc<ProviderAccessor>,
    mutex: MutexCoordinator,
    provisioner: Option<Arc<dyn Provisioner>>,
    local: LocalServices,
    config: DispatchConfig,
}

impl ExertProcessor {
    pub fn new(
        registry: Arc<dyn ServiceRegistry>,
        txn_manager: Arc<dyn TransactionManager>,
        config: DispatchConfig,
    ) -> Self {
        let accessor = Arc::new(ProviderAccessor::new(registry, config.registry.clone()));
        let mutex = MutexCoordinator::new(accessor.clone(), txn_manager, config.mutex.clone());
        Self {
            accessor,
            mutex,
            provisioner: None,
            local: LocalServices::new(),
            config,
        }
    }

    /// Deploy provisionable exertions' deployments through `provisioner`.
    pub fn with_provisioner(mut self, provisioner: Arc<dyn Provisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    /// Execute non-networked signatures with these services.
    pub fn with_local_services(mut self, local: LocalServices) -> Self {
        self.local = local;
        self
    }

    /// Use this lock manager instead of resolving one through the registry.
    pub fn with_lock_manager(mut self, lock_manager: Arc<dyn LockManager>) -> Self {
        self.mutex = self.mutex.with_lock_manager(lock_manager);
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn accessor(&self) -> &Arc<ProviderAccessor> {
        &self.accessor
    }

    /// Resolution counters of the underlying accessor.
    pub fn stats(&self) -> AccessorStats {
        self.accessor.stats()
    }

    /// Dispatch `exertion` and return it executed.
    ///
    /// `provider_name`, or an `Arg::ProviderName` when it is `None`, pins
    /// resolution to a named provider. Execution-level failures come back as
    /// a `Failed`/`Error` exertion with recorded exceptions; `Err` means the
    /// dispatch itself could not proceed.
    pub fn exert(
        &self,
        mut exertion: Exertion,
        txn: Option<&Transaction>,
        provider_name: Option<&str>,
        args: &[Arg],
    ) -> Result<Exertion, DispatchError> {
        let provider_name = provider_name.map(str::to_string).or_else(|| {
            args.iter().find_map(|arg| match arg {
                Arg::ProviderName(name) => Some(name.clone()),
                _ => None,
            })
        });

        substitute(&mut exertion, args)?;

        let mut provisioning = self.provisioning(&exertion, args);
        if let Some(manager) = provisioning.as_mut() {
            manager.deploy_services()?;
        }

        let result = self.dispatch(exertion, txn, provider_name.as_deref());

        if let Some(mut manager) = provisioning {
            manager.undeploy();
        }
        result
    }

    fn provisioning(&self, exertion: &Exertion, args: &[Arg]) -> Option<ProvisionManager> {
        match &self.provisioner {
            Some(provisioner) => ProvisionManager::for_exertion(
                provisioner.clone(),
                exertion,
                args,
                &self.config.provision,
            ),
            None => {
                if exertion.is_provisionable() && args.iter().any(|a| a.deployment().is_some()) {
                    warn!(exertion = %exertion.id(), "Deployments requested but no provisioner is configured");
                }
                None
            }
        }
    }

    fn dispatch(
        &self,
        mut exertion: Exertion,
        txn: Option<&Transaction>,
        provider_name: Option<&str>,
    ) -> Result<Exertion, DispatchError> {
        if let Exertion::Job(job) = &mut exertion {
            if job.exertions.len() == 1 && job.exertions[0].is_task() {
                debug!(job = %job.name, "Flattening single-task job");
                let child = job.exertions.remove(0);
                let done = self.dispatch(child, txn, provider_name)?;
                job.status = done.status();
                job.exertions.push(done);
                return Ok(exertion);
            }
        }

        exertion.bind_context();

        let local = exertion
            .process_signature()
            .is_some_and(|s| !s.is_networked());
        if local {
            let mut done = self.exert_local(exertion, txn)?;
            fold_status(&mut done);
            return Ok(done);
        }

        self.exert_remote(exertion, txn, provider_name)
    }

    fn exert_local(
        &self,
        exertion: Exertion,
        txn: Option<&Transaction>,
    ) -> Result<Exertion, DispatchError> {
        debug!(exertion = %exertion.id(), "Executing locally");
        match exertion {
            Exertion::Task(task) if task.signatures.len() == 1 => {
                Ok(self.local.do_task(task).into())
            }
            Exertion::Task(task) => Ok(self.local.do_flow(task).into()),
            Exertion::Job(job) => Ok(self.do_job(job, txn)?.into()),
        }
    }

    /// Run a local job's children one after another through the shell.
    fn do_job(&self, mut job: Job, txn: Option<&Transaction>) -> Result<Job, DispatchError> {
        let children = std::mem::take(&mut job.exertions);
        for child in children {
            let fallback = child.clone();
            let done = match self.dispatch(child, txn, None) {
                Ok(done) => done,
                Err(e @ (DispatchError::Remote(_) | DispatchError::Transaction(_))) => {
                    // The child's transport or transaction failure is recorded
                    // on a copy of what was sent; siblings keep their results.
                    warn!(job = %job.name, child = %fallback.name(), error = %e, "Child dispatch failed");
                    let mut failed = fallback;
                    failed.report_exception(
                        ThrowableTrace::service(e.to_string()).with_origin(failed.name().to_string()),
                    );
                    failed.set_status(ExecState::Failed);
                    failed
                }
                Err(e) => return Err(e),
            };
            job.exertions.push(done);
        }

        let failed = job.exertions.iter().filter(|c| c.status().is_failure()).count();
        job.status = if failed > 0 {
            ExecState::Failed
        } else {
            ExecState::Done
        };
        job.control
            .append_trace(format!("local job: {} children, {} failed", job.exertions.len(), failed));
        Ok(job)
    }

    fn exert_remote(
        &self,
        mut exertion: Exertion,
        txn: Option<&Transaction>,
        provider_name: Option<&str>,
    ) -> Result<Exertion, DispatchError> {
        let mut signature = corrector::apply(&mut exertion);
        if !signature.is_selectable() {
            warn!(exertion = %exertion.id(), signature = %signature, "Signature is not selectable");
            exertion.report_exception(
                ThrowableTrace::exertion(format!("unselectable signature: {signature}"))
                    .with_origin(exertion.name().to_string()),
            );
            exertion.set_status(ExecState::Failed);
            return Ok(exertion);
        }

        if let Some(name) = provider_name {
            signature.provider_name = name.to_string();
            exertion.set_process_signature(signature.clone());
        }

        let Some(provider) = self.resolve(&mut exertion, &mut signature) else {
            warn!(exertion = %exertion.id(), signature = %signature, "No provider");
            exertion.set_status(ExecState::Failed);
            exertion.report_exception(
                ThrowableTrace::exertion(format!("Cannot find provider for: {signature}"))
                    .with_origin(exertion.name().to_string()),
            );
            return Ok(exertion);
        };

        let name = provider.provider_name().to_string();
        let id = provider.provider_id();
        exertion
            .control_mut()
            .append_trace(format!("bootstrapping: {name}:{id}"));
        if let Some(process) = exertion.process_signature_mut() {
            process.bind_provider(id, name.clone());
        }

        let mut result = if provider.mutual_exclusion() {
            debug!(provider = %name, "Invoking under mutual exclusion");
            self.mutex.exert_exclusive(&provider, exertion, txn)?
        } else {
            provider.service(exertion, txn)?
        };

        fold_status(&mut result);
        info!(
            exertion = %result.id(),
            provider = %name,
            status = %result.status(),
            "Exertion returned"
        );
        Ok(result)
    }

    /// Resolve the provider for `signature`, falling back to a Spacer for
    /// pull access. On fallback the exertion and `signature` are retargeted.
    fn resolve(
        &self,
        exertion: &mut Exertion,
        signature: &mut Signature,
    ) -> Option<Arc<dyn Provider>> {
        if let Some(provider) = self.accessor.resolve(signature) {
            return Some(provider);
        }

        let pull = exertion.control().access_type.is_pull();
        if !pull || !self.config.spacer_fallback || signature.targets(SPACER) {
            return None;
        }

        let spacer = Signature::spacer();
        let provider = self.accessor.resolve(&spacer)?;
        debug!(exertion = %exertion.id(), "Falling back to Spacer");
        *signature = spacer;
        exertion.set_process_signature(signature.clone());
        Some(provider)
    }
}

/// Bind `Arg::Parameter` values into the exertion's context, and into the
/// task of a single-task job.
fn substitute(exertion: &mut Exertion, args: &[Arg]) -> Result<(), DispatchError> {
    for arg in args {
        if let Arg::Parameter { path, value } = arg {
            if path.trim().is_empty() {
                return Err(DispatchError::Exertion(format!(
                    "parameter with empty path for {}",
                    exertion.name()
                )));
            }
            exertion.context_mut().put(path.clone(), value.clone());
            // A single-task job is flattened to its task, which must see them too.
            if let Exertion::Job(job) = exertion {
                if let [child @ Exertion::Task(_)] = job.exertions.as_mut_slice() {
                    child.context_mut().put(path.clone(), value.clone());
                }
            }
        }
    }
    Ok(())
}

/// Derive the exertion's status from the exceptions recorded on it and its
/// descendants.
///
/// Any runtime fault makes it `Error`, any other fault `Failed`. With no
/// recorded faults the status is left as the provider set it.
pub fn fold_status(exertion: &mut Exertion) {
    let exceptions = exertion.all_exceptions();
    if exceptions.is_empty() {
        return;
    }
    let status = if exceptions.iter().any(|e| e.is_runtime()) {
        ExecState::Error
    } else {
        ExecState::Failed
    };
    exertion.set_status(status);
}

#[cfg(test)]
mod tests {
    use super::*;
    use exertion_core::ServiceItem;
    use exertion_registry::RegistryConfig;
    use exertion_simulation::{InMemoryRegistry, LocalTransactionManager};
    use exertion_test_helpers::{job_of, net_task, operands, Arithmetic, EchoProvider};
    use exertion_types::{Task, Value};
    use tracing_test::traced_test;

    fn processor(registry: Arc<InMemoryRegistry>) -> ExertProcessor {
        let config = DispatchConfig::default()
            .with_registry(RegistryConfig::no_wait().without_cataloger());
        ExertProcessor::new(registry, Arc::new(LocalTransactionManager::new()), config)
    }

    #[test]
    fn test_fold_leaves_clean_status_alone() {
        let mut ex: Exertion = net_task("t", "Echo", "run").into();
        ex.set_status(ExecState::Done);
        fold_status(&mut ex);
        assert_eq!(ex.status(), ExecState::Done);
    }

    #[test]
    fn test_fold_runtime_beats_other_faults() {
        let mut child: Exertion = net_task("c", "Echo", "run").into();
        child.report_exception(ThrowableTrace::runtime("oom"));
        let mut job: Exertion = Job::new("j").with_exertion(child).into();
        job.report_exception(ThrowableTrace::service("refused"));
        job.set_status(ExecState::Done);

        fold_status(&mut job);
        assert_eq!(job.status(), ExecState::Error);
    }

    #[test]
    fn test_fold_overrides_provider_done() {
        let mut ex: Exertion = net_task("t", "Echo", "run").into();
        ex.set_status(ExecState::Done);
        ex.report_exception(ThrowableTrace::service("partial"));
        fold_status(&mut ex);
        assert_eq!(ex.status(), ExecState::Failed);
    }

    #[test]
    fn test_parameters_are_bound() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_provider(Arc::new(EchoProvider::new("echo")), &["Echo"]);

        let result = processor(registry)
            .exert(
                net_task("t", "Echo", "run").into(),
                None,
                None,
                &[Arg::parameter("arg/x", 10)],
            )
            .unwrap();

        assert_eq!(result.context().get("arg/x"), Some(&Value::from(10)));
        assert_eq!(result.context().owner(), Some(result.id()));
    }

    #[test]
    fn test_empty_parameter_path_is_fatal() {
        let err = processor(Arc::new(InMemoryRegistry::new()))
            .exert(
                net_task("t", "Echo", "run").into(),
                None,
                None,
                &[Arg::parameter(" ", 1)],
            )
            .unwrap_err();
        assert!(matches!(err, DispatchError::Exertion(_)));
    }

    #[test]
    fn test_provider_name_arg_pins_resolution() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_provider(Arc::new(EchoProvider::new("echo-a")), &["Echo"]);
        registry.register_provider(Arc::new(EchoProvider::new("echo-b")), &["Echo"]);

        let result = processor(registry)
            .exert(
                net_task("t", "Echo", "run").into(),
                None,
                None,
                &[Arg::ProviderName("echo-b".into())],
            )
            .unwrap();

        assert_eq!(result.context().get("echo/provider"), Some(&Value::from("echo-b")));
        let bound = result.process_signature().and_then(|s| s.provider()).unwrap();
        assert_eq!(bound.name, "echo-b");
        assert_eq!(result.process_signature().unwrap().provider_name, "echo-b");
    }

    #[test]
    fn test_explicit_provider_name_wins_over_arg() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_provider(Arc::new(EchoProvider::new("echo-a")), &["Echo"]);
        registry.register_provider(Arc::new(EchoProvider::new("echo-b")), &["Echo"]);

        let result = processor(registry)
            .exert(
                net_task("t", "Echo", "run").into(),
                None,
                Some("echo-a"),
                &[Arg::ProviderName("echo-b".into())],
            )
            .unwrap();

        assert_eq!(result.context().get("echo/provider"), Some(&Value::from("echo-a")));
    }

    #[test]
    fn test_local_task_skips_registry() {
        let registry = Arc::new(InMemoryRegistry::new());
        let processor = processor(registry.clone())
            .with_local_services(LocalServices::new().with("Arithmetic", Arc::new(Arithmetic)));

        let task = Task::new("add", Signature::local("Arithmetic", "add")).with_context(operands(4, 5));
        let result = processor.exert(task.into(), None, None, &[]).unwrap();

        assert_eq!(result.status(), ExecState::Done);
        assert_eq!(result.context().get("result"), Some(&Value::from(9)));
        assert_eq!(registry.lookup_count(), 0);
    }

    #[test]
    fn test_local_job_folds_children() {
        let registry = Arc::new(InMemoryRegistry::new());
        let processor = processor(registry)
            .with_local_services(LocalServices::new().with("Arithmetic", Arc::new(Arithmetic)));

        let ok = Task::new("ok", Signature::local("Arithmetic", "add")).with_context(operands(1, 2));
        let bad = Task::new("bad", Signature::local("Arithmetic", "fail"));
        let job = Job::new("local-job")
            .with_signature(Signature::local("Jobber", "service"))
            .with_exertion(ok)
            .with_exertion(bad);

        let result = processor.exert(job.into(), None, None, &[]).unwrap();

        assert_eq!(result.status(), ExecState::Failed);
        let children = result.children();
        assert_eq!(children[0].status(), ExecState::Done);
        assert_eq!(children[0].context().get("result"), Some(&Value::from(3)));
        assert_eq!(children[1].status(), ExecState::Failed);
    }

    #[traced_test]
    #[test]
    fn test_flattened_job_copies_child_status() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_provider(Arc::new(EchoProvider::new("echo")), &["Echo"]);

        let job = job_of("j1", [net_task("t2", "Echo", "run")]);
        let result = processor(registry).exert(job.into(), None, None, &[]).unwrap();

        assert!(result.is_job());
        assert_eq!(result.status(), ExecState::Done);
        assert_eq!(result.children()[0].status(), ExecState::Done);
        assert!(logs_contain("Flattening single-task job"));
    }

    #[test]
    fn test_flattened_job_task_sees_parameters() {
        let processor = processor(Arc::new(InMemoryRegistry::new()))
            .with_local_services(LocalServices::new().with("Arithmetic", Arc::new(Arithmetic)));

        let job = job_of("j", [Task::new("add", Signature::local("Arithmetic", "add"))]);
        let result = processor
            .exert(
                job.into(),
                None,
                None,
                &[Arg::parameter("arg/x", 2), Arg::parameter("arg/y", 3)],
            )
            .unwrap();

        assert_eq!(result.status(), ExecState::Done);
        let task = &result.children()[0];
        assert_eq!(task.context().get("result"), Some(&Value::from(5)));
        assert_eq!(result.context().get("arg/x"), Some(&Value::from(2)));
    }

    #[test]
    fn test_job_with_local_signature_and_one_child_is_flattened() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register_provider(Arc::new(EchoProvider::new("echo")), &["Echo"]);

        let job = Job::new("j")
            .with_signature(Signature::local("Jobber", "service"))
            .with_exertion(net_task("t", "Echo", "run"));
        let result = processor(registry).exert(job.into(), None, None, &[]).unwrap();

        assert_eq!(result.status(), ExecState::Done);
        assert_eq!(
            result.children()[0].context().get("echo/provider"),
            Some(&Value::from("echo"))
        );
    }

    #[test]
    fn test_non_provider_item_does_not_resolve() {
        let registry = Arc::new(InMemoryRegistry::new());
        registry.register(
            ServiceItem::new(
                exertion_types::ServiceId(1),
                exertion_core::ServiceHandle::Cataloger(Arc::new(
                    exertion_simulation::InMemoryCataloger::new(),
                )),
            )
            .with_type("Echo"),
        );

        let result = processor(registry)
            .exert(net_task("t", "Echo", "run").into(), None, None, &[])
            .unwrap();
        assert_eq!(result.status(), ExecState::Failed);
    }
}
