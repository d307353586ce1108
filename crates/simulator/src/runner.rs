//! Scenario runner.

use crate::{
    Behavior, ExertionReport, ExertionSpec, ProviderSpec, ScenarioConfig, ScenarioReport,
    SimulatorError,
};
use exertion_core::{Entry, Provider, ServiceHandle, ServiceItem};
use exertion_dispatch::{ExertProcessor, LocalServices};
use exertion_mutex::LocalLockManager;
use exertion_simulation::{
    InMemoryCataloger, InMemoryRegistry, LocalTransactionManager, SimProvisioner, TxnState,
};
use exertion_test_helpers::{
    Arithmetic, EchoProvider, ExclusiveProvider, FailingProvider, UnreachableProvider,
};
use exertion_types::{
    Deployment, ExecState, Exertion, ExertionId, FaultKind, ServiceId, CATALOGER, LOCK_MANAGER,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Service id of the scenario's cataloger.
const CATALOGER_ID: ServiceId = ServiceId(1);
/// Service id of the scenario's lock manager.
const LOCK_MANAGER_ID: ServiceId = ServiceId(2);
/// Service type the built-in local arithmetic service answers to.
pub const ARITHMETIC: &str = "Arithmetic";

/// In-process grid wired for one scenario.
///
/// Owns the registry, an optional cataloger, the lock and transaction
/// managers and a provisioner, and dispatches through one shared
/// [`ExertProcessor`].
pub struct Simulator {
    registry: Arc<InMemoryRegistry>,
    cataloger: Option<Arc<InMemoryCataloger>>,
    txns: Arc<LocalTransactionManager>,
    provisioner: Arc<SimProvisioner>,
    processor: ExertProcessor,
    exclusive: Vec<Arc<ExclusiveProvider>>,
}

impl Simulator {
    /// Build the grid and register the scenario's providers.
    pub fn new(scenario: &ScenarioConfig) -> Self {
        let registry = Arc::new(InMemoryRegistry::new());
        let txns = Arc::new(LocalTransactionManager::new());
        let locks = Arc::new(LocalLockManager::new());
        txns.join(locks.clone());
        registry.register(
            ServiceItem::new(LOCK_MANAGER_ID, ServiceHandle::LockManager(locks))
                .with_type(LOCK_MANAGER),
        );

        let cataloger = scenario.cataloger.then(|| {
            let cataloger = Arc::new(InMemoryCataloger::new());
            registry.register(
                ServiceItem::new(CATALOGER_ID, ServiceHandle::Cataloger(cataloger.clone()))
                    .with_type(CATALOGER),
            );
            cataloger
        });

        let provisioner = Arc::new(SimProvisioner::new(
            registry.clone(),
            Box::new(|deployment: &Deployment| {
                Arc::new(EchoProvider::new(deployment.name.clone())) as Arc<dyn Provider>
            }),
        ));

        let processor = ExertProcessor::new(
            registry.clone(),
            txns.clone(),
            scenario.dispatch.clone(),
        )
        .with_provisioner(provisioner.clone())
        .with_local_services(LocalServices::new().with(ARITHMETIC, Arc::new(Arithmetic)));

        let mut simulator = Self {
            registry,
            cataloger,
            txns,
            provisioner,
            processor,
            exclusive: Vec::new(),
        };
        for spec in &scenario.providers {
            simulator.register(spec);
        }
        simulator
    }

    /// Register a scripted provider with the registry and, if present, the
    /// cataloger.
    pub fn register(&mut self, spec: &ProviderSpec) -> ServiceId {
        let provider: Arc<dyn Provider> = match spec.behavior {
            Behavior::Echo => Arc::new(EchoProvider::new(spec.name.clone())),
            Behavior::Fail => Arc::new(FailingProvider::new(spec.name.clone())),
            Behavior::Crash => Arc::new(
                FailingProvider::new(spec.name.clone())
                    .with_kind(FaultKind::Runtime)
                    .reporting(ExecState::Error),
            ),
            Behavior::Exclusive => {
                let provider = Arc::new(ExclusiveProvider::new(spec.name.clone(), spec.hold()));
                self.exclusive.push(provider.clone());
                provider
            }
            Behavior::Unreachable => Arc::new(UnreachableProvider::new(spec.name.clone())),
        };

        let id = self
            .registry
            .register_provider(provider.clone(), &[spec.service_type.as_str()]);
        if let Some(cataloger) = &self.cataloger {
            cataloger.register(
                ServiceItem::new(id, ServiceHandle::Provider(provider))
                    .with_type(spec.service_type.clone())
                    .with_attribute(Entry::Name(spec.name.clone())),
            );
        }
        debug!(name = %spec.name, service_type = %spec.service_type, behavior = ?spec.behavior, "Registered provider");
        id
    }

    pub fn processor(&self) -> &ExertProcessor {
        &self.processor
    }

    pub fn provisioner(&self) -> &Arc<SimProvisioner> {
        &self.provisioner
    }

    /// Dispatch every exertion of the scenario and collect the outcomes.
    pub fn run(&self, scenario: &ScenarioConfig) -> Result<ScenarioReport, SimulatorError> {
        if scenario.exertions.is_empty() {
            return Err(SimulatorError::Empty);
        }
        info!(
            scenario = %scenario.name,
            dispatches = scenario.total_dispatches(),
            "Running scenario"
        );

        let mut results = Vec::with_capacity(scenario.total_dispatches());
        for spec in &scenario.exertions {
            if spec.concurrent && spec.repeat > 1 {
                results.extend(self.exert_concurrently(spec));
            } else {
                for _ in 0..spec.repeat {
                    results.push(self.exert_one(spec));
                }
            }
        }

        let report = ScenarioReport {
            name: scenario.name.clone(),
            results,
            max_exclusive_in_flight: self
                .exclusive
                .iter()
                .map(|p| p.max_in_flight())
                .max()
                .unwrap_or(0),
            committed_txns: self.txns.count(TxnState::Committed),
            aborted_txns: self.txns.count(TxnState::Aborted),
        };
        info!(scenario = %report.name, summary = ?report.summary(), "Scenario finished");
        Ok(report)
    }

    fn exert_concurrently(&self, spec: &ExertionSpec) -> Vec<ExertionReport> {
        std::thread::scope(|s| {
            let handles: Vec<_> = (0..spec.repeat)
                .map(|_| s.spawn(|| self.exert_one(spec)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(report) => report,
                    Err(_) => ExertionReport::from_error(
                        spec.exertion.name(),
                        "dispatch thread panicked",
                        Default::default(),
                    ),
                })
                .collect()
        })
    }

    fn exert_one(&self, spec: &ExertionSpec) -> ExertionReport {
        let exertion = fresh_copy(&spec.exertion);
        let started = Instant::now();
        match self
            .processor
            .exert(exertion, None, spec.provider_name.as_deref(), &spec.args)
        {
            Ok(result) => ExertionReport::from_result(&result, started.elapsed()),
            Err(e) => ExertionReport::from_error(spec.exertion.name(), e, started.elapsed()),
        }
    }
}

/// Copy of `exertion` with new ids throughout the tree.
fn fresh_copy(exertion: &Exertion) -> Exertion {
    let mut copy = exertion.clone();
    renew_ids(&mut copy);
    copy
}

fn renew_ids(exertion: &mut Exertion) {
    match exertion {
        Exertion::Task(task) => task.id = ExertionId::random(),
        Exertion::Job(job) => {
            job.id = ExertionId::random();
            job.exertions.iter_mut().for_each(renew_ids);
        }
    }
}

/// Build a simulator for `scenario` and run it.
pub fn run_scenario(scenario: &ScenarioConfig) -> Result<ScenarioReport, SimulatorError> {
    Simulator::new(scenario).run(scenario)
}
