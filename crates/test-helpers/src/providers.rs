//! Scripted providers.

use exertion_core::{Provider, RemoteError, Transaction};
use exertion_types::{ExecState, Exertion, FaultKind, ProviderId, ThrowableTrace};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn mark_done(exertion: &mut Exertion) {
    if let Exertion::Job(job) = exertion {
        for child in job.exertions.iter_mut() {
            mark_done(child);
        }
    }
    exertion.set_status(ExecState::Done);
}

/// Provider that succeeds: marks the exertion (and any children) done and
/// writes its name at `echo/provider`.
#[derive(Debug)]
pub struct EchoProvider {
    id: ProviderId,
    name: String,
    calls: AtomicUsize,
}

impl EchoProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::random(),
            name: name.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for EchoProvider {
    fn service(
        &self,
        mut exertion: Exertion,
        _txn: Option<&Transaction>,
    ) -> Result<Exertion, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        exertion
            .context_mut()
            .put("echo/provider", self.name.clone());
        let trace = format!("{} executed {}", self.name, exertion.name());
        exertion.control_mut().append_trace(trace);
        mark_done(&mut exertion);
        Ok(exertion)
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

/// Provider that runs the exertion and reports a failure on it.
#[derive(Debug)]
pub struct FailingProvider {
    id: ProviderId,
    name: String,
    kind: FaultKind,
    reported: ExecState,
}

impl FailingProvider {
    /// Records a service-level failure and sets `Failed`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::random(),
            name: name.into(),
            kind: FaultKind::Service,
            reported: ExecState::Failed,
        }
    }

    /// Record a fault of this kind instead.
    pub fn with_kind(mut self, kind: FaultKind) -> Self {
        self.kind = kind;
        self
    }

    /// Status the provider itself reports alongside the fault.
    pub fn reporting(mut self, status: ExecState) -> Self {
        self.reported = status;
        self
    }
}

impl Provider for FailingProvider {
    fn service(
        &self,
        mut exertion: Exertion,
        _txn: Option<&Transaction>,
    ) -> Result<Exertion, RemoteError> {
        exertion.report_exception(
            ThrowableTrace::new(self.kind, format!("{} failed", self.name))
                .with_origin(self.name.clone()),
        );
        exertion.set_status(self.reported);
        Ok(exertion)
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

/// Provider whose transport always fails.
#[derive(Debug)]
pub struct UnreachableProvider {
    id: ProviderId,
    name: String,
}

impl UnreachableProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::random(),
            name: name.into(),
        }
    }
}

impl Provider for UnreachableProvider {
    fn service(
        &self,
        _exertion: Exertion,
        _txn: Option<&Transaction>,
    ) -> Result<Exertion, RemoteError> {
        Err(RemoteError::Unreachable(self.name.clone()))
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}

/// Provider requiring mutual exclusion that holds each call for a while and
/// records the highest number of overlapping calls it observed.
#[derive(Debug)]
pub struct ExclusiveProvider {
    id: ProviderId,
    name: String,
    hold: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl ExclusiveProvider {
    pub fn new(name: impl Into<String>, hold: Duration) -> Self {
        Self {
            id: ProviderId::random(),
            name: name.into(),
            hold,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Provider for ExclusiveProvider {
    fn service(
        &self,
        mut exertion: Exertion,
        _txn: Option<&Transaction>,
    ) -> Result<Exertion, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        std::thread::sleep(self.hold);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        mark_done(&mut exertion);
        Ok(exertion)
    }

    fn mutual_exclusion(&self) -> bool {
        true
    }

    fn provider_id(&self) -> ProviderId {
        self.id
    }

    fn provider_name(&self) -> &str {
        &self.name
    }
}
