//! Tasks, jobs and the `Exertion` sum type.

use crate::{ControlContext, Context, Deployment, ExertionId, Signature, ThrowableTrace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution state of an exertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecState {
    #[default]
    Initial,
    Running,
    Done,
    Failed,
    /// Failed with a host/runtime error.
    Error,
    Suspended,
}

impl ExecState {
    /// Whether the state records a failure.
    pub fn is_failure(self) -> bool {
        matches!(self, ExecState::Failed | ExecState::Error)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExecState::Done | ExecState::Failed | ExecState::Error)
    }
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecState::Initial => "INITIAL",
            ExecState::Running => "RUNNING",
            ExecState::Done => "DONE",
            ExecState::Failed => "FAILED",
            ExecState::Error => "ERROR",
            ExecState::Suspended => "SUSPENDED",
        };
        f.pad(s)
    }
}

/// Discriminator for [`Exertion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExertionKind {
    Task,
    Job,
}

/// Leaf unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default = "ExertionId::random")]
    pub id: ExertionId,
    pub name: String,
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub context: Context,
    #[serde(default)]
    pub control: ControlContext,
    #[serde(default)]
    pub status: ExecState,
}

impl Task {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            id: ExertionId::random(),
            name: name.into(),
            signatures: vec![signature],
            context: Context::default(),
            control: ControlContext::default(),
            status: ExecState::Initial,
        }
    }

    /// Add a further signature (pre/post/append or an alternative process).
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_control(mut self, control: ControlContext) -> Self {
        self.control = control;
        self
    }
}

/// Composite unit of work: an ordered sequence of child exertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default = "ExertionId::random")]
    pub id: ExertionId,
    pub name: String,
    #[serde(default)]
    pub signatures: Vec<Signature>,
    #[serde(default)]
    pub exertions: Vec<Exertion>,
    #[serde(default)]
    pub context: Context,
    #[serde(default)]
    pub control: ControlContext,
    #[serde(default)]
    pub status: ExecState,
}

impl Job {
    /// A job with no signature; dispatch synthesizes the rendezvous one.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ExertionId::random(),
            name: name.into(),
            signatures: Vec::new(),
            exertions: Vec::new(),
            context: Context::default(),
            control: ControlContext::default(),
            status: ExecState::Initial,
        }
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn with_exertion(mut self, exertion: impl Into<Exertion>) -> Self {
        self.exertions.push(exertion.into());
        self
    }

    pub fn with_control(mut self, control: ControlContext) -> Self {
        self.control = control;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn len(&self) -> usize {
        self.exertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exertions.is_empty()
    }
}

/// A unit of work submitted for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Exertion {
    Task(Task),
    Job(Job),
}

impl From<Task> for Exertion {
    fn from(task: Task) -> Self {
        Exertion::Task(task)
    }
}

impl From<Job> for Exertion {
    fn from(job: Job) -> Self {
        Exertion::Job(job)
    }
}

impl Exertion {
    pub fn kind(&self) -> ExertionKind {
        match self {
            Exertion::Task(_) => ExertionKind::Task,
            Exertion::Job(_) => ExertionKind::Job,
        }
    }

    pub fn is_job(&self) -> bool {
        self.kind() == ExertionKind::Job
    }

    pub fn is_task(&self) -> bool {
        self.kind() == ExertionKind::Task
    }

    pub fn id(&self) -> ExertionId {
        match self {
            Exertion::Task(t) => t.id,
            Exertion::Job(j) => j.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Exertion::Task(t) => &t.name,
            Exertion::Job(j) => &j.name,
        }
    }

    pub fn status(&self) -> ExecState {
        match self {
            Exertion::Task(t) => t.status,
            Exertion::Job(j) => j.status,
        }
    }

    pub fn set_status(&mut self, status: ExecState) {
        match self {
            Exertion::Task(t) => t.status = status,
            Exertion::Job(j) => j.status = status,
        }
    }

    pub fn context(&self) -> &Context {
        match self {
            Exertion::Task(t) => &t.context,
            Exertion::Job(j) => &j.context,
        }
    }

    pub fn context_mut(&mut self) -> &mut Context {
        match self {
            Exertion::Task(t) => &mut t.context,
            Exertion::Job(j) => &mut j.context,
        }
    }

    pub fn control(&self) -> &ControlContext {
        match self {
            Exertion::Task(t) => &t.control,
            Exertion::Job(j) => &j.control,
        }
    }

    pub fn control_mut(&mut self) -> &mut ControlContext {
        match self {
            Exertion::Task(t) => &mut t.control,
            Exertion::Job(j) => &mut j.control,
        }
    }

    pub fn signatures(&self) -> &[Signature] {
        match self {
            Exertion::Task(t) => &t.signatures,
            Exertion::Job(j) => &j.signatures,
        }
    }

    fn signatures_mut(&mut self) -> &mut Vec<Signature> {
        match self {
            Exertion::Task(t) => &mut t.signatures,
            Exertion::Job(j) => &mut j.signatures,
        }
    }

    /// The signature driving dispatch: the first one of a process type.
    pub fn process_signature(&self) -> Option<&Signature> {
        self.signatures().iter().find(|s| s.is_process())
    }

    pub fn process_signature_mut(&mut self) -> Option<&mut Signature> {
        self.signatures_mut().iter_mut().find(|s| s.is_process())
    }

    /// Replace the process signature, keeping its position.
    ///
    /// The exertion keeps exactly one process signature: when none exists the
    /// new one is placed first.
    pub fn set_process_signature(&mut self, signature: Signature) {
        let signatures = self.signatures_mut();
        match signatures.iter().position(|s| s.is_process()) {
            Some(index) => signatures[index] = signature,
            None => signatures.insert(0, signature),
        }
    }

    /// Bind the context back to this exertion.
    pub fn bind_context(&mut self) {
        let id = self.id();
        self.context_mut().set_owner(id);
    }

    pub fn is_provisionable(&self) -> bool {
        self.control().provisionable
    }

    /// Record a failure on this exertion's control context.
    pub fn report_exception(&mut self, exception: ThrowableTrace) {
        self.control_mut().add_exception(exception);
    }

    /// Children of a job; empty for tasks.
    pub fn children(&self) -> &[Exertion] {
        match self {
            Exertion::Task(_) => &[],
            Exertion::Job(j) => &j.exertions,
        }
    }

    /// Every recorded failure in this exertion and, for jobs, all descendants.
    pub fn all_exceptions(&self) -> Vec<&ThrowableTrace> {
        let mut out: Vec<&ThrowableTrace> = self.control().exceptions().iter().collect();
        for child in self.children() {
            out.extend(child.all_exceptions());
        }
        out
    }

    /// Deployment configurations declared by signatures in this exertion tree.
    pub fn deployments(&self) -> Vec<&Deployment> {
        let mut out: Vec<&Deployment> = self
            .signatures()
            .iter()
            .filter_map(|s| s.deployment.as_ref())
            .collect();
        for child in self.children() {
            out.extend(child.deployments());
        }
        out
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Exertion::Task(t) => Some(t),
            Exertion::Job(_) => None,
        }
    }

    pub fn as_job(&self) -> Option<&Job> {
        match self {
            Exertion::Job(j) => Some(j),
            Exertion::Task(_) => None,
        }
    }
}

impl fmt::Display for Exertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exertion::Task(t) => write!(f, "task {} [{}]", t.name, t.status),
            Exertion::Job(j) => write!(f, "job {} [{}] ({} children)", j.name, j.status, j.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Signature, SignatureType};

    fn calc() -> Task {
        Task::new("t1", Signature::net("Calculator", "add"))
    }

    #[test]
    fn test_process_signature_skips_pre_and_post() {
        let task = Task::new(
            "t",
            Signature::local("Log", "open").with_type(SignatureType::Pre),
        )
        .with_signature(Signature::local("Calc", "add"))
        .with_signature(Signature::local("Log", "close").with_type(SignatureType::Post));
        let ex = Exertion::from(task);
        assert_eq!(ex.process_signature().map(|s| s.selector.as_str()), Some("add"));
    }

    #[test]
    fn test_set_process_signature_replaces_in_place() {
        let mut ex = Exertion::from(calc());
        ex.set_process_signature(Signature::net("Adder", "sum"));
        assert_eq!(ex.signatures().len(), 1);
        assert_eq!(ex.process_signature().map(|s| s.service_type.as_str()), Some("Adder"));
    }

    #[test]
    fn test_set_process_signature_on_empty_job() {
        let mut ex = Exertion::from(Job::new("j"));
        assert!(ex.process_signature().is_none());
        ex.set_process_signature(Signature::jobber());
        assert_eq!(ex.signatures().len(), 1);
        assert!(ex.process_signature().is_some());
    }

    #[test]
    fn test_all_exceptions_walks_children() {
        let mut child = Exertion::from(calc());
        child.report_exception(ThrowableTrace::runtime("inner"));
        let mut job = Exertion::from(Job::new("j").with_exertion(child));
        job.report_exception(ThrowableTrace::exertion("outer"));

        let messages: Vec<_> = job.all_exceptions().iter().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["outer", "inner"]);
    }

    #[test]
    fn test_bind_context_sets_owner() {
        let mut ex = Exertion::from(calc());
        let id = ex.id();
        ex.bind_context();
        assert_eq!(ex.context().owner(), Some(id));
    }

    #[test]
    fn test_deployments_collects_tree() {
        let sig = Signature::net("Echo", "run").with_deployment(Deployment::new("echo", "Echo"));
        let job = Exertion::from(Job::new("j").with_exertion(Task::new("t", sig)));
        assert_eq!(job.deployments().len(), 1);
    }

    #[test]
    fn test_exec_state_predicates() {
        assert!(ExecState::Failed.is_failure());
        assert!(ExecState::Error.is_failure());
        assert!(!ExecState::Done.is_failure());
        assert!(ExecState::Done.is_terminal());
        assert!(!ExecState::Running.is_terminal());
    }

    #[test]
    fn test_exertion_json_tagging() {
        let json = r#"{"kind":"task","name":"t","signatures":[{"service_type":"Echo","selector":"run"}]}"#;
        let ex: Exertion = serde_json::from_str(json).unwrap();
        assert!(ex.is_task());
        assert_eq!(ex.status(), ExecState::Initial);
    }
}
