//! In-process execution of non-networked tasks.

use exertion_core::{LocalService, ServiceError};
use exertion_types::{ExecState, Signature, SignatureType, Task, ThrowableTrace};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Local service objects, keyed by the service type they implement.
#[derive(Clone, Default)]
pub struct LocalServices {
    services: HashMap<String, Arc<dyn LocalService>>,
}

impl std::fmt::Debug for LocalServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.services.keys()).finish()
    }
}

impl LocalServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` for `service_type`, replacing any previous one.
    pub fn register(&mut self, service_type: impl Into<String>, service: Arc<dyn LocalService>) {
        self.services.insert(service_type.into(), service);
    }

    pub fn with(mut self, service_type: impl Into<String>, service: Arc<dyn LocalService>) -> Self {
        self.register(service_type, service);
        self
    }

    pub fn get(&self, service_type: &str) -> Option<&Arc<dyn LocalService>> {
        self.services.get(service_type)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Run a single-signature task's process operation.
    pub fn do_task(&self, task: Task) -> Task {
        let Some(signature) = task.signatures.iter().find(|s| s.is_process()).cloned() else {
            return fail(task, ThrowableTrace::exertion("task has no process signature"));
        };
        self.run(task, &[signature])
    }

    /// Run a multi-signature task as a control flow.
    ///
    /// Signatures run over one shared context: every `Append`, then every
    /// `Pre`, then the process signature, then every `Post`, each group in
    /// declaration order. The first failure stops the flow.
    pub fn do_flow(&self, task: Task) -> Task {
        let Some(process) = task.signatures.iter().find(|s| s.is_process()).cloned() else {
            return fail(task, ThrowableTrace::exertion("task has no process signature"));
        };

        let flow: Vec<Signature> = of_type(&task.signatures, SignatureType::Append)
            .chain(of_type(&task.signatures, SignatureType::Pre))
            .chain(std::iter::once(process))
            .chain(of_type(&task.signatures, SignatureType::Post))
            .collect();

        self.run(task, &flow)
    }

    fn run(&self, mut task: Task, flow: &[Signature]) -> Task {
        for signature in flow {
            let Some(service) = self.get(&signature.service_type) else {
                let trace = ThrowableTrace::exertion(format!(
                    "no local service for: {}",
                    signature.service_type
                ));
                return fail(task, trace);
            };

            let context = std::mem::take(&mut task.context);
            let owner = context.owner();
            match service.exec(&signature.selector, context.clone()) {
                Ok(mut updated) => {
                    if let Some(owner) = owner {
                        updated.set_owner(owner);
                    }
                    task.context = updated;
                    task.control.append_trace(format!("local: {signature}"));
                    debug!(task = %task.name, signature = %signature, "Local operation done");
                }
                Err(e) => {
                    task.context = context;
                    return fail(task, fault(&e, signature));
                }
            }
        }

        task.status = ExecState::Done;
        task
    }
}

fn of_type(
    signatures: &[Signature],
    sig_type: SignatureType,
) -> impl Iterator<Item = Signature> + '_ {
    signatures
        .iter()
        .filter(move |s| s.sig_type == sig_type)
        .cloned()
}

fn fault(err: &ServiceError, signature: &Signature) -> ThrowableTrace {
    let message = format!("{signature}: {err}");
    let trace = if err.is_runtime() {
        ThrowableTrace::runtime(message)
    } else {
        ThrowableTrace::service(message)
    };
    trace.with_origin(signature.service_type.clone())
}

fn fail(mut task: Task, trace: ThrowableTrace) -> Task {
    warn!(task = %task.name, error = %trace, "Local execution failed");
    task.status = if trace.is_runtime() {
        ExecState::Error
    } else {
        ExecState::Failed
    };
    task.control.add_exception(trace);
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use exertion_test_helpers::{operands, Arithmetic};
    use exertion_types::{FaultKind, Value};

    fn services() -> LocalServices {
        LocalServices::new().with("Arithmetic", Arc::new(Arithmetic))
    }

    fn local(selector: &str) -> Signature {
        Signature::local("Arithmetic", selector)
    }

    #[test]
    fn test_single_signature_task() {
        let task = Task::new("add", local("add")).with_context(operands(2, 3));
        let done = services().do_task(task);

        assert_eq!(done.status, ExecState::Done);
        assert_eq!(done.context.get("result"), Some(&Value::from(5)));
        assert_eq!(done.control.trace(), ["local: Arithmetic.add@*".to_string()]);
    }

    #[test]
    fn test_flow_runs_append_pre_process_post() {
        // Declared out of order on purpose.
        let task = Task::new("flow", local("double").with_type(SignatureType::Post))
            .with_signature(local("add"))
            .with_signature(local("stamp").with_type(SignatureType::Pre))
            .with_signature(local("multiply").with_type(SignatureType::Append))
            .with_context(operands(3, 4));

        let done = services().do_flow(task);

        assert_eq!(done.status, ExecState::Done);
        // multiply (12) is overwritten by add (7), then doubled by post.
        assert_eq!(done.context.get("result"), Some(&Value::from(14)));
        assert_eq!(done.context.get("stamp"), Some(&Value::from(true)));
        let order: Vec<_> = done.control.trace().iter().map(String::as_str).collect();
        assert_eq!(
            order,
            vec![
                "local: Arithmetic.multiply@*",
                "local: Arithmetic.stamp@*",
                "local: Arithmetic.add@*",
                "local: Arithmetic.double@*",
            ]
        );
    }

    #[test]
    fn test_flow_stops_at_first_failure() {
        let task = Task::new("flow", local("add"))
            .with_signature(local("fail").with_type(SignatureType::Pre))
            .with_context(operands(1, 1));

        let done = services().do_flow(task);

        assert_eq!(done.status, ExecState::Failed);
        assert!(done.context.get("result").is_none());
        assert_eq!(done.control.exceptions()[0].kind, FaultKind::Service);
        assert_eq!(done.control.exceptions()[0].origin.as_deref(), Some("Arithmetic"));
    }

    #[test]
    fn test_runtime_fault_is_error() {
        let done = services().do_task(Task::new("crash", local("crash")));
        assert_eq!(done.status, ExecState::Error);
        assert!(done.control.exceptions()[0].is_runtime());
    }

    #[test]
    fn test_unknown_service_type() {
        let done = services().do_task(Task::new("t", Signature::local("Nope", "add")));
        assert_eq!(done.status, ExecState::Failed);
        assert!(done.control.exceptions()[0].message.contains("no local service for: Nope"));
    }

    #[test]
    fn test_owner_survives_local_service() {
        let mut task = Task::new("add", local("add")).with_context(operands(1, 2));
        task.context.set_owner(task.id);
        let id = task.id;

        let done = services().do_task(task);
        assert_eq!(done.context.owner(), Some(id));
    }
}
