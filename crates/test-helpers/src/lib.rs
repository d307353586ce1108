//! Test helpers for exertion dispatch.
//!
//! Scripted providers with observable call counts, an arithmetic local
//! service, and fixture builders for common tasks and jobs.

mod providers;

pub use providers::{EchoProvider, ExclusiveProvider, FailingProvider, UnreachableProvider};

use exertion_core::{LocalService, ServiceError};
use exertion_types::{AccessType, Context, ControlContext, Job, Signature, Task};
use serde_json::Value;

/// Networked task `name` calling `service_type.selector` on any provider.
pub fn net_task(name: &str, service_type: &str, selector: &str) -> Task {
    Task::new(name, Signature::net(service_type, selector))
}

/// Networked task with the given access type.
pub fn net_task_with_access(
    name: &str,
    service_type: &str,
    selector: &str,
    access: AccessType,
) -> Task {
    net_task(name, service_type, selector).with_control(ControlContext::with_access(access))
}

/// Job with no signature wrapping the given tasks.
pub fn job_of(name: &str, tasks: impl IntoIterator<Item = Task>) -> Job {
    tasks
        .into_iter()
        .fold(Job::new(name), |job, task| job.with_exertion(task))
}

/// Context for the [`Arithmetic`] service.
pub fn operands(x: i64, y: i64) -> Context {
    Context::new("operands").with("arg/x", x).with("arg/y", y)
}

/// In-process arithmetic service.
///
/// - `add`, `multiply`: read `arg/x`, `arg/y`, write `result`
/// - `double`: doubles `result`
/// - `stamp`: sets `stamp` to `true`
/// - `fail`: reports a service failure
/// - `crash`: reports a runtime error
#[derive(Debug, Default)]
pub struct Arithmetic;

fn operand(context: &Context, path: &str) -> Result<i64, ServiceError> {
    context
        .get(path)
        .and_then(Value::as_i64)
        .ok_or_else(|| ServiceError::Failed(format!("missing operand {path}")))
}

impl LocalService for Arithmetic {
    fn exec(&self, selector: &str, mut context: Context) -> Result<Context, ServiceError> {
        match selector {
            "add" => {
                let sum = operand(&context, "arg/x")? + operand(&context, "arg/y")?;
                context.put("result", sum);
            }
            "multiply" => {
                let product = operand(&context, "arg/x")? * operand(&context, "arg/y")?;
                context.put("result", product);
            }
            "double" => {
                let value = operand(&context, "result")?;
                context.put("result", value * 2);
            }
            "stamp" => {
                context.put("stamp", true);
            }
            "fail" => return Err(ServiceError::Failed("arithmetic refused".into())),
            "crash" => return Err(ServiceError::Runtime("arithmetic crashed".into())),
            other => return Err(ServiceError::UnknownSelector(other.to_string())),
        }
        Ok(context)
    }
}
