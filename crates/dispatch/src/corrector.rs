//! Signature correction for composite exertions.
//!
//! A job's process signature names the rendezvous provider that will
//! coordinate its children. Which one depends on the job's access type:
//!
//! | access          | current target | corrected target  |
//! |-----------------|----------------|-------------------|
//! | Pull / QosPull  | not Spacer     | `Spacer.service`  |
//! | Push / QosPush  | Spacer         | `Jobber.service`  |
//! | any             | none           | Jobber, then the rule above |
//!
//! Tasks are never rewritten.

use exertion_types::{Exertion, Signature, SPACER};

/// Signature `exertion` should be dispatched with.
///
/// Pure: reads the exertion kind, its process signature and access type. A
/// task without a process signature yields an unselectable signature.
pub fn correct(exertion: &Exertion) -> Signature {
    let current = exertion.process_signature();

    if exertion.is_task() {
        return current
            .cloned()
            .unwrap_or_else(|| Signature::net("", ""));
    }

    let signature = current.cloned().unwrap_or_else(Signature::jobber);
    let access = exertion.control().access_type;

    if access.is_pull() && !signature.targets(SPACER) {
        rendezvous(Signature::spacer(), &signature)
    } else if access.is_push() && signature.targets(SPACER) {
        rendezvous(Signature::jobber(), &signature)
    } else {
        signature
    }
}

/// Correct `exertion` in place and return the signature to dispatch with.
///
/// The corrected signature replaces the process signature only when it
/// differs, so applying twice is the same as applying once.
pub fn apply(exertion: &mut Exertion) -> Signature {
    let corrected = correct(exertion);
    if exertion.is_job() && exertion.process_signature() != Some(&corrected) {
        exertion.set_process_signature(corrected.clone());
    }
    corrected
}

fn rendezvous(target: Signature, original: &Signature) -> Signature {
    match &original.deployment {
        Some(deployment) => target.with_deployment(deployment.clone()),
        None => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exertion_types::{
        AccessType, ControlContext, Job, SignatureType, Task, ANY, JOBBER, SERVICE_SELECTOR,
    };

    fn job(access: AccessType, signature: Option<Signature>) -> Exertion {
        let mut job = Job::new("j").with_control(ControlContext::with_access(access));
        if let Some(sig) = signature {
            job = job.with_signature(sig);
        }
        job.into()
    }

    #[test]
    fn test_task_is_unchanged() {
        let mut task: Exertion = Task::new("t", Signature::net("Calculator", "add"))
            .with_control(ControlContext::with_access(AccessType::Pull))
            .into();
        let before = task.clone();

        assert_eq!(correct(&task), Signature::net("Calculator", "add"));
        apply(&mut task);
        assert_eq!(task, before);
    }

    #[test]
    fn test_pull_job_goes_to_spacer() {
        let sig = Signature::net("Jobber", "exert")
            .with_provider_name("jobber-1")
            .with_type(SignatureType::Proc);

        for access in [AccessType::Pull, AccessType::QosPull] {
            let corrected = correct(&job(access, Some(sig.clone())));
            assert_eq!(corrected.service_type, SPACER);
            assert_eq!(corrected.selector, SERVICE_SELECTOR);
            assert_eq!(corrected.provider_name, ANY);
            assert_eq!(corrected.sig_type, SignatureType::Srv);
        }
    }

    #[test]
    fn test_push_job_leaves_spacer() {
        for access in [AccessType::Push, AccessType::QosPush] {
            let corrected = correct(&job(access, Some(Signature::spacer().with_provider_name("s1"))));
            assert_eq!(corrected, Signature::jobber());
        }
    }

    #[test]
    fn test_push_job_keeps_custom_rendezvous() {
        let sig = Signature::net("Concatenator", "service");
        assert_eq!(correct(&job(AccessType::Push, Some(sig.clone()))), sig);
    }

    #[test]
    fn test_job_without_signature_gets_jobber() {
        let corrected = correct(&job(AccessType::Push, None));
        assert_eq!(corrected.service_type, JOBBER);
        assert_eq!(corrected.selector, SERVICE_SELECTOR);

        let corrected = correct(&job(AccessType::Pull, None));
        assert_eq!(corrected.service_type, SPACER);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut ex = job(AccessType::Pull, Some(Signature::jobber()));

        let first = apply(&mut ex);
        let after_first = ex.clone();
        let second = apply(&mut ex);

        assert_eq!(first, second);
        assert_eq!(ex, after_first);
        assert_eq!(ex.signatures().len(), 1);
        assert_eq!(ex.control().access_type, AccessType::Pull);
    }

    #[test]
    fn test_apply_synthesizes_signature_on_empty_job() {
        let mut ex = job(AccessType::Push, None);
        apply(&mut ex);
        assert_eq!(ex.process_signature(), Some(&Signature::jobber()));
    }

    #[test]
    fn test_task_without_process_signature_is_unselectable() {
        let task = Task::new("t", Signature::local("Log", "open").with_type(SignatureType::Pre));
        assert!(!correct(&task.into()).is_selectable());
    }
}
