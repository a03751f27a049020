//! BDD step definitions for the attachment workflow.

use std::time::Duration;

use rstest_bdd_macros::{given, then, when};
use tether::test_support::attachment;
use tether::{AttachError, AttachOrchestrator, AttachOutcome, AttachmentState};
use tokio::runtime::Runtime;

use super::test_helpers::{
    AttachContext, AttachFailure, AttachFailureKind, AttachResult, SCENARIO_POLL_INTERVAL,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a detached volume")]
fn detached_volume(attach_context: AttachContext) -> AttachContext {
    attach_context
}

#[given("a volume attached to another instance")]
fn attached_elsewhere(attach_context: AttachContext) -> AttachContext {
    AttachContext {
        provider: tether::test_support::ScriptedVolumeApi::with_attachments(vec![attachment(
            "i-2",
            "/dev/xvdf",
            AttachmentState::Attached,
        )]),
        ..attach_context
    }
}

#[given("a volume attached to the target instance")]
fn attached_to_target(attach_context: AttachContext) -> AttachContext {
    AttachContext {
        provider: tether::test_support::ScriptedVolumeApi::with_attachments(vec![attachment(
            "i-1",
            "/dev/xvdf",
            AttachmentState::Attached,
        )]),
        ..attach_context
    }
}

#[given("a volume stuck in the busy state")]
fn stuck_busy(attach_context: AttachContext) -> AttachContext {
    let context = AttachContext {
        provider: tether::test_support::ScriptedVolumeApi::with_attachments(vec![attachment(
            "i-2",
            "/dev/xvdf",
            AttachmentState::Busy,
        )]),
        ..attach_context
    };
    context.provider.freeze();
    context
}

#[given("force detachment is enabled")]
fn force_enabled(mut attach_context: AttachContext) -> AttachContext {
    attach_context.request.force = true;
    attach_context
}

#[given("the provider rejects describe calls")]
fn describe_rejected(attach_context: AttachContext) -> AttachContext {
    attach_context.provider.fail_describe();
    attach_context
}

#[given("a bounded wait of \"{millis}\" milliseconds")]
fn bounded_wait(mut attach_context: AttachContext, millis: u64) -> AttachContext {
    attach_context.wait_timeout = Some(Duration::from_millis(millis));
    attach_context
}

#[when("I run the attachment workflow")]
fn run_workflow(attach_context: AttachContext) -> Result<AttachContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let AttachContext {
        provider,
        request,
        wait_timeout,
        ..
    } = attach_context;

    let orchestrator = AttachOrchestrator::new(provider.clone())
        .with_poll_interval(SCENARIO_POLL_INTERVAL)
        .with_wait_timeout(wait_timeout);

    let request_clone = request.clone();
    let result = runtime.block_on(async move { orchestrator.execute(&request_clone).await });
    let outcome = match result {
        Ok(outcome) => AttachResult::Success(outcome),
        Err(err) => AttachResult::Failure(AttachFailure {
            kind: map_failure_kind(&err),
            message: err.to_string(),
        }),
    };

    Ok(AttachContext {
        provider,
        request,
        wait_timeout,
        outcome: Some(outcome),
    })
}

#[then("the outcome is \"{expected}\"")]
fn outcome_is(attach_context: &AttachContext, expected: String) -> Result<(), StepError> {
    let expected_outcome = parse_outcome(&expected)?;
    match attach_context.outcome {
        Some(AttachResult::Success(actual)) if actual == expected_outcome => Ok(()),
        Some(AttachResult::Success(actual)) => Err(StepError::Assertion(format!(
            "expected {expected_outcome:?}, got {actual:?}"
        ))),
        Some(AttachResult::Failure(ref failure)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {}",
            failure.message
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the attach error kind is \"{kind}\"")]
fn error_kind_is(attach_context: &AttachContext, kind: String) -> Result<(), StepError> {
    let expected = parse_failure_kind(&kind)?;
    let Some(AttachResult::Failure(failure)) = &attach_context.outcome else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    if failure.kind == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure kind {expected:?}, got {:?}",
            failure.kind
        )))
    }
}

#[then("exactly one attach call is issued")]
fn one_attach_call(attach_context: &AttachContext) -> Result<(), StepError> {
    let calls = attach_context.provider.attach_calls();
    if calls.len() == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one attach call, got {}",
            calls.len()
        )))
    }
}

#[then("exactly one forced detach call is issued")]
fn one_detach_call(attach_context: &AttachContext) -> Result<(), StepError> {
    let calls = attach_context.provider.detach_calls();
    let Some(call) = calls.first() else {
        return Err(StepError::Assertion(String::from("missing detach call")));
    };
    if calls.len() > 1 {
        return Err(StepError::Assertion(format!(
            "expected one detach call, got {}",
            calls.len()
        )));
    }
    if call.force {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "detach call should carry the force flag",
        )))
    }
}

#[then("no detach calls are issued")]
fn no_detach_calls(attach_context: &AttachContext) -> Result<(), StepError> {
    if attach_context.provider.detach_calls().is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "detach should not be invoked",
        )))
    }
}

#[then("no provider mutations are issued")]
fn no_mutations(attach_context: &AttachContext) -> Result<(), StepError> {
    let attaches = attach_context.provider.attach_calls();
    let detaches = attach_context.provider.detach_calls();
    if attaches.is_empty() && detaches.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no mutations, got {} attach and {} detach calls",
            attaches.len(),
            detaches.len()
        )))
    }
}

fn parse_outcome(value: &str) -> Result<AttachOutcome, StepError> {
    match value {
        "attached-fresh" => Ok(AttachOutcome::AttachedFresh),
        "attached-after-detach" => Ok(AttachOutcome::AttachedAfterDetach),
        "no-action" => Ok(AttachOutcome::AlreadyAttachedHere),
        "blocked" => Ok(AttachOutcome::BlockedAttachedElsewhere),
        _ => Err(StepError::Assertion(format!("unknown outcome: {value}"))),
    }
}

const fn map_failure_kind(
    err: &AttachError<tether::test_support::ScriptedVolumeApiError>,
) -> AttachFailureKind {
    match err {
        AttachError::Validation(_) => AttachFailureKind::Validation,
        AttachError::Provider(_) => AttachFailureKind::Provider,
        AttachError::WaitTimeout { .. } => AttachFailureKind::WaitTimeout,
    }
}

fn parse_failure_kind(kind: &str) -> Result<AttachFailureKind, StepError> {
    match kind {
        "validation" => Ok(AttachFailureKind::Validation),
        "provider" => Ok(AttachFailureKind::Provider),
        "wait-timeout" => Ok(AttachFailureKind::WaitTimeout),
        _ => Err(StepError::Assertion(format!("unknown failure kind: {kind}"))),
    }
}
