//! Shared fixtures for attachment BDD scenarios.

use std::time::Duration;

use rstest::fixture;
use tether::AttachRequest;
use tether::test_support::ScriptedVolumeApi;
use thiserror::Error;

/// Poll interval used by scenarios; keeps wait loops fast.
pub const SCENARIO_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug)]
pub struct AttachContext {
    pub provider: ScriptedVolumeApi,
    pub request: AttachRequest,
    pub wait_timeout: Option<Duration>,
    pub outcome: Option<AttachResult>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttachFailureKind {
    Validation,
    Provider,
    WaitTimeout,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachFailure {
    pub kind: AttachFailureKind,
    pub message: String,
}

#[derive(Clone, Debug)]
pub enum AttachResult {
    Success(tether::AttachOutcome),
    Failure(AttachFailure),
}

#[derive(Clone, Debug, Error)]
pub enum AttachTestError {
    #[error("invalid attach fixture: {0}")]
    Fixture(String),
}

/// Result alias consumed by scenario bindings.
pub type AttachContextResult = Result<AttachContext, AttachTestError>;

#[fixture]
pub fn attach_context_result() -> AttachContextResult {
    build_attach_context()
}

#[fixture]
pub fn attach_context(attach_context_result: AttachContextResult) -> AttachContext {
    attach_context_result
        .unwrap_or_else(|err| panic!("attach context fixture should initialise: {err}"))
}

fn build_attach_context() -> Result<AttachContext, AttachTestError> {
    let request = AttachRequest::builder()
        .volume_id("vol-1")
        .instance_id("i-1")
        .device("/dev/xvdf")
        .build()
        .map_err(|err| AttachTestError::Fixture(format!("attach request: {err}")))?;

    Ok(AttachContext {
        provider: ScriptedVolumeApi::new(),
        request,
        wait_timeout: None,
        outcome: None,
    })
}
