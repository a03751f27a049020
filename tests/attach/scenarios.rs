//! BDD scenarios for the attachment workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{AttachContext, attach_context};

#[scenario(path = "tests/features/attach.feature", name = "Attach a detached volume")]
fn scenario_attach_detached(attach_context: AttachContext) {
    drop(attach_context);
}

#[scenario(
    path = "tests/features/attach.feature",
    name = "Reject a volume attached elsewhere without force"
)]
fn scenario_blocked_without_force(attach_context: AttachContext) {
    drop(attach_context);
}

#[scenario(
    path = "tests/features/attach.feature",
    name = "Skip a volume already attached to the target instance"
)]
fn scenario_already_attached(attach_context: AttachContext) {
    drop(attach_context);
}

#[scenario(
    path = "tests/features/attach.feature",
    name = "Force detachment from another instance before attaching"
)]
fn scenario_forced_rehome(attach_context: AttachContext) {
    drop(attach_context);
}

#[scenario(
    path = "tests/features/attach.feature",
    name = "Surface provider failures"
)]
fn scenario_provider_failure(attach_context: AttachContext) {
    drop(attach_context);
}

#[scenario(
    path = "tests/features/attach.feature",
    name = "Time out when the volume never settles"
)]
fn scenario_wait_timeout(attach_context: AttachContext) {
    drop(attach_context);
}
