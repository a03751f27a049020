//! Orchestrates the attach-or-detach decision for a single volume.
//!
//! The workflow reads the volume's current attachment state once, decides
//! between refusing, skipping, or re-homing the volume, and then drives the
//! provider through at most one detach and one attach call. Transitions are
//! asynchronous on the provider side, so each mutation blocks on the state
//! waiter until the volume settles.

use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::oracle::StateOracle;
use crate::provider::{AttachRequest, AttachmentState, RequestError, VolumeApi};
use crate::waiter::{DEFAULT_POLL_INTERVAL, StateWaiter, WaitError};

/// Result of one attachment orchestration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttachOutcome {
    /// The volume was already attached to the target instance; nothing was
    /// changed.
    AlreadyAttachedHere,
    /// The volume is attached to another instance and force was not
    /// requested; nothing was changed.
    BlockedAttachedElsewhere,
    /// The volume was detached from a prior owner and attached to the
    /// target instance.
    AttachedAfterDetach,
    /// The volume was attached without any prior detachment.
    AttachedFresh,
}

/// Errors surfaced while orchestrating an attachment.
#[derive(Debug, Error)]
pub enum AttachError<E>
where
    E: std::error::Error + 'static,
{
    /// Raised when the request fails validation.
    #[error("invalid attach request: {0}")]
    Validation(String),
    /// Raised when any provider call fails; never retried or translated.
    #[error("provider call failed: {0}")]
    Provider(#[source] E),
    /// Raised when a bounded wait on a transition expires.
    #[error("timed out waiting for volume {volume_id} to report {desired}")]
    WaitTimeout {
        /// Volume that never settled.
        volume_id: String,
        /// State that was never observed.
        desired: AttachmentState,
    },
}

impl<E> From<RequestError> for AttachError<E>
where
    E: std::error::Error + 'static,
{
    fn from(value: RequestError) -> Self {
        match value {
            RequestError::Validation(field) => Self::Validation(field),
        }
    }
}

impl<E> From<WaitError<E>> for AttachError<E>
where
    E: std::error::Error + 'static,
{
    fn from(value: WaitError<E>) -> Self {
        match value {
            WaitError::Provider(err) => Self::Provider(err),
            WaitError::Timeout { volume_id, desired } => Self::WaitTimeout { volume_id, desired },
        }
    }
}

/// Applies the attachment decision policy using the provided binding.
#[derive(Clone, Debug)]
pub struct AttachOrchestrator<P> {
    provider: P,
    poll_interval: Duration,
    wait_timeout: Option<Duration>,
}

impl<P> AttachOrchestrator<P>
where
    P: VolumeApi,
{
    /// Creates a new orchestrator with the default polling cadence and no
    /// wait bound.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self {
            provider,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: None,
        }
    }

    /// Overrides the interval between state polls.
    ///
    /// This is primarily used by tests to keep wait scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds each wait on a state transition.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Runs the decision policy and drives the provider to the requested
    /// attachment.
    ///
    /// At most one detach and one attach call are issued per invocation.
    /// [`AttachOutcome::BlockedAttachedElsewhere`] is a controlled refusal,
    /// not an error; callers translate it to their own failure signal.
    ///
    /// # Errors
    ///
    /// Returns [`AttachError`] when validation, a provider call, or a
    /// bounded wait fails.
    pub async fn execute(
        &self,
        request: &AttachRequest,
    ) -> Result<AttachOutcome, AttachError<P::Error>> {
        request.validate()?;
        let oracle = StateOracle::new(&self.provider);

        if oracle
            .is_attached(&request.volume_id)
            .await
            .map_err(AttachError::Provider)?
        {
            if !request.force {
                info!(
                    volume_id = %request.volume_id,
                    "volume is already attached to an instance"
                );
                return Ok(AttachOutcome::BlockedAttachedElsewhere);
            }

            if oracle
                .is_attached_to(&request.volume_id, &request.instance_id)
                .await
                .map_err(AttachError::Provider)?
            {
                info!(
                    volume_id = %request.volume_id,
                    instance_id = %request.instance_id,
                    "volume is already attached to the target instance"
                );
                return Ok(AttachOutcome::AlreadyAttachedHere);
            }

            self.detach_and_settle(request).await?;
            self.attach_and_settle(request).await?;
            return Ok(AttachOutcome::AttachedAfterDetach);
        }

        self.attach_and_settle(request).await?;
        Ok(AttachOutcome::AttachedFresh)
    }

    const fn waiter<'p>(&'p self, oracle: StateOracle<'p, P>) -> StateWaiter<'p, P> {
        StateWaiter::new(oracle)
            .with_poll_interval(self.poll_interval)
            .with_wait_timeout(self.wait_timeout)
    }

    async fn detach_and_settle(
        &self,
        request: &AttachRequest,
    ) -> Result<(), AttachError<P::Error>> {
        self.provider
            .detach_volume(&request.volume_id, true)
            .await
            .map_err(AttachError::Provider)?;
        self.waiter(StateOracle::new(&self.provider))
            .wait_for(&request.volume_id, AttachmentState::Detached)
            .await?;
        info!(volume_id = %request.volume_id, "volume is now detached");
        Ok(())
    }

    async fn attach_and_settle(
        &self,
        request: &AttachRequest,
    ) -> Result<(), AttachError<P::Error>> {
        self.provider
            .attach_volume(&request.volume_id, &request.instance_id, &request.device)
            .await
            .map_err(AttachError::Provider)?;
        self.waiter(StateOracle::new(&self.provider))
            .wait_for(&request.volume_id, AttachmentState::Attached)
            .await?;
        info!(volume_id = %request.volume_id, "volume is now attached");
        Ok(())
    }
}
