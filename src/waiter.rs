//! Blocking waits on provider-driven attachment state transitions.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::oracle::StateOracle;
use crate::provider::{AttachmentState, VolumeApi};

/// Interval between state polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Errors raised while waiting on a state transition.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum WaitError<E>
where
    E: std::error::Error + 'static,
{
    /// Raised when a poll fails at the provider.
    #[error("provider call failed: {0}")]
    Provider(#[source] E),
    /// Raised when a bounded wait expires before the state is observed.
    #[error("timed out waiting for volume {volume_id} to report {desired}")]
    Timeout {
        /// Volume being watched.
        volume_id: String,
        /// State that was never observed.
        desired: AttachmentState,
    },
}

/// Polls the oracle at a fixed interval until a desired state appears.
///
/// The wait is unbounded by default, matching the provider's contract that
/// every transition eventually settles. A timeout can be layered on for
/// deployments that prefer a hard failure over an indefinite hang.
#[derive(Clone, Copy, Debug)]
pub struct StateWaiter<'p, P> {
    oracle: StateOracle<'p, P>,
    poll_interval: Duration,
    wait_timeout: Option<Duration>,
}

impl<'p, P> StateWaiter<'p, P>
where
    P: VolumeApi,
{
    /// Creates a waiter over the given oracle with the default interval and
    /// no timeout.
    #[must_use]
    pub const fn new(oracle: StateOracle<'p, P>) -> Self {
        Self {
            oracle,
            poll_interval: DEFAULT_POLL_INTERVAL,
            wait_timeout: None,
        }
    }

    /// Overrides the polling interval.
    ///
    /// This is primarily used by tests to keep wait scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bounds the wait, failing with [`WaitError::Timeout`] on expiry.
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Blocks until the oracle reports the desired state.
    ///
    /// Sleeps one interval before every poll; transient states receive no
    /// special handling beyond another round trip.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Provider`] when a poll fails and
    /// [`WaitError::Timeout`] when a configured bound expires.
    pub async fn wait_for(
        &self,
        volume_id: &str,
        desired: AttachmentState,
    ) -> Result<(), WaitError<P::Error>> {
        let deadline = self.wait_timeout.map(|timeout| Instant::now() + timeout);
        loop {
            sleep(self.poll_interval).await;
            let state = self
                .oracle
                .get_state(volume_id)
                .await
                .map_err(WaitError::Provider)?;
            if state == desired {
                return Ok(());
            }
            debug!(volume_id, state = %state, desired = %desired, "state not yet reached");
            if let Some(limit) = deadline
                && Instant::now() > limit
            {
                return Err(WaitError::Timeout {
                    volume_id: volume_id.to_owned(),
                    desired,
                });
            }
        }
    }
}
