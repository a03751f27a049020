//! Read-side queries over a volume's attachment state.

use tracing::debug;

use crate::provider::{AttachmentState, VolumeApi};

/// Answers attachment-state questions by describing the volume through the
/// provider binding it borrows.
#[derive(Clone, Copy, Debug)]
pub struct StateOracle<'p, P> {
    provider: &'p P,
}

impl<'p, P> StateOracle<'p, P>
where
    P: VolumeApi,
{
    /// Creates an oracle over the given provider binding.
    #[must_use]
    pub const fn new(provider: &'p P) -> Self {
        Self { provider }
    }

    /// Returns the volume's attachment state.
    ///
    /// An empty attachment list reads as [`AttachmentState::Detached`];
    /// otherwise the state of the first listed attachment is returned.
    /// The provider's ordering is trusted as-is.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error untranslated when the describe call
    /// fails.
    pub async fn get_state(&self, volume_id: &str) -> Result<AttachmentState, P::Error> {
        let volume = self.provider.describe_volume(volume_id).await?;
        let state = volume
            .attachments
            .first()
            .map_or(AttachmentState::Detached, |attachment| attachment.state);
        debug!(volume_id, state = %state, "observed volume state");
        Ok(state)
    }

    /// Returns `true` when the volume currently reports
    /// [`AttachmentState::Attached`].
    ///
    /// # Errors
    ///
    /// Propagates the provider's error untranslated.
    pub async fn is_attached(&self, volume_id: &str) -> Result<bool, P::Error> {
        Ok(self.get_state(volume_id).await? == AttachmentState::Attached)
    }

    /// Returns `true` when any attachment record names the given instance.
    ///
    /// Unlike [`Self::get_state`] this scans the full attachment list: a
    /// volume mid-transition can carry residual records beyond the first
    /// entry.
    ///
    /// # Errors
    ///
    /// Propagates the provider's error untranslated.
    pub async fn is_attached_to(
        &self,
        volume_id: &str,
        instance_id: &str,
    ) -> Result<bool, P::Error> {
        let volume = self.provider.describe_volume(volume_id).await?;
        Ok(volume
            .attachments
            .iter()
            .any(|attachment| attachment.instance_id == instance_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedVolumeApi, attachment};

    #[tokio::test]
    async fn empty_attachment_list_reads_as_detached() {
        let provider = ScriptedVolumeApi::new();
        let oracle = StateOracle::new(&provider);

        let state = oracle
            .get_state("vol-1")
            .await
            .unwrap_or_else(|err| panic!("get_state: {err}"));

        assert_eq!(state, AttachmentState::Detached);
    }

    #[tokio::test]
    async fn first_attachment_entry_wins() {
        let provider = ScriptedVolumeApi::with_attachments(vec![
            attachment("i-2", "/dev/xvdf", AttachmentState::Busy),
            attachment("i-1", "/dev/xvdg", AttachmentState::Attached),
        ]);
        let oracle = StateOracle::new(&provider);

        let state = oracle
            .get_state("vol-1")
            .await
            .unwrap_or_else(|err| panic!("get_state: {err}"));

        assert_eq!(state, AttachmentState::Busy);
        let attached = oracle
            .is_attached("vol-1")
            .await
            .unwrap_or_else(|err| panic!("is_attached: {err}"));
        assert!(!attached);
    }

    #[tokio::test]
    async fn membership_scan_covers_the_full_list() {
        let provider = ScriptedVolumeApi::with_attachments(vec![
            attachment("i-2", "/dev/xvdf", AttachmentState::Detaching),
            attachment("i-1", "/dev/xvdg", AttachmentState::Attaching),
        ]);
        let oracle = StateOracle::new(&provider);

        let held = oracle
            .is_attached_to("vol-1", "i-1")
            .await
            .unwrap_or_else(|err| panic!("is_attached_to: {err}"));

        assert!(held);
    }

    #[tokio::test]
    async fn describe_failures_propagate() {
        let provider = ScriptedVolumeApi::new();
        provider.fail_describe();
        let oracle = StateOracle::new(&provider);

        let result = oracle.get_state("vol-1").await;

        assert!(result.is_err());
    }
}
