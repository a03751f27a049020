//! Provider abstraction for block-storage volume operations.

use std::fmt::{self, Display};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State of a volume's attachment as reported by the provider.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentState {
    /// No active attachment exists.
    Detached,
    /// An attachment is being established.
    Attaching,
    /// The volume is attached to an instance.
    Attached,
    /// An attachment is being torn down.
    Detaching,
    /// The volume is held by the provider and cannot transition yet.
    Busy,
}

impl AttachmentState {
    /// Returns the lowercase wire representation of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detached => "detached",
            Self::Attaching => "attaching",
            Self::Attached => "attached",
            Self::Detaching => "detaching",
            Self::Busy => "busy",
        }
    }
}

impl Display for AttachmentState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A single attachment record binding a volume to an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// Instance the volume is bound to.
    pub instance_id: String,
    /// Device path the volume is exposed under.
    pub device: String,
    /// Transitional state of this attachment.
    pub state: AttachmentState,
}

/// Snapshot of a volume as returned by a describe call.
///
/// The attachment list preserves provider order; callers that inspect it
/// rely on the first entry being the provider's current attachment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeDescription {
    /// Provider-assigned volume identifier.
    pub id: String,
    /// Attachment records in provider order.
    pub attachments: Vec<Attachment>,
}

/// Parameters for one attachment orchestration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachRequest {
    /// Volume to attach.
    pub volume_id: String,
    /// Instance the volume should end up attached to.
    pub instance_id: String,
    /// Device path to expose the volume under.
    pub device: String,
    /// Whether to detach the volume from a prior owner first.
    pub force: bool,
}

impl AttachRequest {
    /// Starts a builder for an [`AttachRequest`].
    #[must_use]
    pub fn builder() -> AttachRequestBuilder {
        AttachRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any string field is empty.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.volume_id.is_empty() {
            return Err(RequestError::Validation("volume_id".to_owned()));
        }
        if self.instance_id.is_empty() {
            return Err(RequestError::Validation("instance_id".to_owned()));
        }
        if self.device.is_empty() {
            return Err(RequestError::Validation("device".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`AttachRequest`] that defers trimming and validation to
/// construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttachRequestBuilder {
    volume_id: String,
    instance_id: String,
    device: String,
    force: bool,
}

impl AttachRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the volume identifier.
    #[must_use]
    pub fn volume_id(mut self, value: impl Into<String>) -> Self {
        self.volume_id = value.into();
        self
    }

    /// Sets the target instance identifier.
    #[must_use]
    pub fn instance_id(mut self, value: impl Into<String>) -> Self {
        self.instance_id = value.into();
        self
    }

    /// Sets the device path.
    #[must_use]
    pub fn device(mut self, value: impl Into<String>) -> Self {
        self.device = value.into();
        self
    }

    /// Sets whether a prior owner should be forcibly detached.
    #[must_use]
    pub const fn force(mut self, value: bool) -> Self {
        self.force = value;
        self
    }

    /// Builds and validates the [`AttachRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty.
    pub fn build(self) -> Result<AttachRequest, RequestError> {
        let request = AttachRequest {
            volume_id: self.volume_id.trim().to_owned(),
            instance_id: self.instance_id.trim().to_owned(),
            device: self.device.trim().to_owned(),
            force: self.force,
        };
        request.validate()?;
        Ok(request)
    }
}

/// Errors raised while assembling requests.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
}

/// Future returned by provider operations.
pub type ApiFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface over the provider's volume control plane.
///
/// Implementations observe attachment state; they never drive transitions
/// themselves beyond issuing the attach and detach calls.
pub trait VolumeApi {
    /// Provider specific error type returned by the binding.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the volume's current description, including its attachments.
    fn describe_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, VolumeDescription, Self::Error>;

    /// Requests that the volume be attached to the given instance.
    fn attach_volume<'a>(
        &'a self,
        volume_id: &'a str,
        instance_id: &'a str,
        device: &'a str,
    ) -> ApiFuture<'a, (), Self::Error>;

    /// Requests that the volume be detached from its current owner.
    fn detach_volume<'a>(&'a self, volume_id: &'a str, force: bool) -> ApiFuture<'a, (), Self::Error>;
}
