//! Wire types for the volume control-plane API.

use serde::{Deserialize, Serialize};

use crate::provider::{Attachment, AttachmentState, VolumeDescription};

/// Response envelope for `GET /volumes/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct DescribeVolumeResponse {
    pub volume: VolumeResource,
}

/// Volume payload as returned by the control plane.
#[derive(Debug, Deserialize)]
pub(crate) struct VolumeResource {
    pub id: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentResource>,
}

impl VolumeResource {
    /// Converts the wire representation into the domain model, preserving
    /// attachment order.
    pub(crate) fn into_domain(self) -> VolumeDescription {
        VolumeDescription {
            id: self.id,
            attachments: self
                .attachments
                .into_iter()
                .map(AttachmentResource::into_domain)
                .collect(),
        }
    }
}

/// One attachment record on the wire.
#[derive(Debug, Deserialize)]
pub(crate) struct AttachmentResource {
    pub instance_id: String,
    #[serde(default)]
    pub device: String,
    pub state: AttachmentState,
}

impl AttachmentResource {
    fn into_domain(self) -> Attachment {
        Attachment {
            instance_id: self.instance_id,
            device: self.device,
            state: self.state,
        }
    }
}

/// Request body for `POST /volumes/{id}/attach`.
#[derive(Debug, Serialize)]
pub(crate) struct AttachVolumePayload<'a> {
    pub instance_id: &'a str,
    pub device: &'a str,
}

/// Request body for `POST /volumes/{id}/detach`.
#[derive(Debug, Serialize)]
pub(crate) struct DetachVolumePayload {
    pub force: bool,
}
