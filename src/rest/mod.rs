//! HTTP binding for the provider's volume control plane.
//!
//! The control plane exposes describe, attach, and detach operations per
//! volume, authenticated with a token header. Calls are made with a client
//! owned by the binding so tests can construct isolated instances instead
//! of sharing process-wide state.

mod error;
mod types;

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::ApiConfig;
use crate::provider::{ApiFuture, VolumeApi, VolumeDescription};
use types::{AttachVolumePayload, DescribeVolumeResponse, DetachVolumePayload};

pub use error::VolumeApiError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the volume control plane implementing [`VolumeApi`].
#[derive(Clone, Debug)]
pub struct RestVolumeClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl RestVolumeClient {
    /// Constructs a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeApiError::Config`] when the provided configuration
    /// fails validation or the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, VolumeApiError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| VolumeApiError::Config(err.to_string()))?;
        Ok(Self { http, config })
    }

    fn volume_url(&self, volume_id: &str, action: Option<&str>) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        action.map_or_else(
            || format!("{base}/volumes/{volume_id}"),
            |suffix| format!("{base}/volumes/{volume_id}/{suffix}"),
        )
    }

    async fn describe(&self, volume_id: &str) -> Result<VolumeDescription, VolumeApiError> {
        let url = self.volume_url(volume_id, None);
        let response = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.config.secret_token)
            .send()
            .await
            .map_err(|err| VolumeApiError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| VolumeApiError::Transport {
                message: err.to_string(),
            })?;

        if !status.is_success() {
            return Err(VolumeApiError::Api {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let parsed: DescribeVolumeResponse =
            serde_json::from_slice(&body).map_err(|err| VolumeApiError::Decode {
                message: err.to_string(),
            })?;
        debug!(volume_id, "described volume");
        Ok(parsed.volume.into_domain())
    }

    async fn post_action<T>(
        &self,
        volume_id: &str,
        action: &str,
        payload: &T,
    ) -> Result<(), VolumeApiError>
    where
        T: Serialize + Sync,
    {
        let url = self.volume_url(volume_id, Some(action));
        let response = self
            .http
            .post(&url)
            .header("X-Auth-Token", &self.config.secret_token)
            .json(payload)
            .send()
            .await
            .map_err(|err| VolumeApiError::Transport {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(volume_id, action, "volume action accepted");
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(VolumeApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl VolumeApi for RestVolumeClient {
    type Error = VolumeApiError;

    fn describe_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, VolumeDescription, Self::Error> {
        Box::pin(async move { self.describe(volume_id).await })
    }

    fn attach_volume<'a>(
        &'a self,
        volume_id: &'a str,
        instance_id: &'a str,
        device: &'a str,
    ) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let payload = AttachVolumePayload {
                instance_id,
                device,
            };
            self.post_action(volume_id, "attach", &payload).await
        })
    }

    fn detach_volume<'a>(&'a self, volume_id: &'a str, force: bool) -> ApiFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let payload = DetachVolumePayload { force };
            self.post_action(volume_id, "detach", &payload).await
        })
    }
}
