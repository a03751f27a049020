//! Best-effort instance identity lookup via the metadata service.
//!
//! The metadata endpoint lives on a link-local address that only answers
//! from inside an instance, so every failure mode (no route, timeout,
//! error status, empty body) collapses to "identity unknown". Callers
//! decide what an absent identity means.

use std::time::Duration;

/// Link-local metadata endpoint exposing the current instance's identifier.
pub const METADATA_URL: &str = "http://169.254.169.254/latest/meta-data/instance-id";

const METADATA_TIMEOUT: Duration = Duration::from_secs(1);

/// Client for the instance metadata service.
#[derive(Clone, Debug)]
pub struct MetadataClient {
    url: String,
    timeout: Duration,
}

impl MetadataClient {
    /// Creates a client for the standard link-local endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            url: METADATA_URL.to_owned(),
            timeout: METADATA_TIMEOUT,
        }
    }

    /// Creates a client targeting an alternate endpoint.
    ///
    /// This is primarily used by tests to point at a local listener.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: METADATA_TIMEOUT,
        }
    }

    /// Resolves the current instance's identifier.
    ///
    /// Returns `None` on any failure; the lookup is best-effort by design
    /// and never surfaces an error.
    pub async fn instance_id(&self) -> Option<String> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .ok()?;
        let response = client.get(&self.url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body = response.text().await.ok()?;
        let trimmed = body.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }
}

impl Default for MetadataClient {
    fn default() -> Self {
        Self::new()
    }
}
