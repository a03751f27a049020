//! Error types for the HTTP volume API binding.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the HTTP volume API binding.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum VolumeApiError {
    /// Raised when the binding's configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request never reaches the control plane.
    #[error("transport error: {message}")]
    Transport {
        /// Message reported by the HTTP client.
        message: String,
    },
    /// Raised when the control plane rejects a request.
    #[error("provider rejected request with status {status}: {message}")]
    Api {
        /// HTTP status code returned by the control plane.
        status: u16,
        /// Error body returned by the control plane.
        message: String,
    },
    /// Raised when a response body cannot be decoded.
    #[error("failed to decode provider response: {message}")]
    Decode {
        /// Message reported by the decoder.
        message: String,
    },
}

impl From<ConfigError> for VolumeApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
