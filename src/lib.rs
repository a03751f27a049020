//! Core library for the Tether volume attachment tool.
//!
//! The crate exposes a provider abstraction for block-storage volume
//! operations and the orchestration that re-homes a volume onto a target
//! instance (observe state → detach if forced → attach → wait for the
//! provider to settle), plus optional mounting of the resulting device.

pub mod config;
pub mod host;
pub mod metadata;
pub mod mount;
pub mod oracle;
pub mod orchestrator;
pub mod provider;
pub mod rest;
pub mod test_support;
pub mod waiter;

pub use config::{ApiConfig, ConfigError};
pub use host::{CommandOutput, CommandRunner, HostError, ProcessCommandRunner};
pub use metadata::MetadataClient;
pub use mount::{MountError, MountManager, MountRequest};
pub use oracle::StateOracle;
pub use orchestrator::{AttachError, AttachOrchestrator, AttachOutcome};
pub use provider::{
    AttachRequest, AttachRequestBuilder, Attachment, AttachmentState, RequestError, VolumeApi,
    VolumeDescription,
};
pub use rest::{RestVolumeClient, VolumeApiError};
pub use waiter::{StateWaiter, WaitError};
