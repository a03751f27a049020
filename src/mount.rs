//! Mounting and boot mount-table persistence for an attached volume.
//!
//! Mounting addresses the device through its stable by-UUID path rather
//! than the raw device node, so the entry survives device renumbering.
//! Mount failures are logged and otherwise ignored; the attachment itself
//! has already succeeded by the time these run.

use std::ffi::OsString;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs::OpenOptions;
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;
use tracing::debug;

use crate::host::{CommandRunner, HostError};

/// Host mount binary invoked for the filesystem mount.
pub const MOUNT_BIN: &str = "/usr/bin/mount";

/// Directory exposing block devices by partition UUID.
pub const BY_UUID_DIR: &str = "/dev/disk/by-uuid";

/// Boot mount table written to when persistence is requested.
pub const DEFAULT_MOUNT_TABLE: &str = "/etc/fstab";

/// What to mount once the volume is attached.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MountRequest {
    /// UUID of the partition to mount.
    pub partition_uuid: String,
    /// Where to mount the partition.
    pub mount_point: Utf8PathBuf,
    /// Filesystem type recorded in the mount table.
    pub fs_type: String,
    /// Whether to append the mount to the boot mount table.
    pub persist: bool,
}

impl MountRequest {
    /// Creates a mount request, trimming string fields.
    #[must_use]
    pub fn new(
        partition_uuid: impl Into<String>,
        mount_point: impl Into<Utf8PathBuf>,
        fs_type: impl Into<String>,
        persist: bool,
    ) -> Self {
        Self {
            partition_uuid: partition_uuid.into().trim().to_owned(),
            mount_point: mount_point.into(),
            fs_type: fs_type.into().trim().to_owned(),
            persist,
        }
    }

    fn device_path(&self) -> String {
        format!("{BY_UUID_DIR}/{}", self.partition_uuid)
    }

    fn mount_table_line(&self) -> String {
        format!(
            "UUID={}     {}     {}     defaults,noatime 1 1\n",
            self.partition_uuid, self.mount_point, self.fs_type
        )
    }
}

/// Errors raised while updating the boot mount table.
#[derive(Debug, Error)]
pub enum MountError {
    /// Raised when the mount table path has no usable filename component.
    #[error("invalid mount table path: {path}")]
    InvalidTablePath {
        /// Path that could not be split into directory and file.
        path: Utf8PathBuf,
    },
    /// Raised when file system operations fail.
    #[error("failed to update {path}: {message}")]
    Io {
        /// Path that could not be written.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// Mounts a partition and optionally records it in the boot mount table.
#[derive(Clone, Debug)]
pub struct MountManager<R> {
    runner: R,
    mount_table: Utf8PathBuf,
}

impl<R> MountManager<R>
where
    R: CommandRunner,
{
    /// Creates a manager targeting the system mount table.
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            mount_table: Utf8PathBuf::from(DEFAULT_MOUNT_TABLE),
        }
    }

    /// Overrides the mount table path.
    ///
    /// This is primarily used by tests to write into a temporary file.
    #[must_use]
    pub fn with_mount_table(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.mount_table = path.into();
        self
    }

    /// Mounts the partition at the requested mount point.
    ///
    /// The invocation is fire-and-forget: a failing or unspawnable mount
    /// command is logged at debug level and otherwise ignored.
    pub fn mount(&self, request: &MountRequest) {
        let device = request.device_path();
        let args = [
            OsString::from(device.clone()),
            OsString::from(request.mount_point.as_str()),
        ];
        match self.runner.run(MOUNT_BIN, &args) {
            Ok(output) if output.is_success() => {
                debug!(device = %device, mount_point = %request.mount_point, "mounted partition");
            }
            Ok(output) => {
                debug!(
                    device = %device,
                    code = ?output.code,
                    stderr = %output.stderr.trim(),
                    "mount command failed"
                );
            }
            Err(HostError::Spawn { program, message }) => {
                debug!(program = %program, message = %message, "mount command could not be spawned");
            }
        }
    }

    /// Appends the mount to the boot mount table.
    ///
    /// The entry is always appended verbatim; no existing entry for the
    /// same UUID is looked for or replaced, so repeated calls accumulate
    /// duplicate lines.
    ///
    /// # Errors
    ///
    /// Returns [`MountError`] when the mount table cannot be opened or
    /// written.
    pub fn persist(&self, request: &MountRequest) -> Result<Utf8PathBuf, MountError> {
        let parent = self
            .mount_table
            .parent()
            .unwrap_or_else(|| Utf8Path::new("."));
        let file_name =
            self.mount_table
                .file_name()
                .ok_or_else(|| MountError::InvalidTablePath {
                    path: self.mount_table.clone(),
                })?;

        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| {
            MountError::Io {
                path: parent.to_path_buf(),
                message: err.to_string(),
            }
        })?;

        let mut file = dir
            .open_with(
                file_name,
                OpenOptions::new().create(true).append(true),
            )
            .map_err(|err| MountError::Io {
                path: self.mount_table.clone(),
                message: err.to_string(),
            })?;

        file.write_all(request.mount_table_line().as_bytes())
            .map_err(|err| MountError::Io {
                path: self.mount_table.clone(),
                message: err.to_string(),
            })?;

        Ok(self.mount_table.clone())
    }
}
