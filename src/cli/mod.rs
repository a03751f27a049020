//! Command-line interface definitions for the `tether` binary.
//!
//! This module centralises the clap parser structure so both the main binary
//! and the build script can reuse it when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `tether` binary.
#[derive(Debug, Parser)]
#[command(
    name = "tether",
    about = "Attach a block-storage volume to a compute instance, optionally mounting it"
)]
pub(crate) struct Cli {
    /// The volume to attach.
    #[arg(
        long = "volume",
        short = 'v',
        alias = "volume-id",
        value_name = "VOLUME_ID",
        required = true
    )]
    pub(crate) volume: String,
    /// Detach the volume first if it is attached to another instance.
    #[arg(long = "force", short = 'f', alias = "detach")]
    pub(crate) force: bool,
    /// Device path to attach the volume under.
    #[arg(long, value_name = "DEVICE", default_value = "/dev/xvdf")]
    pub(crate) device: String,
    /// The instance to attach to; resolved from the metadata service when
    /// omitted.
    #[arg(
        long = "instance",
        short = 'i',
        alias = "instance_id",
        env = "TETHER_INSTANCE_ID",
        value_name = "INSTANCE_ID"
    )]
    pub(crate) instance: Option<String>,
    /// The UUID of the partition to mount after attachment.
    #[arg(long, short = 'u', value_name = "UUID")]
    pub(crate) uuid: Option<String>,
    /// Where to mount the partition.
    #[arg(long = "dst", short = 'd', value_name = "PATH")]
    pub(crate) dst: Option<String>,
    /// Write the mount to the boot mount table.
    #[arg(long)]
    pub(crate) fstab: bool,
    /// What filesystem to mount.
    #[arg(long = "fs-type", value_name = "FS_TYPE", default_value = "xfs")]
    pub(crate) fs_type: String,
}
