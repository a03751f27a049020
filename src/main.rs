//! Binary entry point for the Tether CLI.

use std::env;
use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use tether::{
    ApiConfig, AttachError, AttachOrchestrator, AttachOutcome, AttachRequest, MetadataClient,
    MountManager, MountRequest, ProcessCommandRunner, RestVolumeClient, VolumeApiError,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("could not resolve an instance id: pass --instance or set TETHER_INSTANCE_ID")]
    InstanceUnresolved,
    #[error("invalid attach request: {0}")]
    Request(String),
    #[error("attachment failed: {0}")]
    Attach(#[from] AttachError<VolumeApiError>),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let default_directive = if env::var_os("TETHER_DEBUG").is_some() {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<i32, CliError> {
    let config =
        ApiConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let client =
        RestVolumeClient::new(config.clone()).map_err(|err| CliError::Config(err.to_string()))?;

    let instance_id = resolve_instance(cli.instance.clone(), &MetadataClient::new())
        .await
        .ok_or(CliError::InstanceUnresolved)?;

    let request = AttachRequest::builder()
        .volume_id(&cli.volume)
        .instance_id(instance_id)
        .device(&cli.device)
        .force(cli.force)
        .build()
        .map_err(|err| CliError::Request(err.to_string()))?;

    let orchestrator = AttachOrchestrator::new(client)
        .with_poll_interval(config.poll_interval())
        .with_wait_timeout(config.wait_timeout());
    let outcome = orchestrator.execute(&request).await?;

    if matches!(
        outcome,
        AttachOutcome::AttachedFresh | AttachOutcome::AttachedAfterDetach
    ) && let Some(mount_request) = mount_request_from(&cli)
    {
        let manager = MountManager::new(ProcessCommandRunner);
        manager.mount(&mount_request);
        if mount_request.persist
            && let Err(err) = manager.persist(&mount_request)
        {
            warn!(error = %err, "failed to update the boot mount table");
        }
    }

    Ok(exit_code_for(outcome))
}

/// Picks the explicit instance id when one was supplied, falling back to the
/// metadata service. `None` means neither source produced an identity.
async fn resolve_instance(explicit: Option<String>, metadata: &MetadataClient) -> Option<String> {
    if let Some(value) = explicit {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_owned());
        }
    }
    metadata.instance_id().await
}

fn mount_request_from(cli: &Cli) -> Option<MountRequest> {
    let uuid = cli
        .uuid
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    let dst = cli
        .dst
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    Some(MountRequest::new(uuid, dst, cli.fs_type.clone(), cli.fstab))
}

const fn exit_code_for(outcome: AttachOutcome) -> i32 {
    match outcome {
        AttachOutcome::BlockedAttachedElsewhere => 1,
        AttachOutcome::AlreadyAttachedHere
        | AttachOutcome::AttachedAfterDetach
        | AttachOutcome::AttachedFresh => 0,
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
