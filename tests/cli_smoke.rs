//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn missing_volume_flag_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--volume"));
}

#[test]
fn help_lists_the_command_surface() {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--force"))
        .stdout(predicate::str::contains("--fstab"))
        .stdout(predicate::str::contains("--fs-type"));
}

#[test]
fn missing_provider_configuration_fails() {
    let mut cmd = cargo_bin_cmd!("tether");
    cmd.args(["--volume", "vol-1", "--instance", "i-1"]);
    cmd.env_remove("TETHER_API_URL");
    cmd.env_remove("TETHER_SECRET_TOKEN");
    cmd.assert().failure();
}
