//! vigild / vigil-watchdog help and version specs: verify both binaries
//! respond to `--help`/`--version` without touching a bot root.

use crate::prelude::*;
use std::process::Command;

#[test]
fn vigild_version_shows_version() {
    let output = Command::new(vigild_binary()).arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("vigild 0.1.0"), "got: {stdout}");
}

#[test]
fn vigild_help_mentions_env_config() {
    let output = Command::new(vigild_binary()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("VIGIL_"), "expected env var mention, got: {stdout}");
}

#[test]
fn vigild_unknown_arg_fails() {
    let output = Command::new(vigild_binary()).arg("--bogus").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unexpected argument"), "got: {stderr}");
}

#[test]
fn watchdog_version_shows_version() {
    let output = Command::new(watchdog_binary()).arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("vigil-watchdog 0.1.0"), "got: {stdout}");
}

#[test]
fn watchdog_help_mentions_supervisor() {
    let output = Command::new(watchdog_binary()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("vigild"), "got: {stdout}");
}
