//! Daemon process lifecycle specs.

use crate::prelude::*;
use serde_json::json;
use std::process::Command;

#[test]
fn version_flag_prints_and_exits() {
    let output = Command::new(daemon_binary())
        .arg("--version")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("agentctld"), "stdout: {stdout}");
}

#[test]
fn help_flag_mentions_the_socket() {
    let output = Command::new(daemon_binary()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Unix socket"), "stdout: {stdout}");
}

#[test]
fn unexpected_argument_fails() {
    let output = Command::new(daemon_binary())
        .arg("--bogus")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn second_daemon_refuses_to_start() {
    let daemon = Daemon::start();

    let output = Command::new(daemon_binary())
        .env("AGENTCTL_DIR", daemon.base_dir.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("already running"), "stderr: {stderr}");

    // The first daemon is still serving
    let mut alice = daemon.client("alice", "s1");
    let pong = alice.request(json!({"type": "ping"}));
    assert_eq!(pong["type"], json!("pong"));
}
