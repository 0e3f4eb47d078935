// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn successful_command_captures_stdout() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo").await.unwrap();
    assert!(output.passed());
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.stdout.trim(), "hello");
    assert!(!output.timed_out);
}

#[tokio::test]
async fn failing_command_reports_exit_code() {
    let mut cmd = Command::new("false");
    cmd.env_clear().env("PATH", "/usr/bin:/bin");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "false").await.unwrap();
    assert!(!output.passed());
    assert_eq!(output.exit_code, 1);
}

#[tokio::test]
async fn timeout_reports_synthetic_exit_code() {
    let mut cmd = Command::new("sleep");
    cmd.arg("30");
    let output = run_with_timeout(cmd, Duration::from_millis(100), "sleep").await.unwrap();
    assert!(output.timed_out);
    assert_eq!(output.exit_code, TIMEOUT_EXIT_CODE);
    assert!(output.stderr.contains("killed"));
}

#[tokio::test]
async fn missing_program_is_io_error() {
    let cmd = Command::new("definitely-not-a-real-binary-xyz");
    assert!(run_with_timeout(cmd, Duration::from_secs(1), "missing").await.is_err());
}

#[test]
fn split_argv_never_goes_through_a_shell() {
    let (program, args) = split_argv("cargo test --workspace").unwrap();
    assert_eq!(program, "cargo");
    assert_eq!(args, ["test", "--workspace"]);

    assert!(split_argv("   ").is_none());
}
