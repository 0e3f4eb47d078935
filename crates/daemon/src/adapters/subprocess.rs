// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with timeouts and bounded output capture.

use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::warn;

/// Timeout for git worktree operations.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Cap on captured stdout/stderr per stream (64 KiB).
pub const MAX_CAPTURE: usize = 64 * 1024;

/// Synthetic exit code reported for killed (timed out) commands.
pub const TIMEOUT_EXIT_CODE: i32 = -1;

/// Result of one command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn passed(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

/// Run a command with a wall-clock timeout, killing it on expiry.
///
/// Output is truncated to [`MAX_CAPTURE`] bytes per stream. A timed-out
/// command reports [`TIMEOUT_EXIT_CODE`].
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> std::io::Result<CommandOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let capture = async {
        // Drain both streams fully (keeping only the first MAX_CAPTURE
        // bytes) so the child never blocks on a full pipe.
        let (stdout, stderr) = tokio::join!(drain_capped(stdout_pipe), drain_capped(stderr_pipe));
        let status = child.wait().await;
        (status, stdout, stderr)
    };
    tokio::pin!(capture);

    match tokio::time::timeout(timeout, &mut capture).await {
        Ok((status, stdout, stderr)) => {
            let status = status?;
            Ok(CommandOutput {
                exit_code: status.code().unwrap_or(TIMEOUT_EXIT_CODE),
                stdout,
                stderr,
                duration: start.elapsed(),
                timed_out: false,
            })
        }
        Err(_) => {
            warn!(label, timeout_secs = timeout.as_secs(), "command timed out, killing");
            Ok(CommandOutput {
                exit_code: TIMEOUT_EXIT_CODE,
                stdout: String::new(),
                stderr: format!("{label}: killed after {}s timeout", timeout.as_secs()),
                duration: start.elapsed(),
                timed_out: true,
            })
        }
    }
}

/// Read a pipe to EOF, keeping at most [`MAX_CAPTURE`] bytes.
async fn drain_capped<R: tokio::io::AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut kept = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = MAX_CAPTURE.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    String::from_utf8_lossy(&kept).into_owned()
}

/// Split a stored command string into argv.
///
/// Commands are executed directly (no shell); whitespace splitting is the
/// documented contract for `run_commands` entries.
pub fn split_argv(command: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
