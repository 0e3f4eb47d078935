// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Everything path-like is resolved once at startup and injected through
//! the lifecycle config; deep call sites never read the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Daemon version string
pub const DAEMON_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve base directory: AGENTCTL_DIR > $HOME/.agentctl
pub fn base_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("AGENTCTL_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home).join(".agentctl"));
        }
    }
    // HOME unset (e.g. some service managers): fall back to the platform lookup
    dirs::home_dir()
        .map(|home| home.join(".agentctl"))
        .ok_or(LifecycleError::NoBaseDir)
}

/// Default IPC write timeout
pub fn ipc_timeout() -> Duration {
    millis_env("AGENTCTL_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// SLA scan interval (default 60s)
pub fn sla_interval() -> Duration {
    millis_env("AGENTCTL_SLA_INTERVAL_MS").unwrap_or(Duration::from_secs(60))
}

/// Shared-session staleness sweep interval (default 30s)
pub fn session_sweep_interval() -> Duration {
    millis_env("AGENTCTL_SESSION_SWEEP_MS").unwrap_or(Duration::from_secs(30))
}

/// Per-command auto-acceptance timeout (default 15 minutes)
pub fn acceptance_command_timeout() -> Duration {
    millis_env("AGENTCTL_ACCEPTANCE_CMD_TIMEOUT_MS").unwrap_or(Duration::from_secs(15 * 60))
}

/// Overall auto-acceptance deadline (default 60 minutes)
pub fn acceptance_overall_timeout() -> Duration {
    millis_env("AGENTCTL_ACCEPTANCE_TIMEOUT_MS").unwrap_or(Duration::from_secs(60 * 60))
}

/// Shutdown drain timeout (default 5s)
pub fn drain_timeout() -> Duration {
    millis_env("AGENTCTL_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

fn millis_env(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
