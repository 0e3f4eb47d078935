// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctl daemon (agentctld)
//!
//! Long-lived process mediating communication, task delegation,
//! workspace isolation and acceptance verification among local
//! AI-coding-agent accounts.
//!
//! Architecture:
//! - Listener task: accepts UNIX-socket connections, one task per client
//! - Periodic tasks: SLA scan, session sweeps, config watcher
//! - Engine: handoff/task semantics behind the handlers

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod adapters;
mod config;
mod engine;
mod env;
mod event_bus;
mod handlers;
mod lifecycle;
mod listener;
mod supervisor;

use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::lifecycle::{HubState, LifecycleError, Paths, StartupResult};
use crate::listener::Listener;

/// Inactive shared sessions older than this are purged from memory.
const SESSION_PURGE_AGE_MS: u64 = 60 * 60 * 1000;

/// How often inactive sessions are purged.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags and supervisor mode before anything else
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("agentctld {}", env::DAEMON_VERSION);
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("agentctld {}", env::DAEMON_VERSION);
                println!("agentctl coordination daemon - mediates messaging, handoffs,");
                println!("workspaces and acceptance verification between agent accounts");
                println!();
                println!("USAGE:");
                println!("    agentctld [--supervise]");
                println!();
                println!("The daemon is typically started by the agentctl CLI and listens");
                println!("on a Unix socket under $AGENTCTL_DIR (default ~/.agentctl).");
                println!();
                println!("OPTIONS:");
                println!("    --supervise      Run under the crash-restart supervisor");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            "--supervise" => {
                return supervisor::run();
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: agentctld [--supervise | --help | --version]");
                std::process::exit(1);
            }
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_daemon())
}

async fn run_daemon() -> Result<(), Box<dyn std::error::Error>> {
    let paths = Paths::resolve()?;

    rotate_log_if_needed(&paths.log);
    let _log_guard = setup_logging(&paths)?;

    info!("starting agentctld {}", env::DAEMON_VERSION);

    let StartupResult {
        state,
        listener,
        lock_file: _lock_file,
    } = match lifecycle::startup(paths.clone()).await {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&paths.pid).unwrap_or_default();
            eprintln!("agentctld is already running");
            if !pid.trim().is_empty() {
                eprintln!("  pid: {}", pid.trim());
            }
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {}", e);
            return Err(e.into());
        }
    };

    // Listener task
    let shutdown = CancellationToken::new();
    tokio::spawn(Listener::new(listener, Arc::clone(&state), shutdown.clone()).run());

    // Periodic: SLA scan (the coordinator never mutates tasks)
    spawn_sla_scan(Arc::clone(&state));

    // Periodic: shared-session staleness + purge sweeps
    spawn_session_sweeps(Arc::clone(&state));

    // Config hot-reload
    spawn_config_watcher(Arc::clone(&state));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("daemon ready, listening on {}", state.paths.socket.display());

    // Signal readiness to the parent (CLI or supervisor)
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    // Stop accepting, then give in-flight connections a moment to drain
    shutdown.cancel();
    tokio::time::sleep(env::drain_timeout().min(Duration::from_millis(250))).await;

    lifecycle::shutdown(&state);
    info!("daemon stopped");
    Ok(())
}

/// Periodic SLA scan emitting warnings/breaches onto the bus.
fn spawn_sla_scan(state: Arc<HubState>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(env::sla_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if !state.feature(|f| f.sla_engine) {
                continue;
            }
            let recommendations = handlers::tasks::run_scan(&state);
            if !recommendations.is_empty() {
                info!(count = recommendations.len(), "SLA scan produced recommendations");
            }
        }
    });
}

/// Two-step shared-session cleanup: silence marks inactive, age purges.
fn spawn_session_sweeps(state: Arc<HubState>) {
    let stale_state = Arc::clone(&state);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(env::session_sweep_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let stale = stale_state.live_sessions.cleanup_stale(stale_state.now());
            for session_id in stale {
                info!(session_id, "shared session went stale");
                if let Err(e) = stale_state
                    .stores
                    .sessions
                    .record_ended(&session_id, stale_state.now())
                {
                    warn!(error = %e, "failed to record stale session end");
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let purged = state
                .live_sessions
                .purge_inactive(SESSION_PURGE_AGE_MS, state.now());
            if purged > 0 {
                info!(purged, "purged inactive shared sessions");
            }
        }
    });
}

/// Watch `config.json` and swap changed configs in.
fn spawn_config_watcher(state: Arc<HubState>) {
    let initial = state.config();
    let mut rx = config::watcher::spawn(state.paths.config.clone(), &initial);
    tokio::spawn(async move {
        while let Some(config) = rx.recv().await {
            let accounts = config.accounts.len();
            *state.config.write() = config;
            info!(accounts, "config hot-reloaded");
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (daemon.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `daemon.log` → `daemon.log.1` → `daemon.log.2` → `daemon.log.3`,
/// deleting the oldest. Best-effort: rotation failures are silently ignored
/// so the daemon still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    paths: &Paths,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = paths.log.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        paths.log.parent().unwrap_or(&paths.base_dir),
        paths
            .log
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
