// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config hot-reload watcher.
//!
//! Polls the config file's mtime, debounces bursts of filesystem events
//! by 500 ms, and re-emits only when the canonical serialisation actually
//! changed, so editor re-saves of equivalent content are ignored.

use super::load_config;
use agentctl_core::config::HubConfig;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Debounce window for bursts of writes.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Poll interval for mtime checks.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Spawn the watcher; each emission carries the freshly loaded config.
pub fn spawn(path: PathBuf, initial: &HubConfig) -> mpsc::Receiver<HubConfig> {
    let (tx, rx) = mpsc::channel(4);
    let mut last_canonical = initial.canonical();

    tokio::spawn(async move {
        let mut last_mtime = mtime(&path);
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let current = mtime(&path);
            if current == last_mtime {
                continue;
            }

            // Debounce: wait until the file stops changing for a full window
            let mut candidate = current;
            loop {
                tokio::time::sleep(DEBOUNCE).await;
                let settled = mtime(&path);
                if settled == candidate {
                    break;
                }
                candidate = settled;
            }
            last_mtime = candidate;

            let config = match load_config(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "ignoring unreadable config change");
                    continue;
                }
            };

            let canonical = config.canonical();
            if canonical == last_canonical {
                debug!("config rewrite with equivalent content, not re-emitting");
                continue;
            }
            last_canonical = canonical;

            if tx.send(config).await.is_err() {
                return; // daemon shut down
            }
        }
    });

    rx
}

fn mtime(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
