// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub post-commit hook.
//!
//! Fires asynchronously after a task reaches a terminal status; failures
//! are logged and never affect the parent request. Uses the `gh` CLI via
//! argv.

use crate::adapters::subprocess::run_with_timeout;
use crate::lifecycle::HubState;
use agentctl_core::event::{HubEvent, TaskResult};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const GH_TIMEOUT: Duration = Duration::from_secs(30);

/// React to a `TASK_COMPLETED` event by commenting on the configured repo.
pub fn on_event(state: &HubState, event: &HubEvent) {
    let HubEvent::TaskCompleted {
        task_id,
        account,
        result,
    } = event
    else {
        return;
    };

    let config = state.config.read();
    if !config.features.github_integration {
        return;
    }
    let Some(github) = config.github.as_ref().filter(|g| g.enabled) else {
        return;
    };
    let Some(repo) = github.repo.clone() else {
        debug!("github integration enabled but no repo configured");
        return;
    };
    drop(config);

    let verdict = match result {
        TaskResult::Success => "accepted",
        TaskResult::Failure => "rejected",
    };
    let task_id = task_id.to_string();
    let account = account.clone();

    // repository_dispatch: downstream workflows decide what to do with it
    tokio::spawn(async move {
        let mut cmd = Command::new("gh");
        cmd.args([
            "api",
            &format!("repos/{repo}/dispatches"),
            "-f",
            "event_type=agentctl-task",
            "-f",
            &format!("client_payload[taskId]={task_id}"),
            "-f",
            &format!("client_payload[account]={account}"),
            "-f",
            &format!("client_payload[verdict]={verdict}"),
        ]);
        match run_with_timeout(cmd, GH_TIMEOUT, "gh api dispatches").await {
            Ok(output) if output.passed() => {
                debug!(task_id, "github dispatch sent");
            }
            Ok(output) => warn!(stderr = %output.stderr.trim(), "github hook failed"),
            Err(e) => warn!(error = %e, "github hook failed (gh CLI unavailable?)"),
        }
    });
}
