// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification hook. Best-effort: failures are logged only.

use crate::lifecycle::HubState;
use agentctl_core::event::{HubEvent, TaskResult};
use tracing::debug;

/// React to a bus event with a desktop notification when enabled.
pub fn on_event(state: &HubState, event: &HubEvent) {
    let enabled = state
        .config
        .read()
        .notifications
        .as_ref()
        .is_some_and(|n| n.enabled);
    if !enabled {
        return;
    }

    let (summary, body) = match event {
        HubEvent::TaskAssigned {
            task_id, delegatee, ..
        } => (
            "Task assigned".to_string(),
            format!("{} accepted handoff {}", delegatee, task_id.short(8)),
        ),
        HubEvent::TaskCompleted {
            task_id,
            account,
            result,
        } => {
            let verdict = match result {
                TaskResult::Success => "accepted",
                TaskResult::Failure => "rejected",
            };
            (
                format!("Task {verdict}"),
                format!("{} finished task {}", account, task_id.short(8)),
            )
        }
        HubEvent::SlaBreach {
            task_id, assignee, reason, ..
        } => (
            "SLA breach".to_string(),
            format!("{} on task {}: {}", assignee, task_id.short(8), reason),
        ),
        _ => return,
    };

    // Notification display blocks on some platforms; keep it off the
    // handler path entirely.
    tokio::task::spawn_blocking(move || {
        if let Err(e) = notify_rust::Notification::new()
            .summary(&summary)
            .body(&body)
            .appname("agentctl")
            .show()
        {
            debug!(error = %e, "desktop notification failed");
        }
    });
}
