// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health, activity, config-reload, code search, task links, review
//! bundles and analytics.

use crate::adapters::search;
use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::activity::ActivityKind;
use agentctl_core::task::{TaskLink, TaskStatus};
use agentctl_core::time_fmt;
use agentctl_storage::ActivityFilter;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub fn health_check(state: &Arc<HubState>) -> HandlerResult {
    Ok(json!({
        "status": "ok",
        "version": crate::env::DAEMON_VERSION,
        "uptimeSecs": state.start_time.elapsed().as_secs(),
    }))
}

pub fn health_status(state: &Arc<HubState>) -> HandlerResult {
    let config = state.config.read();
    let clients: Vec<String> = state.clients.lock().keys().cloned().collect();
    let board = &state.stores.board;
    let tasks_by_status: serde_json::Map<String, serde_json::Value> = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::ReadyForReview,
        TaskStatus::Accepted,
        TaskStatus::Rejected,
    ]
    .into_iter()
    .map(|status| {
        (
            status.as_str().to_string(),
            json!(board.with_status(status).len()),
        )
    })
    .collect();

    let stores = json!({
        "messages": state.paths.messages_db.exists(),
        "workspaces": state.paths.workspaces_db.exists(),
        "capabilities": state.paths.capabilities_db.exists(),
        "knowledge": state.paths.knowledge_db.exists(),
        "sessions": state.paths.sessions_db.exists(),
        "activity": state.paths.activity_db.exists(),
        "workflow": state.paths.workflow_db.exists(),
        "retro": state.paths.retro_db.exists(),
        "trust": state.paths.trust_db.exists(),
        "receipts": state.paths.receipts_db.exists(),
        "tasks": state.stores.board.path().exists(),
        "prompts": state.stores.prompts.path().exists(),
        "clipboard": state.stores.clipboard.path().exists(),
        "handoffTemplates": state.stores.templates.path().exists(),
        "reviewBundles": state.stores.bundles.dir().is_dir(),
    });

    Ok(json!({
        "status": "ok",
        "version": crate::env::DAEMON_VERSION,
        "uptimeSecs": state.start_time.elapsed().as_secs(),
        "baseDir": state.paths.base_dir,
        "connectedAccounts": clients,
        "accounts": config.accounts.len(),
        "features": config.features,
        "tasks": tasks_by_status,
        "liveSessions": state.live_sessions.active_sessions().len(),
        "stores": stores,
    }))
}

#[allow(clippy::too_many_arguments)]
pub fn query_activity(
    state: &Arc<HubState>,
    kind: Option<&str>,
    account: Option<String>,
    workflow_run_id: Option<String>,
    since: Option<&str>,
    limit: Option<u32>,
    search_text: Option<&str>,
) -> HandlerResult {
    if let Some(text) = search_text {
        let events = state.stores.activity.search(text, limit.unwrap_or(50))?;
        let count = events.len();
        return Ok(json!({"events": events, "count": count}));
    }

    let kind = match kind {
        Some(raw) => Some(
            ActivityKind::parse(raw)
                .ok_or_else(|| HandlerError::msg(format!("Invalid field: kind ({raw})")))?,
        ),
        None => None,
    };
    let since = match since {
        Some(raw) => Some(
            time_fmt::parse_iso(raw)
                .ok_or_else(|| HandlerError::msg(format!("Invalid field: since ({raw})")))?,
        ),
        None => None,
    };

    let events = state.stores.activity.query(&ActivityFilter {
        kind,
        account,
        workflow_run_id,
        since,
        limit: limit.unwrap_or(100),
    })?;
    let count = events.len();
    Ok(json!({"events": events, "count": count}))
}

/// `config_reload`: re-read `config.json` and swap it in.
pub fn config_reload(state: &Arc<HubState>) -> HandlerResult {
    let config = crate::config::load_config(&state.paths.config)
        .map_err(|e| HandlerError::msg(e.to_string()))?;
    let accounts = config.accounts.len();
    *state.config.write() = config;
    info!(accounts, "config reloaded on request");
    Ok(json!({"reloaded": true, "accounts": accounts}))
}

pub async fn search_code(
    state: &Arc<HubState>,
    pattern: &str,
    path: Option<&Path>,
    limit: Option<u32>,
) -> HandlerResult {
    if pattern.is_empty() {
        return Err(HandlerError::msg("Invalid field: pattern"));
    }
    let dir = path.unwrap_or(&state.paths.base_dir);
    let matches = search::search_code(pattern, dir, limit.unwrap_or(50))
        .await
        .map_err(HandlerError::msg)?;
    let count = matches.len();
    Ok(json!({"matches": matches, "count": count}))
}

pub fn link_task(
    state: &Arc<HubState>,
    task_id: &str,
    linked_task_id: &str,
    relation: Option<String>,
) -> HandlerResult {
    let link = TaskLink {
        to: linked_task_id.into(),
        relation: relation.unwrap_or_else(|| "related".to_string()),
        linked_at: state.now(),
    };
    let task = state.stores.board.link(task_id, link)?;
    Ok(json!({"task": task}))
}

pub fn get_task_links(state: &Arc<HubState>, task_id: &str) -> HandlerResult {
    match state.stores.board.get(task_id) {
        Some(task) => Ok(json!({"taskId": task_id, "links": task.links})),
        None => Err(HandlerError::not_found(format!("task {task_id}"))),
    }
}

pub fn get_review_bundle(state: &Arc<HubState>, task_id: &str) -> HandlerResult {
    if !state.feature(|f| f.review_bundles) {
        return Err(HandlerError::feature_disabled("Review bundles"));
    }
    match state.stores.bundles.load(task_id)? {
        Some(bundle) => Ok(json!({"bundle": bundle})),
        None => Err(HandlerError::not_found(format!("review bundle {task_id}"))),
    }
}

/// Collect everything a reviewer needs into one bundle file.
pub fn generate_review_bundle(state: &Arc<HubState>, task_id: &str) -> HandlerResult {
    if !state.feature(|f| f.review_bundles) {
        return Err(HandlerError::feature_disabled("Review bundles"));
    }
    let Some(task) = state.stores.board.get(task_id) else {
        return Err(HandlerError::not_found(format!("task {task_id}")));
    };

    let handoff = state.stores.messages.get_message(task_id)?;
    let receipts = state.stores.receipts.for_task(task_id)?;
    let trust = state.stores.trust.get(&task.assignee)?;

    let bundle = json!({
        "generatedAt": time_fmt::iso_millis(&state.now()),
        "task": task,
        "handoff": handoff,
        "receipts": receipts,
        "assigneeTrust": trust,
    });
    state.stores.bundles.save(task_id, &bundle)?;
    Ok(json!({"taskId": task_id, "bundle": bundle}))
}

/// Cross-store analytics snapshot.
pub fn get_analytics(state: &Arc<HubState>) -> HandlerResult {
    let board = &state.stores.board;
    let tasks = board.list();
    let total = tasks.len();
    let by_status = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();

    let mut per_account = serde_json::Map::new();
    for (account, record) in state.stores.capabilities.all()? {
        let rate = if record.total == 0 {
            serde_json::Value::Null
        } else {
            json!(record.accepted as f64 / record.total as f64)
        };
        per_account.insert(
            account,
            json!({
                "accepted": record.accepted,
                "total": record.total,
                "acceptanceRate": rate,
                "avgDurationMinutes": record.avg_duration_minutes,
            }),
        );
    }

    let trust: serde_json::Map<String, serde_json::Value> = state
        .stores
        .trust
        .all()?
        .into_iter()
        .map(|(account, record)| (account, json!(record.score)))
        .collect();

    Ok(json!({
        "tasks": {
            "total": total,
            "todo": by_status(TaskStatus::Todo),
            "inProgress": by_status(TaskStatus::InProgress),
            "readyForReview": by_status(TaskStatus::ReadyForReview),
            "accepted": by_status(TaskStatus::Accepted),
            "rejected": by_status(TaskStatus::Rejected),
        },
        "accounts": per_account,
        "trust": trust,
        "recentReceipts": state.stores.receipts.recent(10)?,
    }))
}

#[cfg(test)]
#[path = "misc_tests.rs"]
mod tests;
