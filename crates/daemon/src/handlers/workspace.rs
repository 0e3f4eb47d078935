// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace handlers: prepare, inspect and clean up worktrees.

use crate::engine::{workspace, HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub async fn prepare_worktree_for_handoff(
    state: &Arc<HubState>,
    caller: &str,
    repo_path: &Path,
    branch: &str,
    handoff_id: &str,
) -> HandlerResult {
    if !state.feature(|f| f.workspace_worktree) {
        return Err(HandlerError::feature_disabled("Workspace worktree"));
    }
    let ws = workspace::prepare(state, repo_path, branch, caller, handoff_id).await?;
    Ok(json!({"ok": true, "workspace": ws}))
}

pub fn get_workspace_status(
    state: &Arc<HubState>,
    caller: &str,
    workspace_id: Option<&str>,
) -> HandlerResult {
    match workspace_id {
        Some(id) => match state.stores.workspaces.get(id)? {
            Some(ws) => Ok(json!({"workspace": ws})),
            None => Err(HandlerError::not_found(format!("workspace {id}"))),
        },
        None => {
            let workspaces = state.stores.workspaces.list_for_account(caller)?;
            Ok(json!({"workspaces": workspaces}))
        }
    }
}

pub async fn cleanup_workspace(state: &Arc<HubState>, workspace_id: &str) -> HandlerResult {
    if !state.feature(|f| f.workspace_worktree) {
        return Err(HandlerError::feature_disabled("Workspace worktree"));
    }
    let ws = workspace::cleanup(state, workspace_id).await?;
    Ok(json!({"ok": true, "cleaned": ws.id.as_str()}))
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
