// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace manager: prepare and clean up git worktrees for handoffs.
//!
//! The store row is the source of truth (preparing → ready | failed);
//! the adapter only does filesystem work. `(repo, branch)` pairs with a
//! live row are reused rather than duplicated.

use crate::adapters::worktree::PrepareRequest;
use crate::engine::HandlerError;
use crate::lifecycle::HubState;
use agentctl_core::id::IdGen;
use agentctl_core::workspace::{validate_branch, Workspace, WorkspaceId, WorkspaceStatus};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Reject repo paths with traversal segments or NUL bytes before they
/// touch the filesystem.
fn validate_repo_path(repo_path: &Path) -> Result<(), HandlerError> {
    let raw = repo_path.display().to_string();
    if raw.contains('\0') {
        return Err(HandlerError::msg("Invalid field: repoPath"));
    }
    if repo_path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(HandlerError::msg("Invalid field: repoPath"));
    }
    Ok(())
}

/// Prepare a worktree for a handoff.
///
/// Returns the existing workspace when a non-terminal row already covers
/// the `(repo, branch)` pair.
pub async fn prepare(
    state: &Arc<HubState>,
    repo_path: &Path,
    branch: &str,
    owner: &str,
    handoff_id: &str,
) -> Result<Workspace, HandlerError> {
    validate_branch(branch).map_err(|e| HandlerError::msg(format!("Invalid field: branch ({e})")))?;
    validate_repo_path(repo_path)?;

    if let Some(existing) = state.stores.workspaces.find_active(repo_path, branch)? {
        info!(
            workspace_id = %existing.id,
            "reusing active workspace for {}#{branch}",
            repo_path.display()
        );
        return Ok(existing);
    }

    let id = WorkspaceId::new(state.ids.next());
    let worktree_path = state.paths.worktrees_dir.join(id.as_str());
    let workspace = Workspace {
        id: id.clone(),
        repo_path: repo_path.to_path_buf(),
        branch: branch.to_string(),
        worktree_path: worktree_path.clone(),
        owner_account: owner.to_string(),
        handoff_id: handoff_id.to_string(),
        status: WorkspaceStatus::Preparing,
    };
    state.stores.workspaces.insert(&workspace)?;

    let request = PrepareRequest {
        repo_path: repo_path.to_path_buf(),
        branch: branch.to_string(),
        worktree_path,
    };
    match state.worktrees.prepare(&request).await {
        Ok(()) => {
            state
                .stores
                .workspaces
                .set_status(id.as_str(), WorkspaceStatus::Ready)?;
            let mut ready = workspace;
            ready.status = WorkspaceStatus::Ready;
            info!(workspace_id = %id, branch, "worktree ready");
            Ok(ready)
        }
        Err(reason) => {
            state
                .stores
                .workspaces
                .set_status(id.as_str(), WorkspaceStatus::Failed)?;
            warn!(workspace_id = %id, reason, "worktree preparation failed");
            Err(HandlerError::msg(format!(
                "worktree preparation failed: {reason}"
            )))
        }
    }
}

/// Remove a workspace's worktree and delete its row.
pub async fn cleanup(state: &Arc<HubState>, workspace_id: &str) -> Result<Workspace, HandlerError> {
    let Some(workspace) = state.stores.workspaces.get(workspace_id)? else {
        return Err(HandlerError::not_found(format!("workspace {workspace_id}")));
    };

    state
        .stores
        .workspaces
        .set_status(workspace_id, WorkspaceStatus::Cleaning)?;

    match state
        .worktrees
        .cleanup(&workspace.repo_path, &workspace.worktree_path)
        .await
    {
        Ok(()) => {
            state.stores.workspaces.delete(workspace_id)?;
            info!(workspace_id, "workspace cleaned up");
            Ok(workspace)
        }
        Err(reason) => {
            state
                .stores
                .workspaces
                .set_status(workspace_id, WorkspaceStatus::Failed)?;
            Err(HandlerError::msg(format!("cleanup failed: {reason}")))
        }
    }
}
