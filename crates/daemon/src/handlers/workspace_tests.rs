// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::test_state;
use agentctl_core::workspace::WorkspaceStatus;
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn prepare_inspect_cleanup_cycle() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();

    let reply = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-1")
        .await
        .unwrap();
    assert_eq!(reply["ok"], json!(true));
    let id = reply["workspace"]["id"].as_str().unwrap().to_string();
    assert_eq!(reply["workspace"]["status"], json!("ready"));

    let status = get_workspace_status(&state, "bob", Some(&id)).unwrap();
    assert_eq!(status["workspace"]["ownerAccount"], json!("bob"));

    let listing = get_workspace_status(&state, "bob", None).unwrap();
    assert_eq!(listing["workspaces"].as_array().unwrap().len(), 1);

    cleanup_workspace(&state, &id).await.unwrap();
    assert!(get_workspace_status(&state, "bob", Some(&id)).is_err());
}

#[tokio::test]
async fn same_repo_branch_reuses_workspace() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();

    let first = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-1")
        .await
        .unwrap();
    let second = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-2")
        .await
        .unwrap();
    assert_eq!(first["workspace"]["id"], second["workspace"]["id"]);
    assert_eq!(state.stores.workspaces.list().unwrap().len(), 1);
}

#[tokio::test]
async fn traversal_branch_rejected() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();

    let err = prepare_worktree_for_handoff(&state, "bob", &repo, "../escape", "h-1")
        .await
        .unwrap_err();
    assert!(err.message.contains("branch"));
    assert!(state.stores.workspaces.list().unwrap().is_empty());
}

#[tokio::test]
async fn feature_gate_enforced() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    state.config.write().features.workspace_worktree = false;
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();

    let err = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-1")
        .await
        .unwrap_err();
    assert_eq!(err.message, "Workspace worktree not enabled");
}

#[tokio::test]
async fn failed_workspace_frees_the_branch_pair() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let repo = dir.path().join("repo");
    std::fs::create_dir_all(&repo).unwrap();

    let reply = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-1")
        .await
        .unwrap();
    let id = reply["workspace"]["id"].as_str().unwrap();
    state
        .stores
        .workspaces
        .set_status(id, WorkspaceStatus::Failed)
        .unwrap();

    // A new prepare gets a fresh workspace instead of the failed row
    let second = prepare_worktree_for_handoff(&state, "bob", &repo, "feat-1", "h-2")
        .await
        .unwrap();
    assert_ne!(second["workspace"]["id"].as_str().unwrap(), id);
}
