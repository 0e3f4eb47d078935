// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git-worktree adapter.
//!
//! The workspace engine handles store bookkeeping (preparing → ready or
//! failed); the adapter only performs the filesystem work: `git worktree
//! add` on prepare, `git worktree remove` plus directory removal on
//! cleanup.

use crate::adapters::subprocess::{run_with_timeout, GIT_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Parameters for provisioning a worktree.
#[derive(Debug, Clone)]
pub struct PrepareRequest {
    pub repo_path: PathBuf,
    pub branch: String,
    pub worktree_path: PathBuf,
}

#[async_trait]
pub trait WorktreeAdapter: Send + Sync {
    /// Create the worktree on disk. The branch is created if missing.
    async fn prepare(&self, req: &PrepareRequest) -> Result<(), String>;

    /// Remove the worktree from disk. Best-effort on the git side; the
    /// directory must be gone on success.
    async fn cleanup(&self, repo_path: &Path, worktree_path: &Path) -> Result<(), String>;
}

/// Real adapter shelling out to git.
pub struct GitWorktreeAdapter;

#[async_trait]
impl WorktreeAdapter for GitWorktreeAdapter {
    async fn prepare(&self, req: &PrepareRequest) -> Result<(), String> {
        if !req.repo_path.is_dir() {
            return Err(format!("repo path does not exist: {}", req.repo_path.display()));
        }
        if let Some(parent) = req.worktree_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create worktree parent dir: {e}"))?;
        }

        let mut cmd = Command::new("git");
        cmd.args([
            "-C",
            &req.repo_path.display().to_string(),
            "worktree",
            "add",
            "-B",
            &req.branch,
            &req.worktree_path.display().to_string(),
        ])
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");

        let output = run_with_timeout(cmd, GIT_TIMEOUT, "git worktree add")
            .await
            .map_err(|e| e.to_string())?;
        if !output.passed() {
            return Err(format!("git worktree add failed: {}", output.stderr.trim()));
        }
        Ok(())
    }

    async fn cleanup(&self, repo_path: &Path, worktree_path: &Path) -> Result<(), String> {
        // Unregister the worktree first; fall back to plain removal
        let mut cmd = Command::new("git");
        cmd.args([
            "-C",
            &repo_path.display().to_string(),
            "worktree",
            "remove",
            "--force",
            &worktree_path.display().to_string(),
        ])
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE");
        let _ = run_with_timeout(cmd, GIT_TIMEOUT, "git worktree remove").await;

        if worktree_path.exists() {
            tokio::fs::remove_dir_all(worktree_path)
                .await
                .map_err(|e| format!("failed to remove worktree dir: {e}"))?;
        }
        Ok(())
    }
}

/// Test adapter that only touches the local filesystem.
#[cfg(test)]
pub struct FakeWorktreeAdapter;

#[cfg(test)]
#[async_trait]
impl WorktreeAdapter for FakeWorktreeAdapter {
    async fn prepare(&self, req: &PrepareRequest) -> Result<(), String> {
        tokio::fs::create_dir_all(&req.worktree_path)
            .await
            .map_err(|e| e.to_string())
    }

    async fn cleanup(&self, _repo_path: &Path, worktree_path: &Path) -> Result<(), String> {
        if worktree_path.exists() {
            tokio::fs::remove_dir_all(worktree_path)
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}
