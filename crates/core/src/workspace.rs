// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace entity and lifecycle status.
//!
//! A workspace is an isolated working copy of a repository (a git worktree)
//! owned by one account and tied to one handoff. At most one non-terminal
//! workspace may exist per `(repo_path, branch)` pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a workspace instance.
    pub struct WorkspaceId;
}

/// Status of a workspace in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// Worktree creation in progress
    #[default]
    Preparing,
    /// Worktree exists and is usable
    Ready,
    /// Worktree removal in progress
    Cleaning,
    /// Creation failed; row kept for inspection
    Failed,
}

impl WorkspaceStatus {
    /// Terminal workspaces do not count against the `(repo, branch)` uniqueness rule.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkspaceStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceStatus::Preparing => "preparing",
            WorkspaceStatus::Ready => "ready",
            WorkspaceStatus::Cleaning => "cleaning",
            WorkspaceStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<WorkspaceStatus> {
        match s {
            "preparing" => Some(WorkspaceStatus::Preparing),
            "ready" => Some(WorkspaceStatus::Ready),
            "cleaning" => Some(WorkspaceStatus::Cleaning),
            "failed" => Some(WorkspaceStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Workspace validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("branch name must not be empty")]
    EmptyBranch,

    #[error("branch name contains a path traversal segment: {0}")]
    Traversal(String),

    #[error("branch name must be relative: {0}")]
    Absolute(String),

    #[error("branch name contains a NUL byte")]
    NulByte,
}

/// Validate a branch name before it is used to derive filesystem paths.
///
/// Rejects `..` segments, absolute paths, and NUL bytes.
pub fn validate_branch(branch: &str) -> Result<(), WorkspaceError> {
    if branch.is_empty() {
        return Err(WorkspaceError::EmptyBranch);
    }
    if branch.contains('\0') {
        return Err(WorkspaceError::NulByte);
    }
    if branch.starts_with('/') || branch.starts_with('\\') {
        return Err(WorkspaceError::Absolute(branch.to_string()));
    }
    if branch.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(WorkspaceError::Traversal(branch.to_string()));
    }
    Ok(())
}

/// An isolated working copy associated with one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: WorkspaceId,
    pub repo_path: PathBuf,
    pub branch: String,
    pub worktree_path: PathBuf,
    pub owner_account: String,
    pub handoff_id: String,
    pub status: WorkspaceStatus,
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
