// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace store.
//!
//! A partial unique index enforces that at most one non-terminal row
//! exists per `(repo_path, branch)` pair; inserts that would violate it
//! surface as [`StoreError::Conflict`].

use crate::db::{open_database, StoreError};
use agentctl_core::workspace::{Workspace, WorkspaceId, WorkspaceStatus};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

pub struct WorkspaceStore {
    conn: Mutex<Connection>,
}

impl WorkspaceStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workspaces (
                id            TEXT PRIMARY KEY,
                repo_path     TEXT NOT NULL,
                branch        TEXT NOT NULL,
                worktree_path TEXT NOT NULL,
                owner_account TEXT NOT NULL,
                handoff_id    TEXT NOT NULL,
                status        TEXT NOT NULL
            );
            CREATE UNIQUE INDEX IF NOT EXISTS idx_workspaces_active
                ON workspaces(repo_path, branch)
                WHERE status IN ('preparing', 'ready', 'cleaning');",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, workspace: &Workspace) -> Result<(), StoreError> {
        let result = self.conn.lock().execute(
            "INSERT INTO workspaces (id, repo_path, branch, worktree_path, owner_account, handoff_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                workspace.id.as_str(),
                path_str(&workspace.repo_path),
                workspace.branch,
                path_str(&workspace.worktree_path),
                workspace.owner_account,
                workspace.handoff_id,
                workspace.status.as_str(),
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Conflict(format!(
                    "active workspace already exists for {}#{}",
                    workspace.repo_path.display(),
                    workspace.branch
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let workspace = conn
            .query_row(
                "SELECT id, repo_path, branch, worktree_path, owner_account, handoff_id, status
                 FROM workspaces WHERE id = ?1",
                params![id],
                row_to_workspace,
            )
            .optional()?;
        Ok(workspace)
    }

    /// Non-terminal workspace for a `(repo, branch)` pair, if any.
    pub fn find_active(&self, repo_path: &Path, branch: &str) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let workspace = conn
            .query_row(
                "SELECT id, repo_path, branch, worktree_path, owner_account, handoff_id, status
                 FROM workspaces
                 WHERE repo_path = ?1 AND branch = ?2
                   AND status IN ('preparing', 'ready', 'cleaning')",
                params![path_str(repo_path), branch],
                row_to_workspace,
            )
            .optional()?;
        Ok(workspace)
    }

    /// Workspace tied to a handoff, if any.
    pub fn find_by_handoff(&self, handoff_id: &str) -> Result<Option<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let workspace = conn
            .query_row(
                "SELECT id, repo_path, branch, worktree_path, owner_account, handoff_id, status
                 FROM workspaces WHERE handoff_id = ?1 ORDER BY rowid DESC LIMIT 1",
                params![handoff_id],
                row_to_workspace,
            )
            .optional()?;
        Ok(workspace)
    }

    pub fn set_status(&self, id: &str, status: WorkspaceStatus) -> Result<bool, StoreError> {
        let affected = self.conn.lock().execute(
            "UPDATE workspaces SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(affected > 0)
    }

    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self
            .conn
            .lock()
            .execute("DELETE FROM workspaces WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    pub fn list(&self) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, repo_path, branch, worktree_path, owner_account, handoff_id, status
             FROM workspaces ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map([], row_to_workspace)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn list_for_account(&self, owner: &str) -> Result<Vec<Workspace>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, repo_path, branch, worktree_path, owner_account, handoff_id, status
             FROM workspaces WHERE owner_account = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![owner], row_to_workspace)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn path_str(path: &Path) -> String {
    path.display().to_string()
}

fn row_to_workspace(row: &Row<'_>) -> rusqlite::Result<Workspace> {
    let status: String = row.get(6)?;
    Ok(Workspace {
        id: WorkspaceId::new(row.get::<_, String>(0)?),
        repo_path: PathBuf::from(row.get::<_, String>(1)?),
        branch: row.get(2)?,
        worktree_path: PathBuf::from(row.get::<_, String>(3)?),
        owner_account: row.get(4)?,
        handoff_id: row.get(5)?,
        status: WorkspaceStatus::parse(&status).unwrap_or(WorkspaceStatus::Failed),
    })
}

#[cfg(test)]
#[path = "workspaces_tests.rs"]
mod tests;
