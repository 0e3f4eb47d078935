// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task board: the `tasks.json` file holding every task and its event log.
//!
//! The board is one of the small JSON-file entities. Mutations persist
//! atomically before they are visible; a failed write leaves the
//! in-memory board unchanged so no events are emitted for it.

use crate::db::StoreError;
use crate::json_store::{backup_stamp, backup_versioned, load_json, save_json_atomic};
use agentctl_core::task::{Task, TaskError, TaskLink, TaskStatus};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Board file schema version.
const BOARD_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BoardData {
    #[serde(default, rename = "schemaVersion")]
    schema_version: u32,
    #[serde(default)]
    tasks: BTreeMap<String, Task>,
}

pub struct TaskBoard {
    path: PathBuf,
    data: Mutex<BoardData>,
}

impl TaskBoard {
    pub fn open(path: impl Into<PathBuf>, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut data: BoardData = load_json(&path)?;

        if path.exists() && data.schema_version < BOARD_SCHEMA_VERSION {
            // Upgrade in place, leaving a timestamped copy of the old file
            if let Some(backup) = backup_versioned(&path, data.schema_version)? {
                info!(
                    backup = %backup.display(),
                    from = data.schema_version,
                    to = BOARD_SCHEMA_VERSION,
                    stamp = %backup_stamp(now),
                    "upgraded task board schema"
                );
            }
            data.schema_version = BOARD_SCHEMA_VERSION;
            save_json_atomic(&path, &data)?;
        } else if !path.exists() {
            data.schema_version = BOARD_SCHEMA_VERSION;
            save_json_atomic(&path, &data)?;
        }

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.data.lock().tasks.get(id).cloned()
    }

    /// Insert a fresh task and persist.
    pub fn insert(&self, task: Task) -> Result<(), StoreError> {
        let mut guard = self.data.lock();
        let mut next = guard.clone();
        next.tasks.insert(task.id.to_string(), task);
        save_json_atomic(&self.path, &next)?;
        *guard = next;
        Ok(())
    }

    /// Apply a closure to one task and persist the result.
    ///
    /// The closure's error (e.g. an invalid transition) aborts the update
    /// without touching the stored board.
    pub fn update(
        &self,
        id: &str,
        f: impl FnOnce(&mut Task) -> Result<(), TaskError>,
    ) -> Result<Task, StoreError> {
        let mut guard = self.data.lock();
        let mut next = guard.clone();
        let task = next
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("task {id}")))?;
        f(task)?;
        let updated = task.clone();
        save_json_atomic(&self.path, &next)?;
        *guard = next;
        Ok(updated)
    }

    /// Record a typed link between two tasks.
    pub fn link(&self, from: &str, link: TaskLink) -> Result<Task, StoreError> {
        let mut guard = self.data.lock();
        if !guard.tasks.contains_key(link.to.as_str()) {
            return Err(StoreError::NotFound(format!("task {}", link.to)));
        }
        let mut next = guard.clone();
        let task = next
            .tasks
            .get_mut(from)
            .ok_or_else(|| StoreError::NotFound(format!("task {from}")))?;
        task.links.push(link);
        let updated = task.clone();
        save_json_atomic(&self.path, &next)?;
        *guard = next;
        Ok(updated)
    }

    pub fn list(&self) -> Vec<Task> {
        self.data.lock().tasks.values().cloned().collect()
    }

    pub fn with_status(&self, status: TaskStatus) -> Vec<Task> {
        self.data
            .lock()
            .tasks
            .values()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    pub fn for_assignee(&self, assignee: &str) -> Vec<Task> {
        self.data
            .lock()
            .tasks
            .values()
            .filter(|t| t.assignee == assignee)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.data.lock().tasks.len()
    }
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
