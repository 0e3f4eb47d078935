// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow run store.
//!
//! Definitions live as YAML files under the base directory; this store
//! tracks their executions (DAG runs) and per-step outcomes.

use crate::db::{open_database, StoreError};
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Outcome of one workflow step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub name: String,
    /// "pending", "running", "completed", "failed", "skipped"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// One execution of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    pub workflow: String,
    /// "running", "completed", "failed", "cancelled"
    pub status: String,
    pub triggered_by: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(with = "agentctl_core::time_fmt::serde_iso_millis")]
    pub started_at: DateTime<Utc>,
    #[serde(
        default,
        with = "agentctl_core::time_fmt::serde_iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

pub struct WorkflowStore {
    conn: Mutex<Connection>,
}

impl WorkflowStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workflow_runs (
                id           TEXT PRIMARY KEY,
                workflow     TEXT NOT NULL,
                status       TEXT NOT NULL,
                triggered_by TEXT NOT NULL,
                params       TEXT NOT NULL DEFAULT '{}',
                started_at   TEXT NOT NULL,
                finished_at  TEXT,
                error        TEXT,
                steps        TEXT NOT NULL DEFAULT '[]'
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO workflow_runs (id, workflow, status, triggered_by, params, started_at, finished_at, error, steps)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.id,
                run.workflow,
                run.status,
                run.triggered_by,
                serde_json::to_string(&run.params)?,
                time_fmt::iso_millis(&run.started_at),
                run.finished_at.map(|t| time_fmt::iso_millis(&t)),
                run.error,
                serde_json::to_string(&run.steps)?,
            ],
        )?;
        Ok(())
    }

    /// Update run status, steps and (optionally) completion data.
    pub fn update(&self, run: &WorkflowRun) -> Result<bool, StoreError> {
        let affected = self.conn.lock().execute(
            "UPDATE workflow_runs
             SET status = ?2, finished_at = ?3, error = ?4, steps = ?5
             WHERE id = ?1",
            params![
                run.id,
                run.status,
                run.finished_at.map(|t| time_fmt::iso_millis(&t)),
                run.error,
                serde_json::to_string(&run.steps)?,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn get(&self, id: &str) -> Result<Option<WorkflowRun>, StoreError> {
        let conn = self.conn.lock();
        let run = conn
            .query_row(
                "SELECT id, workflow, status, triggered_by, params, started_at, finished_at, error, steps
                 FROM workflow_runs WHERE id = ?1",
                params![id],
                row_to_run,
            )
            .optional()?;
        Ok(run)
    }

    pub fn list(&self, limit: u32) -> Result<Vec<WorkflowRun>, StoreError> {
        let limit = if limit == 0 { 20 } else { limit };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, workflow, status, triggered_by, params, started_at, finished_at, error, steps
             FROM workflow_runs ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_run)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<WorkflowRun> {
    let params_json: String = row.get(4)?;
    let started_at: String = row.get(5)?;
    let finished_at: Option<String> = row.get(6)?;
    let steps: String = row.get(8)?;
    Ok(WorkflowRun {
        id: row.get(0)?,
        workflow: row.get(1)?,
        status: row.get(2)?,
        triggered_by: row.get(3)?,
        params: serde_json::from_str(&params_json).unwrap_or_default(),
        started_at: time_fmt::parse_iso(&started_at).unwrap_or(DateTime::UNIX_EPOCH),
        finished_at: finished_at.as_deref().and_then(time_fmt::parse_iso),
        error: row.get(7)?,
        steps: serde_json::from_str(&steps).unwrap_or_default(),
    })
}
