// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity store: append-only event log with full-text search.
//!
//! The FTS5 index covers `(kind, account, metadata)` and is joined back to
//! the primary table for results.

use crate::db::{fts_phrase, open_database, StoreError};
use agentctl_core::activity::{ActivityEvent, ActivityKind, NewActivity};
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;

/// Filter for [`ActivityStore::query`]; all fields are conjunctive.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub kind: Option<ActivityKind>,
    pub account: Option<String>,
    pub workflow_run_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: u32,
}

pub struct ActivityStore {
    conn: Mutex<Connection>,
}

impl ActivityStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS activity (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                kind            TEXT NOT NULL,
                timestamp       TEXT NOT NULL,
                account         TEXT NOT NULL,
                task_id         TEXT,
                workflow_run_id TEXT,
                metadata        TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_activity_kind ON activity(kind, id);
            CREATE INDEX IF NOT EXISTS idx_activity_account ON activity(account, id);
            CREATE VIRTUAL TABLE IF NOT EXISTS activity_fts USING fts5(
                kind, account, metadata,
                content='activity', content_rowid='id'
            );
            CREATE TRIGGER IF NOT EXISTS activity_fts_insert AFTER INSERT ON activity BEGIN
                INSERT INTO activity_fts(rowid, kind, account, metadata)
                VALUES (new.id, new.kind, new.account, new.metadata);
            END;
            CREATE TRIGGER IF NOT EXISTS activity_fts_delete AFTER DELETE ON activity BEGIN
                INSERT INTO activity_fts(activity_fts, rowid, kind, account, metadata)
                VALUES ('delete', old.id, old.kind, old.account, old.metadata);
            END;",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert an event, returning it with its assigned id.
    pub fn emit(&self, event: NewActivity, now: DateTime<Utc>) -> Result<ActivityEvent, StoreError> {
        let metadata = serde_json::to_string(&event.metadata)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO activity (kind, timestamp, account, task_id, workflow_run_id, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.kind.as_str(),
                time_fmt::iso_millis(&now),
                event.account,
                event.task_id,
                event.workflow_run_id,
                metadata,
            ],
        )?;
        Ok(ActivityEvent {
            id: conn.last_insert_rowid(),
            kind: event.kind,
            timestamp: now,
            account: event.account,
            task_id: event.task_id,
            workflow_run_id: event.workflow_run_id,
            metadata: event.metadata,
        })
    }

    /// Filtered listing, newest first.
    pub fn query(&self, filter: &ActivityFilter) -> Result<Vec<ActivityEvent>, StoreError> {
        let mut sql = String::from(
            "SELECT id, kind, timestamp, account, task_id, workflow_run_id, metadata
             FROM activity WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();
        if let Some(kind) = filter.kind {
            args.push(kind.as_str().to_string());
            sql.push_str(&format!(" AND kind = ?{}", args.len()));
        }
        if let Some(account) = &filter.account {
            args.push(account.clone());
            sql.push_str(&format!(" AND account = ?{}", args.len()));
        }
        if let Some(run_id) = &filter.workflow_run_id {
            args.push(run_id.clone());
            sql.push_str(&format!(" AND workflow_run_id = ?{}", args.len()));
        }
        if let Some(since) = &filter.since {
            args.push(time_fmt::iso_millis(since));
            sql.push_str(&format!(" AND timestamp >= ?{}", args.len()));
        }
        let limit = if filter.limit == 0 { 100 } else { filter.limit };
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {limit}"));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), row_to_event)?;
        collect(rows)
    }

    /// Full-text search over `(kind, account, metadata)`, newest first.
    pub fn search(&self, text: &str, limit: u32) -> Result<Vec<ActivityEvent>, StoreError> {
        let limit = if limit == 0 { 50 } else { limit };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.kind, a.timestamp, a.account, a.task_id, a.workflow_run_id, a.metadata
             FROM activity a
             JOIN activity_fts ON a.id = activity_fts.rowid
             WHERE activity_fts MATCH ?1
             ORDER BY a.id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_phrase(text), limit], row_to_event)?;
        collect(rows)
    }
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<ActivityEvent> {
    let kind: String = row.get(1)?;
    let timestamp: String = row.get(2)?;
    let metadata: String = row.get(6)?;
    Ok(ActivityEvent {
        id: row.get(0)?,
        kind: ActivityKind::parse(&kind).unwrap_or(ActivityKind::TaskCreated),
        timestamp: time_fmt::parse_iso(&timestamp).unwrap_or(DateTime::UNIX_EPOCH),
        account: row.get(3)?,
        task_id: row.get(4)?,
        workflow_run_id: row.get(5)?,
        metadata: serde_json::from_str(&metadata).unwrap_or_default(),
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<ActivityEvent>>,
) -> Result<Vec<ActivityEvent>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
