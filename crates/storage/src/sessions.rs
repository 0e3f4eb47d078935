// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry: durable naming and lookup for shared sessions.
//!
//! Live session state is in-memory only (see the daemon's session
//! manager); this store records that a session existed, who paired, and
//! any friendly name assigned to it.

use crate::db::{open_database, StoreError};
use agentctl_core::session::SharedSession;
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A registered session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub initiator: String,
    pub participant: String,
    #[serde(with = "agentctl_core::time_fmt::serde_iso_millis")]
    pub started_at: DateTime<Utc>,
    #[serde(
        default,
        with = "agentctl_core::time_fmt::serde_iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<DateTime<Utc>>,
}

pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id          TEXT PRIMARY KEY,
                name        TEXT,
                initiator   TEXT NOT NULL,
                participant TEXT NOT NULL,
                started_at  TEXT NOT NULL,
                ended_at    TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn record_started(&self, session: &SharedSession) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO sessions (id, initiator, participant, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.id.as_str(),
                session.initiator,
                session.participant,
                time_fmt::iso_millis(&session.started_at),
            ],
        )?;
        Ok(())
    }

    pub fn record_ended(&self, id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE sessions SET ended_at = ?2 WHERE id = ?1 AND ended_at IS NULL",
            params![id, time_fmt::iso_millis(&now)],
        )?;
        Ok(())
    }

    /// Assign a friendly name; returns false when the session is unknown.
    pub fn set_name(&self, id: &str, name: &str) -> Result<bool, StoreError> {
        let affected = self.conn.lock().execute(
            "UPDATE sessions SET name = ?2 WHERE id = ?1",
            params![id, name],
        )?;
        Ok(affected > 0)
    }

    pub fn get(&self, id: &str) -> Result<Option<SessionRow>, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, name, initiator, participant, started_at, ended_at
                 FROM sessions WHERE id = ?1",
                params![id],
                row_to_session,
            )
            .optional()?;
        Ok(row)
    }

    pub fn list(&self, limit: u32) -> Result<Vec<SessionRow>, StoreError> {
        let limit = if limit == 0 { 50 } else { limit };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, initiator, participant, started_at, ended_at
             FROM sessions ORDER BY started_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_session)?;
        collect(rows)
    }

    /// Substring search over name and members.
    pub fn search(&self, query: &str, limit: u32) -> Result<Vec<SessionRow>, StoreError> {
        let limit = if limit == 0 { 20 } else { limit };
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, name, initiator, participant, started_at, ended_at
             FROM sessions
             WHERE name LIKE ?1 ESCAPE '\\'
                OR initiator LIKE ?1 ESCAPE '\\'
                OR participant LIKE ?1 ESCAPE '\\'
             ORDER BY started_at DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit], row_to_session)?;
        collect(rows)
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    let started_at: String = row.get(4)?;
    let ended_at: Option<String> = row.get(5)?;
    Ok(SessionRow {
        id: row.get(0)?,
        name: row.get(1)?,
        initiator: row.get(2)?,
        participant: row.get(3)?,
        started_at: time_fmt::parse_iso(&started_at).unwrap_or(DateTime::UNIX_EPOCH),
        ended_at: ended_at.as_deref().and_then(time_fmt::parse_iso),
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<SessionRow>>,
) -> Result<Vec<SessionRow>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
