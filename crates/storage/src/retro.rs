// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retro store: post-task retrospectives and their synthesised learnings.

use crate::db::{open_database, StoreError};
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A retro session tied to one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroSession {
    pub id: String,
    pub task_id: String,
    /// "open" until a synthesis is submitted, then "synthesized"
    pub status: String,
    #[serde(with = "agentctl_core::time_fmt::serde_iso_millis")]
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<String>,
    #[serde(
        default,
        with = "agentctl_core::time_fmt::serde_iso_millis_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub synthesized_at: Option<DateTime<Utc>>,
}

/// One submitted review within a retro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetroReview {
    pub account: String,
    pub content: String,
    #[serde(with = "agentctl_core::time_fmt::serde_iso_millis")]
    pub submitted_at: DateTime<Utc>,
}

pub struct RetroStore {
    conn: Mutex<Connection>,
}

impl RetroStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS retro_sessions (
                id             TEXT PRIMARY KEY,
                task_id        TEXT NOT NULL,
                status         TEXT NOT NULL DEFAULT 'open',
                started_at     TEXT NOT NULL,
                synthesis      TEXT,
                synthesized_at TEXT
            );
            CREATE TABLE IF NOT EXISTS retro_reviews (
                retro_id     TEXT NOT NULL,
                account      TEXT NOT NULL,
                content      TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_retro_reviews ON retro_reviews(retro_id, rowid);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn start(&self, id: &str, task_id: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO retro_sessions (id, task_id, started_at) VALUES (?1, ?2, ?3)",
            params![id, task_id, time_fmt::iso_millis(&now)],
        )?;
        Ok(())
    }

    pub fn submit_review(
        &self,
        retro_id: &str,
        account: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let exists: bool = conn
            .query_row(
                "SELECT 1 FROM retro_sessions WHERE id = ?1",
                params![retro_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO retro_reviews (retro_id, account, content, submitted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![retro_id, account, content, time_fmt::iso_millis(&now)],
        )?;
        Ok(true)
    }

    pub fn submit_synthesis(
        &self,
        retro_id: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let affected = self.conn.lock().execute(
            "UPDATE retro_sessions
             SET synthesis = ?2, synthesized_at = ?3, status = 'synthesized'
             WHERE id = ?1",
            params![retro_id, content, time_fmt::iso_millis(&now)],
        )?;
        Ok(affected > 0)
    }

    pub fn get(&self, retro_id: &str) -> Result<Option<(RetroSession, Vec<RetroReview>)>, StoreError> {
        let conn = self.conn.lock();
        let session = conn
            .query_row(
                "SELECT id, task_id, status, started_at, synthesis, synthesized_at
                 FROM retro_sessions WHERE id = ?1",
                params![retro_id],
                row_to_session,
            )
            .optional()?;
        let Some(session) = session else {
            return Ok(None);
        };
        let mut stmt = conn.prepare(
            "SELECT account, content, submitted_at FROM retro_reviews
             WHERE retro_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![retro_id], |row| {
            let submitted_at: String = row.get(2)?;
            Ok(RetroReview {
                account: row.get(0)?,
                content: row.get(1)?,
                submitted_at: time_fmt::parse_iso(&submitted_at).unwrap_or(DateTime::UNIX_EPOCH),
            })
        })?;
        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(Some((session, reviews)))
    }

    /// Synthesised learnings, optionally filtered by substring match.
    pub fn past_learnings(
        &self,
        query: Option<&str>,
        limit: u32,
    ) -> Result<Vec<RetroSession>, StoreError> {
        let limit = if limit == 0 { 20 } else { limit };
        let conn = self.conn.lock();
        let mut out = Vec::new();
        match query {
            Some(query) => {
                let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
                let mut stmt = conn.prepare(
                    "SELECT id, task_id, status, started_at, synthesis, synthesized_at
                     FROM retro_sessions
                     WHERE status = 'synthesized' AND synthesis LIKE ?1 ESCAPE '\\'
                     ORDER BY synthesized_at DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![pattern, limit], row_to_session)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, task_id, status, started_at, synthesis, synthesized_at
                     FROM retro_sessions
                     WHERE status = 'synthesized'
                     ORDER BY synthesized_at DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], row_to_session)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }
}

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<RetroSession> {
    let started_at: String = row.get(3)?;
    let synthesized_at: Option<String> = row.get(5)?;
    Ok(RetroSession {
        id: row.get(0)?,
        task_id: row.get(1)?,
        status: row.get(2)?,
        started_at: time_fmt::parse_iso(&started_at).unwrap_or(DateTime::UNIX_EPOCH),
        synthesis: row.get(4)?,
        synthesized_at: synthesized_at.as_deref().and_then(time_fmt::parse_iso),
    })
}

#[cfg(test)]
#[path = "retro_tests.rs"]
mod tests;
