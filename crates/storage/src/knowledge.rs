// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge store: indexed notes with full-text search.

use crate::db::{fts_phrase, open_database, StoreError};
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub account: String,
    #[serde(with = "agentctl_core::time_fmt::serde_iso_millis")]
    pub timestamp: DateTime<Utc>,
}

pub struct KnowledgeStore {
    conn: Mutex<Connection>,
}

impl KnowledgeStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS notes (
                id        TEXT PRIMARY KEY,
                title     TEXT NOT NULL,
                content   TEXT NOT NULL,
                tags      TEXT NOT NULL DEFAULT '[]',
                account   TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
                title, content, tags,
                content='notes', content_rowid='rowid'
            );
            CREATE TRIGGER IF NOT EXISTS notes_fts_insert AFTER INSERT ON notes BEGIN
                INSERT INTO notes_fts(rowid, title, content, tags)
                VALUES (new.rowid, new.title, new.content, new.tags);
            END;
            CREATE TRIGGER IF NOT EXISTS notes_fts_delete AFTER DELETE ON notes BEGIN
                INSERT INTO notes_fts(notes_fts, rowid, title, content, tags)
                VALUES ('delete', old.rowid, old.title, old.content, old.tags);
            END;",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn index_note(&self, note: &Note) -> Result<(), StoreError> {
        let tags = serde_json::to_string(&note.tags)?;
        self.conn.lock().execute(
            "INSERT INTO notes (id, title, content, tags, account, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                note.id,
                note.title,
                note.content,
                tags,
                note.account,
                time_fmt::iso_millis(&note.timestamp),
            ],
        )?;
        Ok(())
    }

    pub fn search(&self, query: &str, limit: u32) -> Result<Vec<Note>, StoreError> {
        let limit = if limit == 0 { 20 } else { limit };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT n.id, n.title, n.content, n.tags, n.account, n.timestamp
             FROM notes n
             JOIN notes_fts ON n.rowid = notes_fts.rowid
             WHERE notes_fts MATCH ?1
             ORDER BY notes_fts.rank LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![fts_phrase(query), limit], row_to_note)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        Ok(conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?)
    }
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let tags: String = row.get(3)?;
    let timestamp: String = row.get(5)?;
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        account: row.get(4)?,
        timestamp: time_fmt::parse_iso(&timestamp).unwrap_or(DateTime::UNIX_EPOCH),
    })
}

#[cfg(test)]
#[path = "knowledge_tests.rs"]
mod tests;
