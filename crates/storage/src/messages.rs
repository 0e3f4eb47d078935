// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message store: durable mailbox per recipient.
//!
//! Ordering within a recipient is by timestamp, then insertion order
//! (rowid). Messages are immutable except for the `read` flag.

use crate::db::{open_database, StoreError};
use agentctl_core::message::{Message, MessageId, MessageKind};
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

pub struct MessageStore {
    conn: Mutex<Connection>,
}

impl MessageStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages (
                id           TEXT PRIMARY KEY,
                from_account TEXT NOT NULL,
                to_account   TEXT NOT NULL,
                kind         TEXT NOT NULL,
                content      TEXT NOT NULL,
                timestamp    TEXT NOT NULL,
                read         INTEGER NOT NULL DEFAULT 0,
                context      TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_messages_to
                ON messages(to_account, read, timestamp);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert a message, returning its id.
    pub fn add_message(&self, message: &Message) -> Result<MessageId, StoreError> {
        let context = message
            .context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        self.conn.lock().execute(
            "INSERT INTO messages (id, from_account, to_account, kind, content, timestamp, read, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                message.id.as_str(),
                message.from,
                message.to,
                message.kind.as_str(),
                message.content,
                time_fmt::iso_millis(&message.timestamp),
                message.read,
                context,
            ],
        )?;
        Ok(message.id.clone())
    }

    /// Unread messages for a recipient, ascending by timestamp.
    pub fn get_unread_messages(&self, to: &str) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, from_account, to_account, kind, content, timestamp, read, context
             FROM messages WHERE to_account = ?1 AND read = 0
             ORDER BY timestamp ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![to], row_to_message)?;
        collect(rows)
    }

    /// Recent messages for a recipient, descending, with limit/offset paging.
    pub fn get_messages(&self, to: &str, limit: u32, offset: u32) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, from_account, to_account, kind, content, timestamp, read, context
             FROM messages WHERE to_account = ?1
             ORDER BY timestamp DESC, rowid DESC LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt.query_map(params![to, limit, offset], row_to_message)?;
        collect(rows)
    }

    /// Mark everything for a recipient read; returns affected rows.
    pub fn mark_all_read(&self, to: &str) -> Result<usize, StoreError> {
        Ok(self.conn.lock().execute(
            "UPDATE messages SET read = 1 WHERE to_account = ?1 AND read = 0",
            params![to],
        )?)
    }

    pub fn count_unread(&self, to: &str) -> Result<u64, StoreError> {
        let conn = self.conn.lock();
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE to_account = ?1 AND read = 0",
            params![to],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// All handoffs delivered to a recipient, ascending.
    pub fn get_handoffs(&self, to: &str) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, from_account, to_account, kind, content, timestamp, read, context
             FROM messages WHERE to_account = ?1 AND kind = 'handoff'
             ORDER BY timestamp ASC, rowid ASC",
        )?;
        let rows = stmt.query_map(params![to], row_to_message)?;
        collect(rows)
    }

    /// Look up one message by id.
    pub fn get_message(&self, id: &str) -> Result<Option<Message>, StoreError> {
        let conn = self.conn.lock();
        let message = conn
            .query_row(
                "SELECT id, from_account, to_account, kind, content, timestamp, read, context
                 FROM messages WHERE id = ?1",
                params![id],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    /// A handoff addressed to `to`, by id.
    pub fn get_handoff_for(&self, to: &str, id: &str) -> Result<Option<Message>, StoreError> {
        let conn = self.conn.lock();
        let message = conn
            .query_row(
                "SELECT id, from_account, to_account, kind, content, timestamp, read, context
                 FROM messages WHERE id = ?1 AND to_account = ?2 AND kind = 'handoff'",
                params![id, to],
                row_to_message,
            )
            .optional()?;
        Ok(message)
    }

    pub fn mark_read(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self
            .conn
            .lock()
            .execute("UPDATE messages SET read = 1 WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Delete read messages older than the cutoff; returns the count removed.
    ///
    /// Running it twice in succession removes nothing the second time.
    pub fn archive_old(&self, days: u32, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let cutoff = now - chrono::Duration::days(i64::from(days));
        Ok(self.conn.lock().execute(
            "DELETE FROM messages WHERE read = 1 AND timestamp < ?1",
            params![time_fmt::iso_millis(&cutoff)],
        )?)
    }
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let kind: String = row.get(3)?;
    let timestamp: String = row.get(5)?;
    let context: Option<String> = row.get(7)?;
    Ok(Message {
        id: MessageId::new(row.get::<_, String>(0)?),
        from: row.get(1)?,
        to: row.get(2)?,
        kind: if kind == "handoff" {
            MessageKind::Handoff
        } else {
            MessageKind::Message
        },
        content: row.get(4)?,
        timestamp: time_fmt::parse_iso(&timestamp).unwrap_or(DateTime::UNIX_EPOCH),
        read: row.get(6)?,
        context: context.and_then(|c| serde_json::from_str(&c).ok()),
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<Message>>,
) -> Result<Vec<Message>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "messages_tests.rs"]
mod tests;
