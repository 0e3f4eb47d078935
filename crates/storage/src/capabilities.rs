// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability store: per-account skills and derived routing counters.

use crate::db::{open_database, StoreError};
use agentctl_core::capability::CapabilityRecord;
use agentctl_core::time_fmt;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;

pub struct CapabilityStore {
    conn: Mutex<Connection>,
}

impl CapabilityStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS capabilities (
                account              TEXT PRIMARY KEY,
                skills               TEXT NOT NULL DEFAULT '[]',
                accepted             INTEGER NOT NULL DEFAULT 0,
                total                INTEGER NOT NULL DEFAULT 0,
                avg_duration_minutes REAL NOT NULL DEFAULT 0,
                last_activity        TEXT
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get(&self, account: &str) -> Result<Option<CapabilityRecord>, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT skills, accepted, total, avg_duration_minutes, last_activity
                 FROM capabilities WHERE account = ?1",
                params![account],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    /// Replace the skill set for an account (creating the row if needed).
    pub fn set_skills(&self, account: &str, skills: &BTreeSet<String>) -> Result<(), StoreError> {
        let skills = serde_json::to_string(skills)?;
        self.conn.lock().execute(
            "INSERT INTO capabilities (account, skills) VALUES (?1, ?2)
             ON CONFLICT(account) DO UPDATE SET skills = excluded.skills",
            params![account, skills],
        )?;
        Ok(())
    }

    /// Record a task outcome: bumps totals and folds the duration into the
    /// rolling average when the task was accepted.
    pub fn record_outcome(
        &self,
        account: &str,
        accepted: bool,
        duration_minutes: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO capabilities (account) VALUES (?1)
             ON CONFLICT(account) DO NOTHING",
            params![account],
        )?;
        let (accepted_count, avg): (u64, f64) = conn.query_row(
            "SELECT accepted, avg_duration_minutes FROM capabilities WHERE account = ?1",
            params![account],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let (new_accepted, new_avg) = if accepted {
            let n = accepted_count + 1;
            let avg = match duration_minutes {
                Some(d) => (avg * accepted_count as f64 + d) / n as f64,
                None => avg,
            };
            (n, avg)
        } else {
            (accepted_count, avg)
        };

        conn.execute(
            "UPDATE capabilities
             SET accepted = ?2, total = total + 1, avg_duration_minutes = ?3, last_activity = ?4
             WHERE account = ?1",
            params![account, new_accepted, new_avg, time_fmt::iso_millis(&now)],
        )?;
        Ok(())
    }

    /// Touch the last-activity timestamp without recording an outcome.
    pub fn touch(&self, account: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO capabilities (account, last_activity) VALUES (?1, ?2)
             ON CONFLICT(account) DO UPDATE SET last_activity = excluded.last_activity",
            params![account, time_fmt::iso_millis(&now)],
        )?;
        Ok(())
    }

    pub fn all(&self) -> Result<Vec<(String, CapabilityRecord)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT account, skills, accepted, total, avg_duration_minutes, last_activity
             FROM capabilities ORDER BY account ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let account: String = row.get(0)?;
            let skills: String = row.get(1)?;
            let last_activity: Option<String> = row.get(5)?;
            Ok((
                account,
                CapabilityRecord {
                    skills: serde_json::from_str(&skills).unwrap_or_default(),
                    accepted: row.get(2)?,
                    total: row.get(3)?,
                    avg_duration_minutes: row.get(4)?,
                    last_activity: last_activity.as_deref().and_then(time_fmt::parse_iso),
                },
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<CapabilityRecord> {
    let skills: String = row.get(0)?;
    let last_activity: Option<String> = row.get(4)?;
    Ok(CapabilityRecord {
        skills: serde_json::from_str(&skills).unwrap_or_default(),
        accepted: row.get(1)?,
        total: row.get(2)?,
        avg_duration_minutes: row.get(3)?,
        last_activity: last_activity.as_deref().and_then(time_fmt::parse_iso),
    })
}

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;
