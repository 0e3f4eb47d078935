// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trust store: durable per-account trust records.
//!
//! The delta arithmetic lives in `agentctl_core::trust`; this store only
//! loads, applies and persists, so score updates stay deterministic.

use crate::db::{open_database, StoreError};
use agentctl_core::trust::{TrustOutcome, TrustRecord};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

pub struct TrustStore {
    conn: Mutex<Connection>,
}

impl TrustStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trust (
                account              TEXT PRIMARY KEY,
                score                INTEGER NOT NULL,
                completed            INTEGER NOT NULL DEFAULT 0,
                failed               INTEGER NOT NULL DEFAULT 0,
                rejected             INTEGER NOT NULL DEFAULT 0,
                sla_hits             INTEGER NOT NULL DEFAULT 0,
                sla_misses           INTEGER NOT NULL DEFAULT 0,
                consecutive_failures INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// The account's record, or the default for unseen accounts.
    pub fn get(&self, account: &str) -> Result<TrustRecord, StoreError> {
        let conn = self.conn.lock();
        let record = conn
            .query_row(
                "SELECT score, completed, failed, rejected, sla_hits, sla_misses, consecutive_failures
                 FROM trust WHERE account = ?1",
                params![account],
                row_to_record,
            )
            .optional()?;
        Ok(record.unwrap_or_default())
    }

    /// Apply an outcome, returning `(old_score, new_score)`.
    pub fn apply(&self, account: &str, outcome: TrustOutcome) -> Result<(i64, i64), StoreError> {
        let mut record = self.get(account)?;
        let (old, new) = record.apply(outcome);
        self.save(account, &record)?;
        Ok((old, new))
    }

    /// Reset the circuit breaker for an account; returns the updated record.
    pub fn reinstate(&self, account: &str) -> Result<TrustRecord, StoreError> {
        let mut record = self.get(account)?;
        record.reinstate();
        self.save(account, &record)?;
        Ok(record)
    }

    pub fn all(&self) -> Result<Vec<(String, TrustRecord)>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT account, score, completed, failed, rejected, sla_hits, sla_misses, consecutive_failures
             FROM trust ORDER BY account ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let account: String = row.get(0)?;
            Ok((
                account,
                TrustRecord {
                    score: row.get(1)?,
                    completed: row.get(2)?,
                    failed: row.get(3)?,
                    rejected: row.get(4)?,
                    sla_hits: row.get(5)?,
                    sla_misses: row.get(6)?,
                    consecutive_failures: row.get(7)?,
                },
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save(&self, account: &str, record: &TrustRecord) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO trust (account, score, completed, failed, rejected, sla_hits, sla_misses, consecutive_failures)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(account) DO UPDATE SET
                score = excluded.score,
                completed = excluded.completed,
                failed = excluded.failed,
                rejected = excluded.rejected,
                sla_hits = excluded.sla_hits,
                sla_misses = excluded.sla_misses,
                consecutive_failures = excluded.consecutive_failures",
            params![
                account,
                record.score,
                record.completed,
                record.failed,
                record.rejected,
                record.sla_hits,
                record.sla_misses,
                record.consecutive_failures,
            ],
        )?;
        Ok(())
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TrustRecord> {
    Ok(TrustRecord {
        score: row.get(0)?,
        completed: row.get(1)?,
        failed: row.get(2)?,
        rejected: row.get(3)?,
        sla_hits: row.get(4)?,
        sla_misses: row.get(5)?,
        consecutive_failures: row.get(6)?,
    })
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
