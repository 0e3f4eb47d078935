// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verification receipt store. Receipts are append-only.

use crate::db::{open_database, StoreError};
use agentctl_core::receipt::{VerificationMethod, VerificationReceipt, Verdict};
use agentctl_core::task::TaskId;
use agentctl_core::time_fmt;
use chrono::DateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::Path;

pub struct ReceiptStore {
    conn: Mutex<Connection>,
}

impl ReceiptStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = open_database(path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS receipts (
                task_id      TEXT NOT NULL,
                delegator    TEXT NOT NULL,
                delegatee    TEXT NOT NULL,
                spec_payload TEXT NOT NULL,
                verdict      TEXT NOT NULL,
                method       TEXT NOT NULL,
                timestamp    TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_receipts_task ON receipts(task_id, rowid);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, receipt: &VerificationReceipt) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO receipts (task_id, delegator, delegatee, spec_payload, verdict, method, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                receipt.task_id.as_str(),
                receipt.delegator,
                receipt.delegatee,
                receipt.spec_payload,
                receipt.verdict.as_str(),
                receipt.method.as_str(),
                time_fmt::iso_millis(&receipt.timestamp),
            ],
        )?;
        Ok(())
    }

    pub fn for_task(&self, task_id: &str) -> Result<Vec<VerificationReceipt>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT task_id, delegator, delegatee, spec_payload, verdict, method, timestamp
             FROM receipts WHERE task_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![task_id], row_to_receipt)?;
        collect(rows)
    }

    pub fn recent(&self, limit: u32) -> Result<Vec<VerificationReceipt>, StoreError> {
        let limit = if limit == 0 { 50 } else { limit };
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT task_id, delegator, delegatee, spec_payload, verdict, method, timestamp
             FROM receipts ORDER BY rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], row_to_receipt)?;
        collect(rows)
    }
}

fn row_to_receipt(row: &Row<'_>) -> rusqlite::Result<VerificationReceipt> {
    let verdict: String = row.get(4)?;
    let method: String = row.get(5)?;
    let timestamp: String = row.get(6)?;
    Ok(VerificationReceipt {
        task_id: TaskId::new(row.get::<_, String>(0)?),
        delegator: row.get(1)?,
        delegatee: row.get(2)?,
        spec_payload: row.get(3)?,
        verdict: if verdict == "rejected" {
            Verdict::Rejected
        } else {
            Verdict::Accepted
        },
        method: match method.as_str() {
            "auto-acceptance" => VerificationMethod::AutoAcceptance,
            "council" => VerificationMethod::Council,
            _ => VerificationMethod::HumanReview,
        },
        timestamp: time_fmt::parse_iso(&timestamp).unwrap_or(DateTime::UNIX_EPOCH),
    })
}

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<VerificationReceipt>>,
) -> Result<Vec<VerificationReceipt>, StoreError> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
