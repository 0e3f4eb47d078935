// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared live pair sessions.
//!
//! A shared session pairs exactly two connected accounts (initiator and
//! participant) exchanging opaque update payloads. Sessions are purely
//! in-memory and are rebuilt from zero after a daemon restart.

use crate::time_fmt::serde_iso_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a shared session.
    pub struct SessionId;
}

/// A live pair session between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSession {
    pub id: SessionId,
    pub initiator: String,
    pub participant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(with = "serde_iso_millis")]
    pub started_at: DateTime<Utc>,
    pub active: bool,
    /// Whether the participant has joined
    pub joined: bool,
    /// Last ping per member, epoch milliseconds
    #[serde(default)]
    pub last_ping: HashMap<String, u64>,
}

impl SharedSession {
    /// Membership = {initiator, participant}.
    pub fn is_member(&self, account: &str) -> bool {
        self.initiator == account || self.participant == account
    }
}

/// One opaque update broadcast into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUpdate {
    pub from: String,
    pub data: serde_json::Value,
    #[serde(with = "serde_iso_millis")]
    pub timestamp: DateTime<Utc>,
}
