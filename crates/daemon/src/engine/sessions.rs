// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared-session manager: live pair sessions between two connected
//! accounts.
//!
//! Pure in-memory; rebuilt from zero after a daemon restart. Every
//! mutation verifies the caller's membership. Cleanup is two-step:
//! `cleanup_stale` (ping silence) marks sessions inactive, and
//! `purge_inactive` (age) frees the maps, including per-reader cursors.

use agentctl_core::session::{SessionId, SessionUpdate, SharedSession};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;

/// A session is considered stale when every member's last ping is older
/// than this.
pub const STALE_PING_MS: u64 = 90_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Cannot create session with yourself")]
    SelfPairing,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, SharedSession>,
    updates: HashMap<String, Vec<SessionUpdate>>,
    /// (session id, reader) -> number of updates consumed
    cursors: HashMap<(String, String), usize>,
}

/// In-memory coordinator for live pair sessions.
#[derive(Default)]
pub struct SharedSessionManager {
    inner: Mutex<Inner>,
}

impl SharedSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session; self-pairing is rejected.
    pub fn create_session(
        &self,
        id: SessionId,
        initiator: &str,
        participant: &str,
        workspace: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SharedSession, SessionError> {
        if initiator == participant {
            return Err(SessionError::SelfPairing);
        }
        let session = SharedSession {
            id: id.clone(),
            initiator: initiator.to_string(),
            participant: participant.to_string(),
            workspace,
            started_at: now,
            active: true,
            joined: false,
            last_ping: HashMap::from([(
                initiator.to_string(),
                now.timestamp_millis().max(0) as u64,
            )]),
        };
        let mut inner = self.inner.lock();
        inner.sessions.insert(id.to_string(), session.clone());
        inner.updates.insert(id.to_string(), Vec::new());
        Ok(session)
    }

    /// Join succeeds only for the designated participant of an active
    /// session. Idempotent in effect.
    pub fn join_session(&self, id: &str, account: &str, now: DateTime<Utc>) -> Option<SharedSession> {
        let mut inner = self.inner.lock();
        let session = inner.sessions.get_mut(id)?;
        if !session.active || session.participant != account {
            return None;
        }
        session.joined = true;
        session
            .last_ping
            .insert(account.to_string(), now.timestamp_millis().max(0) as u64);
        Some(session.clone())
    }

    /// Store an update; returns whether it was accepted (member of an
    /// active session).
    pub fn add_update(
        &self,
        id: &str,
        from: &str,
        data: serde_json::Value,
        now: DateTime<Utc>,
    ) -> bool {
        let mut inner = self.inner.lock();
        let Some(session) = inner.sessions.get(id) else {
            return false;
        };
        if !session.active || !session.is_member(from) {
            return false;
        }
        inner.updates.entry(id.to_string()).or_default().push(SessionUpdate {
            from: from.to_string(),
            data,
            timestamp: now,
        });
        true
    }

    /// Updates after the reader's cursor; advances the cursor. Non-members
    /// always get an empty list.
    pub fn get_updates(&self, id: &str, reader: &str) -> Vec<SessionUpdate> {
        let mut inner = self.inner.lock();
        let Some(session) = inner.sessions.get(id) else {
            return Vec::new();
        };
        if !session.is_member(reader) {
            return Vec::new();
        }
        let total = inner.updates.get(id).map(Vec::len).unwrap_or(0);
        let key = (id.to_string(), reader.to_string());
        let cursor = inner.cursors.get(&key).copied().unwrap_or(0);
        let fresh = inner
            .updates
            .get(id)
            .map(|u| u[cursor.min(total)..].to_vec())
            .unwrap_or_default();
        inner.cursors.insert(key, total);
        fresh
    }

    /// Full update history regardless of cursors (members only).
    pub fn history(&self, id: &str, reader: &str) -> Option<Vec<SessionUpdate>> {
        let inner = self.inner.lock();
        let session = inner.sessions.get(id)?;
        if !session.is_member(reader) {
            return None;
        }
        Some(inner.updates.get(id).cloned().unwrap_or_default())
    }

    /// Record a keepalive ping; returns false for non-members or unknown
    /// sessions, leaving state unchanged.
    pub fn record_ping(&self, id: &str, account: &str, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.lock();
        let Some(session) = inner.sessions.get_mut(id) else {
            return false;
        };
        if !session.active || !session.is_member(account) {
            return false;
        }
        session
            .last_ping
            .insert(account.to_string(), now.timestamp_millis().max(0) as u64);
        true
    }

    /// End a session; members only; idempotent.
    pub fn end_session(&self, id: &str, account: &str) -> bool {
        let mut inner = self.inner.lock();
        let Some(session) = inner.sessions.get_mut(id) else {
            return false;
        };
        if !session.is_member(account) {
            return false;
        }
        session.active = false;
        true
    }

    pub fn get(&self, id: &str) -> Option<SharedSession> {
        self.inner.lock().sessions.get(id).cloned()
    }

    pub fn active_sessions(&self) -> Vec<SharedSession> {
        self.inner
            .lock()
            .sessions
            .values()
            .filter(|s| s.active)
            .cloned()
            .collect()
    }

    /// Mark sessions inactive when every member's last ping is older than
    /// [`STALE_PING_MS`]. Returns the ids that went stale.
    pub fn cleanup_stale(&self, now: DateTime<Utc>) -> Vec<String> {
        let now_ms = now.timestamp_millis().max(0) as u64;
        let mut stale = Vec::new();
        let mut inner = self.inner.lock();
        for (id, session) in inner.sessions.iter_mut() {
            if !session.active {
                continue;
            }
            let all_silent = !session.last_ping.is_empty()
                && session
                    .last_ping
                    .values()
                    .all(|&ping| now_ms.saturating_sub(ping) > STALE_PING_MS);
            if all_silent {
                session.active = false;
                stale.push(id.clone());
            }
        }
        stale
    }

    /// Drop inactive sessions older than the threshold, freeing update
    /// buffers and matching cursor entries. Active sessions are never
    /// removed.
    pub fn purge_inactive(&self, older_than_ms: u64, now: DateTime<Utc>) -> usize {
        let now_ms = now.timestamp_millis().max(0) as u64;
        let mut inner = self.inner.lock();
        let doomed: Vec<String> = inner
            .sessions
            .iter()
            .filter(|(_, s)| {
                !s.active
                    && now_ms.saturating_sub(s.started_at.timestamp_millis().max(0) as u64)
                        > older_than_ms
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &doomed {
            inner.sessions.remove(id);
            inner.updates.remove(id);
            inner.cursors.retain(|(session, _), _| session != id);
        }
        doomed.len()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
