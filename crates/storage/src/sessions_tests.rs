// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentctl_core::clock::{Clock, FakeClock};
use agentctl_core::session::SessionId;
use std::collections::HashMap;
use tempfile::tempdir;

fn session(id: &str, initiator: &str, participant: &str, at: DateTime<Utc>) -> SharedSession {
    SharedSession {
        id: SessionId::new(id),
        initiator: initiator.to_string(),
        participant: participant.to_string(),
        workspace: None,
        started_at: at,
        active: true,
        joined: false,
        last_ping: HashMap::new(),
    }
}

#[test]
fn name_then_search() {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(&dir.path().join("sessions.db")).unwrap();
    let clock = FakeClock::new();

    store
        .record_started(&session("s1", "alice", "bob", clock.now()))
        .unwrap();
    assert!(store.set_name("s1", "pairing-on-auth").unwrap());
    assert!(!store.set_name("missing", "x").unwrap());

    let hits = store.search("pairing", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name.as_deref(), Some("pairing-on-auth"));

    // Member names are searchable too
    assert_eq!(store.search("alice", 10).unwrap().len(), 1);
    assert!(store.search("zebra", 10).unwrap().is_empty());
}

#[test]
fn ended_sessions_keep_their_row() {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(&dir.path().join("sessions.db")).unwrap();
    let clock = FakeClock::new();

    store
        .record_started(&session("s1", "alice", "bob", clock.now()))
        .unwrap();
    clock.advance(std::time::Duration::from_secs(30));
    store.record_ended("s1", clock.now()).unwrap();

    let row = store.get("s1").unwrap().unwrap();
    assert_eq!(row.ended_at, Some(clock.now()));
    assert_eq!(store.list(10).unwrap().len(), 1);
}
