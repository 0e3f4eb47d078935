// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentctl_core::clock::{Clock, FakeClock};
use tempfile::tempdir;

fn store() -> (CapabilityStore, tempfile::TempDir, FakeClock) {
    let dir = tempdir().unwrap();
    let store = CapabilityStore::open(&dir.path().join("capabilities.db")).unwrap();
    (store, dir, FakeClock::new())
}

#[test]
fn missing_account_is_none() {
    let (store, _dir, _clock) = store();
    assert!(store.get("ghost").unwrap().is_none());
}

#[test]
fn skills_round_trip() {
    let (store, _dir, _clock) = store();
    let skills: BTreeSet<String> = ["rust", "sql"].iter().map(|s| s.to_string()).collect();
    store.set_skills("alice", &skills).unwrap();
    assert_eq!(store.get("alice").unwrap().unwrap().skills, skills);
}

#[test]
fn outcome_updates_counters_and_average() {
    let (store, _dir, clock) = store();
    store.record_outcome("bob", true, Some(10.0), clock.now()).unwrap();
    store.record_outcome("bob", true, Some(20.0), clock.now()).unwrap();
    store.record_outcome("bob", false, None, clock.now()).unwrap();

    let record = store.get("bob").unwrap().unwrap();
    assert_eq!(record.accepted, 2);
    assert_eq!(record.total, 3);
    assert_eq!(record.avg_duration_minutes, 15.0);
    assert_eq!(record.last_activity, Some(clock.now()));
}

#[test]
fn all_sorted_by_account() {
    let (store, _dir, clock) = store();
    store.touch("zoe", clock.now()).unwrap();
    store.touch("amy", clock.now()).unwrap();
    let accounts: Vec<String> = store.all().unwrap().into_iter().map(|(a, _)| a).collect();
    assert_eq!(accounts, ["amy", "zoe"]);
}
