// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentctl_core::trust::DEFAULT_TRUST_SCORE;
use tempfile::tempdir;

fn store() -> (TrustStore, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let store = TrustStore::open(&dir.path().join("trust.db")).unwrap();
    (store, dir)
}

#[test]
fn unseen_account_gets_default_record() {
    let (store, _dir) = store();
    let record = store.get("fresh").unwrap();
    assert_eq!(record.score, DEFAULT_TRUST_SCORE);
    assert_eq!(record.completed, 0);
}

#[test]
fn apply_persists_across_reads() {
    let (store, _dir) = store();
    let (old, new) = store
        .apply("bob", TrustOutcome::Completed { within_sla: true })
        .unwrap();
    assert_eq!(old, DEFAULT_TRUST_SCORE);
    assert!(new > old);

    let record = store.get("bob").unwrap();
    assert_eq!(record.score, new);
    assert_eq!(record.completed, 1);
    assert_eq!(record.sla_hits, 1);
}

#[test]
fn reinstate_clears_breaker_state() {
    let (store, _dir) = store();
    for _ in 0..5 {
        store.apply("bob", TrustOutcome::AutoAcceptanceFailed).unwrap();
    }
    assert!(store.get("bob").unwrap().breaker_open());

    let record = store.reinstate("bob").unwrap();
    assert!(!record.breaker_open());
    assert!(!store.get("bob").unwrap().breaker_open());
}
