// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentctl_core::task::TaskId;
use std::sync::atomic::{AtomicUsize, Ordering};

fn started(task: &str) -> HubEvent {
    HubEvent::TaskStarted {
        task_id: TaskId::new(task),
        account: "bob".to_string(),
    }
}

#[test]
fn subscribers_receive_matching_kind_only() {
    let bus = EventBus::new();
    let started_count = Arc::new(AtomicUsize::new(0));
    let completed_count = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&started_count);
    bus.subscribe(EventKind::TaskStarted, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let counter = Arc::clone(&completed_count);
    bus.subscribe(EventKind::TaskCompleted, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(&started("t1"));
    bus.emit(&started("t2"));

    assert_eq!(started_count.load(Ordering::SeqCst), 2);
    assert_eq!(completed_count.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_subscriber_does_not_block_later_ones() {
    let bus = EventBus::new();
    let reached = Arc::new(AtomicUsize::new(0));

    bus.subscribe_all(|_| Err("boom".to_string()));
    let counter = Arc::clone(&reached);
    bus.subscribe_all(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(&started("t1"));
    assert_eq!(reached.load(Ordering::SeqCst), 1);
}

#[test]
fn subscribers_run_in_registration_order() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let order = Arc::clone(&order);
        bus.subscribe_all(move |_| {
            order.lock().push(label);
            Ok(())
        });
    }

    bus.emit(&started("t1"));
    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[test]
fn subscribe_all_sees_every_kind() {
    let bus = EventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    bus.subscribe_all(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.emit(&started("t1"));
    bus.emit(&HubEvent::TrustUpdate {
        account: "bob".to_string(),
        old_score: 50,
        new_score: 55,
    });
    assert_eq!(count.load(Ordering::SeqCst), 2);
}
