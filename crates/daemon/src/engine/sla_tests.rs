// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use agentctl_core::clock::{Clock, FakeClock};
use agentctl_core::test_support::{handoff_payload, task};

fn in_progress(id: &str, clock: &FakeClock) -> Task {
    let mut t = task(id, "bob", clock.now());
    t.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();
    t
}

fn input(task: Task) -> SlaInput {
    SlaInput {
        task,
        payload: None,
        delegator: Some("alice".to_string()),
        last_progress: None,
    }
}

#[test]
fn fresh_task_produces_nothing() {
    let clock = FakeClock::new();
    let inputs = vec![input(in_progress("t1", &clock))];
    clock.advance(std::time::Duration::from_secs(5 * 60));
    assert!(scan(&inputs, clock.now()).is_empty());
}

#[test]
fn silent_task_pinged_after_30_minutes() {
    let clock = FakeClock::new();
    let inputs = vec![input(in_progress("t1", &clock))];
    clock.advance(std::time::Duration::from_secs(35 * 60));

    let recs = scan(&inputs, clock.now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].action, SlaAction::Ping);
    assert_eq!(recs[0].severity, SlaSeverity::Warning);
    assert_eq!(recs[0].account, "bob");
}

#[test]
fn recent_progress_suppresses_ping() {
    let clock = FakeClock::new();
    let task = in_progress("t1", &clock);
    clock.advance(std::time::Duration::from_secs(30 * 60));
    let progress_at = clock.now();
    clock.advance(std::time::Duration::from_secs(5 * 60));

    let inputs = vec![SlaInput {
        task,
        payload: None,
        delegator: None,
        last_progress: Some(progress_at),
    }];
    assert!(scan(&inputs, clock.now()).is_empty());
}

#[test]
fn hour_old_task_recommends_reassignment() {
    let clock = FakeClock::new();
    let inputs = vec![input(in_progress("t1", &clock))];
    clock.advance(std::time::Duration::from_secs(61 * 60));

    let recs = scan(&inputs, clock.now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].action, SlaAction::Reassign);
    assert_eq!(recs[0].severity, SlaSeverity::Breach);
}

#[test]
fn blocked_task_escalates_after_15_minutes() {
    let clock = FakeClock::new();
    let task = in_progress("t1", &clock);
    let mut payload = handoff_payload("blocked work");
    payload.blocked_by = vec!["t-0".to_string()];
    clock.advance(std::time::Duration::from_secs(20 * 60));

    let inputs = vec![SlaInput {
        task,
        payload: Some(payload),
        delegator: None,
        last_progress: Some(clock.now()),
    }];
    let recs = scan(&inputs, clock.now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].action, SlaAction::Escalate);
    assert!(recs[0].reason.contains("t-0"));
}

#[test]
fn unblocked_payload_does_not_escalate() {
    let clock = FakeClock::new();
    let task = in_progress("t1", &clock);
    clock.advance(std::time::Duration::from_secs(20 * 60));

    let inputs = vec![SlaInput {
        task,
        payload: Some(handoff_payload("free work")),
        delegator: None,
        last_progress: Some(clock.now()),
    }];
    assert!(scan(&inputs, clock.now()).is_empty());
}

#[test]
fn critical_overrun_is_quarantine_candidate() {
    let clock = FakeClock::new();
    let task = in_progress("t1", &clock);
    let mut payload = handoff_payload("prod fix");
    payload.criticality = Some(Level::Critical);
    payload.estimated_duration_minutes = Some(10);
    clock.advance(std::time::Duration::from_secs(20 * 60));

    let inputs = vec![SlaInput {
        task,
        payload: Some(payload),
        delegator: None,
        last_progress: Some(clock.now()),
    }];
    let recs = scan(&inputs, clock.now());
    assert!(recs
        .iter()
        .any(|r| r.action == SlaAction::Quarantine && r.severity == SlaSeverity::Breach));
}

#[test]
fn stale_review_pings_the_delegator() {
    let clock = FakeClock::new();
    let mut task = in_progress("t1", &clock);
    task.transition(TaskStatus::ReadyForReview, None, None, clock.now())
        .unwrap();
    clock.advance(std::time::Duration::from_secs(11 * 60));

    let recs = scan(&[input(task)], clock.now());
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].action, SlaAction::Ping);
    assert_eq!(recs[0].account, "alice");
}

#[test]
fn accepted_tasks_ignored() {
    let clock = FakeClock::new();
    let mut task = in_progress("t1", &clock);
    task.transition(TaskStatus::ReadyForReview, None, None, clock.now())
        .unwrap();
    task.transition(TaskStatus::Accepted, None, None, clock.now())
        .unwrap();
    clock.advance(std::time::Duration::from_secs(120 * 60));
    assert!(scan(&[input(task)], clock.now()).is_empty());
}
