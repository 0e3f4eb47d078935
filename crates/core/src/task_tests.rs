// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};
use yare::parameterized;

fn make_task() -> (Task, FakeClock) {
    let clock = FakeClock::new();
    let task = Task::new(TaskId::new("t-1"), "fix login", "bob", clock.now());
    (task, clock)
}

#[parameterized(
    todo_to_in_progress = { TaskStatus::Todo, TaskStatus::InProgress, true },
    in_progress_to_review = { TaskStatus::InProgress, TaskStatus::ReadyForReview, true },
    review_to_accepted = { TaskStatus::ReadyForReview, TaskStatus::Accepted, true },
    review_to_rejected = { TaskStatus::ReadyForReview, TaskStatus::Rejected, true },
    rejected_to_in_progress = { TaskStatus::Rejected, TaskStatus::InProgress, true },
    todo_to_accepted = { TaskStatus::Todo, TaskStatus::Accepted, false },
    todo_to_review = { TaskStatus::Todo, TaskStatus::ReadyForReview, false },
    accepted_to_anything = { TaskStatus::Accepted, TaskStatus::InProgress, false },
    review_to_todo = { TaskStatus::ReadyForReview, TaskStatus::Todo, false },
    in_progress_to_accepted = { TaskStatus::InProgress, TaskStatus::Accepted, false },
)]
fn transition_rules(from: TaskStatus, to: TaskStatus, allowed: bool) {
    assert_eq!(from.can_transition_to(to), allowed);
}

#[test]
fn transition_appends_status_changed_event() {
    let (mut task, clock) = make_task();
    clock.advance(std::time::Duration::from_secs(5));
    task.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();

    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.events.len(), 1);
    let event = &task.events[0];
    assert_eq!(event.kind, TaskEventKind::StatusChanged);
    assert_eq!(event.from, Some(TaskStatus::Todo));
    assert_eq!(event.to, Some(TaskStatus::InProgress));
}

#[test]
fn accepted_event_follows_review_event() {
    let (mut task, clock) = make_task();
    task.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();
    clock.advance(std::time::Duration::from_secs(1));
    task.transition(TaskStatus::ReadyForReview, None, None, clock.now())
        .unwrap();
    clock.advance(std::time::Duration::from_secs(1));
    task.transition(TaskStatus::Accepted, None, None, clock.now())
        .unwrap();

    let review_idx = task
        .events
        .iter()
        .position(|e| e.to == Some(TaskStatus::ReadyForReview))
        .unwrap();
    let accepted_idx = task
        .events
        .iter()
        .position(|e| e.to == Some(TaskStatus::Accepted))
        .unwrap();
    assert!(accepted_idx > review_idx);
    assert!(task.events[accepted_idx].timestamp > task.events[review_idx].timestamp);
}

#[test]
fn rejection_without_reason_fails() {
    let (mut task, clock) = make_task();
    task.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();
    task.transition(TaskStatus::ReadyForReview, None, None, clock.now())
        .unwrap();

    let err = task
        .transition(TaskStatus::Rejected, None, None, clock.now())
        .unwrap_err();
    assert_eq!(err, TaskError::MissingReason);

    let err = task
        .transition(TaskStatus::Rejected, Some("  ".to_string()), None, clock.now())
        .unwrap_err();
    assert_eq!(err, TaskError::MissingReason);

    task.transition(
        TaskStatus::Rejected,
        Some("tests fail".to_string()),
        None,
        clock.now(),
    )
    .unwrap();
    assert_eq!(task.status, TaskStatus::Rejected);
}

#[test]
fn workspace_context_set_once() {
    let (mut task, clock) = make_task();
    task.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();

    let first = WorkspaceContext {
        workspace_path: "/tmp/ws1".into(),
        branch: "feature-a".to_string(),
        workspace_id: None,
    };
    task.transition(TaskStatus::ReadyForReview, None, Some(first.clone()), clock.now())
        .unwrap();
    task.transition(
        TaskStatus::Rejected,
        Some("redo".to_string()),
        None,
        clock.now(),
    )
    .unwrap();
    task.transition(TaskStatus::InProgress, None, None, clock.now())
        .unwrap();

    // Second trip to review must not overwrite the recorded workspace
    let second = WorkspaceContext {
        workspace_path: "/tmp/ws2".into(),
        branch: "feature-b".to_string(),
        workspace_id: None,
    };
    task.transition(TaskStatus::ReadyForReview, None, Some(second), clock.now())
        .unwrap();
    assert_eq!(task.workspace_context, Some(first));
}

#[test]
fn progress_tracked_on_event_log() {
    let (mut task, clock) = make_task();
    assert_eq!(task.last_progress_at(), None);

    clock.advance(std::time::Duration::from_secs(10));
    task.record_progress(Some(40), Some("halfway".to_string()), clock.now());
    assert_eq!(task.last_progress_at(), Some(clock.now()));
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&TaskStatus::ReadyForReview).unwrap();
    assert_eq!(json, "\"ready_for_review\"");
    assert_eq!(TaskStatus::parse("in_progress"), Some(TaskStatus::InProgress));
    assert_eq!(TaskStatus::parse("done"), None);
}
