// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared with other crates' tests (behind `test-support`).

use crate::handoff::HandoffPayload;
use crate::task::{Task, TaskId};
use chrono::{DateTime, Utc};

/// Minimal valid handoff payload.
pub fn handoff_payload(goal: &str) -> HandoffPayload {
    HandoffPayload {
        goal: goal.to_string(),
        acceptance_criteria: vec!["it works".to_string()],
        run_commands: vec!["true".to_string()],
        blocked_by: vec!["none".to_string()],
        complexity: None,
        criticality: None,
        uncertainty: None,
        verifiability: None,
        reversibility: None,
        required_skills: Vec::new(),
        estimated_duration_minutes: None,
        delegation_depth: None,
        parent_handoff_id: None,
        auto_context: None,
        extra: serde_json::Map::new(),
    }
}

/// A fresh todo task owned by `assignee`.
pub fn task(id: &str, assignee: &str, now: DateTime<Utc>) -> Task {
    Task::new(TaskId::new(id), format!("task {id}"), assignee, now)
}
