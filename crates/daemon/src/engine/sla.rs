// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SLA / adaptive coordinator: periodic staleness scan producing
//! graduated escalation recommendations.
//!
//! The scan is pure: it reads tasks, handoff payloads and progress
//! timestamps, and returns recommendations. It never mutates tasks;
//! callers surface the recommendations (pull mode) and emit
//! `SLA_WARNING` / `SLA_BREACH` events.

use agentctl_core::handoff::{HandoffPayload, Level};
use agentctl_core::task::{Task, TaskStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Recommended action for a stale task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaAction {
    Ping,
    Reassign,
    Escalate,
    Quarantine,
}

/// Warning-level recommendations become `SLA_WARNING` events; breaches
/// become `SLA_BREACH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaSeverity {
    Warning,
    Breach,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaRecommendation {
    pub task_id: String,
    pub account: String,
    pub action: SlaAction,
    pub severity: SlaSeverity,
    pub reason: String,
}

/// One task with its context, assembled by the caller.
pub struct SlaInput {
    pub task: Task,
    pub payload: Option<HandoffPayload>,
    /// Who handed the work off (pinged for stale reviews)
    pub delegator: Option<String>,
    pub last_progress: Option<DateTime<Utc>>,
}

const IN_PROGRESS_PING_AFTER_MIN: i64 = 30;
const PROGRESS_SILENCE_MIN: i64 = 15;
const REASSIGN_AFTER_MIN: i64 = 60;
const BLOCKED_ESCALATE_AFTER_MIN: i64 = 15;
const REVIEW_PING_AFTER_MIN: i64 = 10;

/// Scan tasks and produce recommendations.
pub fn scan(inputs: &[SlaInput], now: DateTime<Utc>) -> Vec<SlaRecommendation> {
    let mut out = Vec::new();
    for input in inputs {
        match input.task.status {
            TaskStatus::InProgress => scan_in_progress(input, now, &mut out),
            TaskStatus::ReadyForReview => scan_ready_for_review(input, now, &mut out),
            _ => {}
        }
    }
    out
}

fn scan_in_progress(input: &SlaInput, now: DateTime<Utc>, out: &mut Vec<SlaRecommendation>) {
    let task = &input.task;
    let age = now - task.status_changed_at();
    let task_id = task.id.to_string();

    if age.num_minutes() > REASSIGN_AFTER_MIN {
        out.push(SlaRecommendation {
            task_id: task_id.clone(),
            account: task.assignee.clone(),
            action: SlaAction::Reassign,
            severity: SlaSeverity::Breach,
            reason: format!("in progress for {} minutes with no outcome", age.num_minutes()),
        });
    } else if age.num_minutes() > IN_PROGRESS_PING_AFTER_MIN {
        let last_signal = input.last_progress.unwrap_or_else(|| task.status_changed_at());
        if (now - last_signal).num_minutes() > PROGRESS_SILENCE_MIN {
            out.push(SlaRecommendation {
                task_id: task_id.clone(),
                account: task.assignee.clone(),
                action: SlaAction::Ping,
                severity: SlaSeverity::Warning,
                reason: format!(
                    "no progress reported for {} minutes",
                    (now - last_signal).num_minutes()
                ),
            });
        }
    }

    if let Some(payload) = &input.payload {
        if age.num_minutes() > BLOCKED_ESCALATE_AFTER_MIN && payload.is_blocked() {
            out.push(SlaRecommendation {
                task_id: task_id.clone(),
                account: task.assignee.clone(),
                action: SlaAction::Escalate,
                severity: SlaSeverity::Warning,
                reason: format!("blocked by {} and stalled", payload.blocked_by.join(", ")),
            });
        }

        // Critical work running past its estimate is a quarantine candidate
        if payload.criticality == Some(Level::Critical) {
            if let Some(estimate) = payload.estimated_duration_minutes {
                if age > Duration::minutes(estimate as i64) {
                    out.push(SlaRecommendation {
                        task_id,
                        account: task.assignee.clone(),
                        action: SlaAction::Quarantine,
                        severity: SlaSeverity::Breach,
                        reason: format!(
                            "critical task {} minutes past its {}-minute estimate",
                            (age - Duration::minutes(estimate as i64)).num_minutes(),
                            estimate
                        ),
                    });
                }
            }
        }
    }
}

fn scan_ready_for_review(input: &SlaInput, now: DateTime<Utc>, out: &mut Vec<SlaRecommendation>) {
    let task = &input.task;
    let age = now - task.status_changed_at();
    if age.num_minutes() > REVIEW_PING_AFTER_MIN {
        let reviewer = input
            .delegator
            .clone()
            .unwrap_or_else(|| task.assignee.clone());
        out.push(SlaRecommendation {
            task_id: task.id.to_string(),
            account: reviewer,
            action: SlaAction::Ping,
            severity: SlaSeverity::Warning,
            reason: format!("awaiting review for {} minutes", age.num_minutes()),
        });
    }
}

#[cfg(test)]
#[path = "sla_tests.rs"]
mod tests;
