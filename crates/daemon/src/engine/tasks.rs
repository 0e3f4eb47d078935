// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle engine: status transitions, verdict finalisation,
//! trust updates and verification receipts.

use crate::engine::{acceptance, HandlerError, HandlerResult};
use crate::lifecycle::{HubState, ProgressEntry};
use agentctl_core::event::{HubEvent, TaskResult};
use agentctl_core::handoff::HandoffPayload;
use agentctl_core::receipt::{VerificationMethod, VerificationReceipt, Verdict};
use agentctl_core::task::{Task, TaskId, TaskStatus, WorkspaceContext};
use agentctl_core::trust::TrustOutcome;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Fallback SLA window (minutes) when a handoff has no estimate.
const DEFAULT_SLA_WINDOW_MINUTES: i64 = 60;

/// `update_task_status` semantics.
#[allow(clippy::too_many_arguments)]
pub async fn update_task_status(
    state: &Arc<HubState>,
    caller: &str,
    task_id: &str,
    new_status: &str,
    reason: Option<String>,
    workspace_path: Option<PathBuf>,
    branch: Option<String>,
    workspace_id: Option<String>,
) -> HandlerResult {
    let Some(next) = TaskStatus::parse(new_status) else {
        return Err(HandlerError::msg(format!("Invalid status: {new_status}")));
    };

    let workspace_context = match (workspace_path, branch) {
        (Some(path), Some(branch)) => Some(WorkspaceContext {
            workspace_path: path,
            branch,
            workspace_id,
        }),
        _ => None,
    };

    let now = state.now();
    let reason_for_event = reason.clone();
    let task = state.stores.board.update(task_id, move |task| {
        task.transition(next, reason_for_event, workspace_context, now)
    })?;

    // Persisted; now the side effects, strictly after the commit
    match next {
        TaskStatus::InProgress => {
            state.bus.emit(&HubEvent::TaskStarted {
                task_id: task.id.clone(),
                account: caller.to_string(),
            });
        }
        TaskStatus::ReadyForReview => {
            state.bus.emit(&HubEvent::CheckpointReached {
                task_id: task.id.clone(),
                account: caller.to_string(),
                percent: 100,
            });

            match acceptance::evaluate_gate(state, &task)? {
                acceptance::Gate::Blocked(check) => {
                    let reason = check.reasons.join("; ");
                    return Ok(json!({
                        "task": task,
                        "acceptance": "blocked",
                        "reason": reason,
                        "frictionLevel": check.friction_level,
                    }));
                }
                acceptance::Gate::Running => {
                    acceptance::spawn_run(Arc::clone(state), task.clone());
                    return Ok(json!({"task": task, "acceptance": "running"}));
                }
                acceptance::Gate::Skipped => {}
            }
        }
        TaskStatus::Accepted => {
            finalize_verdict(state, &task, Verdict::Accepted, VerificationMethod::HumanReview, None);
        }
        TaskStatus::Rejected => {
            finalize_verdict(state, &task, Verdict::Rejected, VerificationMethod::HumanReview, reason);
        }
        TaskStatus::Todo => {}
    }

    Ok(json!({"task": task}))
}

/// `report_progress`: record on the event log, the in-memory tracker,
/// and the bus.
pub fn report_progress(
    state: &Arc<HubState>,
    caller: &str,
    task_id: &str,
    percent: Option<u8>,
    note: Option<String>,
) -> HandlerResult {
    let now = state.now();
    let note_for_log = note.clone();
    let task = state.stores.board.update(task_id, move |task| {
        task.record_progress(percent, note_for_log, now);
        Ok(())
    })?;

    state.progress.lock().insert(
        task_id.to_string(),
        ProgressEntry {
            percent,
            note: note.clone(),
            at: now,
        },
    );

    state.bus.emit(&HubEvent::ProgressUpdate {
        task_id: task.id.clone(),
        account: caller.to_string(),
        percent,
        note,
    });

    Ok(json!({"task": task}))
}

/// Shared verdict finalisation for human review, auto-acceptance and
/// council outcomes.
///
/// Order matters: the status is already persisted; this emits
/// `TASK_COMPLETED`, applies trust, writes the receipt, then emits
/// `TASK_VERIFIED` and `TRUST_UPDATE`. GitHub and notification hooks ride
/// the bus and are best-effort.
pub(crate) fn finalize_verdict(
    state: &Arc<HubState>,
    task: &Task,
    verdict: Verdict,
    method: VerificationMethod,
    summary: Option<String>,
) {
    let now = state.now();
    let handoff = match state.stores.messages.get_message(task.id.as_str()) {
        Ok(message) => message,
        Err(e) => {
            warn!(task_id = %task.id, error = %e, "handoff lookup failed during verdict");
            None
        }
    };

    let result = match verdict {
        Verdict::Accepted => TaskResult::Success,
        Verdict::Rejected => TaskResult::Failure,
    };
    state.bus.emit(&HubEvent::TaskCompleted {
        task_id: task.id.clone(),
        account: task.assignee.clone(),
        result,
    });

    // Trust: deterministic outcome deltas, clamped in core
    let duration_minutes = (now - task.created_at).num_minutes().max(0);
    let outcome = match (verdict, method) {
        (Verdict::Accepted, _) => {
            let window = handoff
                .as_ref()
                .and_then(|m| serde_json::from_str::<HandoffPayload>(&m.content).ok())
                .and_then(|p| p.estimated_duration_minutes)
                .map(|m| m as i64)
                .unwrap_or(DEFAULT_SLA_WINDOW_MINUTES);
            TrustOutcome::Completed {
                within_sla: duration_minutes <= window,
            }
        }
        (Verdict::Rejected, VerificationMethod::AutoAcceptance) => TrustOutcome::AutoAcceptanceFailed,
        (Verdict::Rejected, _) => TrustOutcome::Rejected,
    };

    if state.feature(|f| f.trust) {
        match state.stores.trust.apply(&task.assignee, outcome) {
            Ok((old_score, new_score)) => {
                if old_score != new_score {
                    state.bus.emit(&HubEvent::TrustUpdate {
                        account: task.assignee.clone(),
                        old_score,
                        new_score,
                    });
                }
            }
            Err(e) => warn!(error = %e, "trust update failed"),
        }
    }

    // Capability counters feed future routing decisions
    if let Err(e) = state.stores.capabilities.record_outcome(
        &task.assignee,
        verdict == Verdict::Accepted,
        Some(duration_minutes as f64),
        now,
    ) {
        warn!(error = %e, "capability update failed");
    }

    let receipt = VerificationReceipt {
        task_id: task.id.clone(),
        delegator: handoff
            .as_ref()
            .map(|m| m.from.clone())
            .unwrap_or_else(|| "unknown".to_string()),
        delegatee: task.assignee.clone(),
        spec_payload: handoff.map(|m| m.content).unwrap_or_default(),
        verdict,
        method,
        timestamp: now,
    };
    if let Err(e) = state.stores.receipts.insert(&receipt) {
        warn!(error = %e, "receipt write failed");
    }

    state.bus.emit(&HubEvent::TaskVerified {
        task_id: task.id.clone(),
        account: task.assignee.clone(),
        passed: verdict == Verdict::Accepted,
        method,
    });

    if verdict == Verdict::Rejected {
        if let Some(summary) = summary {
            tracing::info!(task_id = %task.id, summary, "task rejected");
        }
    }

    // Finished work drops out of the progress tracker
    state.progress.lock().remove(task.id.as_str());
}

/// Load the handoff payload behind a task, if parseable.
pub fn payload_for_task(state: &HubState, task_id: &TaskId) -> Option<HandoffPayload> {
    let message = state
        .stores
        .messages
        .get_message(task_id.as_str())
        .ok()
        .flatten()?;
    serde_json::from_str(&message.content).ok()
}

/// Delegator (handoff sender) behind a task.
pub fn delegator_for_task(state: &HubState, task_id: &TaskId) -> Option<String> {
    state
        .stores
        .messages
        .get_message(task_id.as_str())
        .ok()
        .flatten()
        .map(|m| m.from)
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
