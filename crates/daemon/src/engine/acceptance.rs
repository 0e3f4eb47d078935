// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-acceptance runner.
//!
//! When a task reaches `ready_for_review` with workspace context and the
//! feature is on, the handoff's `run_commands` execute sequentially in
//! the workspace directory. All commands passing accepts the task;
//! anything else rejects it with a summary of the failures. The caller
//! gets `{acceptance:"running"}` immediately; everything below runs on a
//! spawned task.

use crate::adapters::subprocess::{run_with_timeout, split_argv, CommandOutput};
use crate::engine::friction::{self, FrictionCheck};
use crate::engine::tasks::finalize_verdict;
use crate::engine::HandlerError;
use crate::lifecycle::HubState;
use agentctl_core::handoff::HandoffPayload;
use agentctl_core::message::Message;
use agentctl_core::receipt::{VerificationMethod, Verdict};
use agentctl_core::task::{Task, TaskStatus};
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;
use tracing::{info, warn};

/// Outcome of the pre-run gate.
pub enum Gate {
    /// Friction check flagged the task; human review required
    Blocked(FrictionCheck),
    /// Commands will run asynchronously
    Running,
    /// Auto-acceptance does not apply to this task
    Skipped,
}

/// Decide whether auto-acceptance applies to a freshly reviewed task.
pub fn evaluate_gate(state: &Arc<HubState>, task: &Task) -> Result<Gate, HandlerError> {
    if !state.feature(|f| f.auto_acceptance) {
        return Ok(Gate::Skipped);
    }
    if task.workspace_context.is_none() {
        return Ok(Gate::Skipped);
    }
    let Some((_, payload)) = locate_handoff(state, task) else {
        return Ok(Gate::Skipped);
    };

    if state.feature(|f| f.cognitive_friction) {
        let check = friction::check(&payload);
        if check.blocked {
            return Ok(Gate::Blocked(check));
        }
    }
    Ok(Gate::Running)
}

/// Spawn the asynchronous acceptance run.
pub fn spawn_run(state: Arc<HubState>, task: Task) {
    tokio::spawn(async move {
        run_acceptance(state, task).await;
    });
}

/// Locate the handoff behind a task.
///
/// Primary lookup is by id (the task id IS the handoff id). The fallback
/// matches on the handoff's `branch` / `projectDir` context against the
/// task's workspace; with two tasks sharing a branch it can pick the
/// wrong one (see DESIGN.md), so the id path always wins when it hits.
fn locate_handoff(state: &HubState, task: &Task) -> Option<(Message, HandoffPayload)> {
    if let Ok(Some(message)) = state.stores.messages.get_message(task.id.as_str()) {
        if let Ok(payload) = serde_json::from_str::<HandoffPayload>(&message.content) {
            return Some((message, payload));
        }
    }

    let workspace = task.workspace_context.as_ref()?;
    let handoffs = state.stores.messages.get_handoffs(&task.assignee).ok()?;
    for message in handoffs {
        let Some(context) = message.context.as_ref() else {
            continue;
        };
        let branch_match = context.get("branch").is_some_and(|b| *b == workspace.branch);
        let dir_match = context
            .get("projectDir")
            .is_some_and(|d| workspace.workspace_path.starts_with(d));
        if branch_match || dir_match {
            if let Ok(payload) = serde_json::from_str::<HandoffPayload>(&message.content) {
                return Some((message, payload));
            }
        }
    }
    None
}

async fn run_acceptance(state: Arc<HubState>, task: Task) {
    let Some((_, payload)) = locate_handoff(&state, &task) else {
        warn!(task_id = %task.id, "no handoff found for acceptance run");
        return;
    };
    if payload.run_commands.is_empty() {
        return;
    }
    let Some(workspace) = task.workspace_context.clone() else {
        return;
    };
    if !workspace.workspace_path.is_dir() {
        warn!(
            task_id = %task.id,
            dir = %workspace.workspace_path.display(),
            "workspace directory missing, refusing to run acceptance commands"
        );
        return;
    }

    let per_command = crate::env::acceptance_command_timeout();
    let overall_deadline = Instant::now() + crate::env::acceptance_overall_timeout();

    let mut results: Vec<(String, CommandOutput)> = Vec::new();
    for command in &payload.run_commands {
        let Some((program, args)) = split_argv(command) else {
            continue;
        };
        let remaining = overall_deadline.saturating_duration_since(Instant::now());
        let timeout = per_command.min(remaining);
        if timeout.is_zero() {
            results.push((
                command.clone(),
                CommandOutput {
                    exit_code: crate::adapters::subprocess::TIMEOUT_EXIT_CODE,
                    stdout: String::new(),
                    stderr: "overall acceptance deadline exceeded".to_string(),
                    duration: std::time::Duration::ZERO,
                    timed_out: true,
                },
            ));
            break;
        }

        let mut cmd = Command::new(&program);
        cmd.args(&args).current_dir(&workspace.workspace_path);
        match run_with_timeout(cmd, timeout, command).await {
            Ok(output) => {
                let passed = output.passed();
                results.push((command.clone(), output));
                if !passed {
                    // Later commands may depend on earlier ones
                    break;
                }
            }
            Err(e) => {
                results.push((
                    command.clone(),
                    CommandOutput {
                        exit_code: 127,
                        stdout: String::new(),
                        stderr: format!("failed to spawn: {e}"),
                        duration: std::time::Duration::ZERO,
                        timed_out: false,
                    },
                ));
                break;
            }
        }
    }

    let passed = !results.is_empty() && results.iter().all(|(_, r)| r.passed());
    let summary = summarize_failures(&results);

    let now = state.now();
    let verdict = if passed {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    };
    let next = if passed {
        TaskStatus::Accepted
    } else {
        TaskStatus::Rejected
    };
    let reason = (!passed).then(|| summary.clone());
    let reason_for_transition = reason.clone();

    let updated = state.stores.board.update(task.id.as_str(), move |t| {
        t.transition(next, reason_for_transition, None, now)
    });
    let updated = match updated {
        Ok(task) => task,
        Err(e) => {
            warn!(task_id = %task.id, error = %e, "acceptance verdict could not be persisted");
            return;
        }
    };

    info!(
        task_id = %task.id,
        passed,
        commands = results.len(),
        "auto-acceptance finished"
    );
    finalize_verdict(
        &state,
        &updated,
        verdict,
        VerificationMethod::AutoAcceptance,
        reason,
    );
}

/// Human-readable summary of failing commands for the rejection reason.
fn summarize_failures(results: &[(String, CommandOutput)]) -> String {
    let failures: Vec<String> = results
        .iter()
        .filter(|(_, r)| !r.passed())
        .map(|(command, r)| {
            let detail = if r.timed_out {
                "timed out".to_string()
            } else {
                format!("exit code {}", r.exit_code)
            };
            let stderr = r.stderr.lines().next().unwrap_or("").trim();
            if stderr.is_empty() {
                format!("`{command}` {detail}")
            } else {
                format!("`{command}` {detail}: {stderr}")
            }
        })
        .collect();
    if failures.is_empty() {
        "all commands passed".to_string()
    } else {
        format!("auto-acceptance failed: {}", failures.join("; "))
    }
}

#[cfg(test)]
#[path = "acceptance_tests.rs"]
mod tests;
