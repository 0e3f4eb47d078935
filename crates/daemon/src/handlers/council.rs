// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Council handlers: multi-reviewer analysis and verification.
//!
//! Consultations are cached by prompt digest; history is read straight
//! from the cache. Council verification writes a receipt but leaves the
//! status transition to a human (or auto-acceptance).

use crate::adapters::council::{majority_verdict, prompt_digest, CouncilRecord};
use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::receipt::{VerificationMethod, VerificationReceipt, Verdict};
use agentctl_core::task::TaskId;
use agentctl_core::time_fmt;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

fn council_enabled(state: &HubState) -> Result<(), HandlerError> {
    if state.feature(|f| f.council) {
        Ok(())
    } else {
        Err(HandlerError::feature_disabled("Council"))
    }
}

pub async fn council_analyze(
    state: &Arc<HubState>,
    content: &str,
    task_id: Option<String>,
) -> HandlerResult {
    council_enabled(state)?;
    let digest = prompt_digest(content);

    if let Some(cached) = state.council_cache.read().get(&digest).cloned() {
        return Ok(json!({"verdict": cached.verdict, "opinions": cached.opinions, "cached": true}));
    }

    let opinions = state.council.consult(content).await;
    if opinions.is_empty() {
        return Err(HandlerError::msg("Council not configured"));
    }
    let verdict = majority_verdict(&opinions).to_string();

    let record = CouncilRecord {
        digest: digest.clone(),
        task_id,
        verdict: verdict.clone(),
        opinions: opinions.clone(),
        timestamp: time_fmt::iso_millis(&state.now()),
    };
    // Cache persistence is best-effort; a failed write only costs a re-run
    if let Err(e) = state.council_cache.update(|cache| {
        cache.insert(digest, record);
    }) {
        warn!(error = %e, "council cache write failed");
    }

    Ok(json!({"verdict": verdict, "opinions": opinions, "cached": false}))
}

pub async fn council_verify(state: &Arc<HubState>, task_id: &str) -> HandlerResult {
    council_enabled(state)?;
    let Some(task) = state.stores.board.get(task_id) else {
        return Err(HandlerError::not_found(format!("task {task_id}")));
    };
    let Some(handoff) = state.stores.messages.get_message(task_id)? else {
        return Err(HandlerError::not_found(format!("handoff {task_id}")));
    };

    let prompt = format!(
        "Verify this completed task against its acceptance criteria.\n\
         Task: {}\nStatus: {}\nHandoff:\n{}",
        task.title, task.status, handoff.content
    );

    let opinions = state.council.consult(&prompt).await;
    if opinions.is_empty() {
        return Err(HandlerError::msg("Council not configured"));
    }
    let verdict_str = majority_verdict(&opinions);
    let verdict = if verdict_str == "accepted" {
        Verdict::Accepted
    } else {
        Verdict::Rejected
    };

    let receipt = VerificationReceipt {
        task_id: TaskId::new(task_id),
        delegator: handoff.from.clone(),
        delegatee: task.assignee.clone(),
        spec_payload: handoff.content.clone(),
        verdict,
        method: VerificationMethod::Council,
        timestamp: state.now(),
    };
    state.stores.receipts.insert(&receipt)?;

    state.bus.emit(&agentctl_core::event::HubEvent::TaskVerified {
        task_id: TaskId::new(task_id),
        account: task.assignee.clone(),
        passed: verdict == Verdict::Accepted,
        method: VerificationMethod::Council,
    });

    Ok(json!({"taskId": task_id, "verdict": verdict_str, "opinions": opinions}))
}

pub fn council_history(state: &Arc<HubState>, limit: Option<u32>) -> HandlerResult {
    council_enabled(state)?;
    let limit = limit.unwrap_or(20) as usize;
    let mut records: Vec<CouncilRecord> = state.council_cache.read().into_values().collect();
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    Ok(json!({"consultations": records}))
}

#[cfg(test)]
#[path = "council_tests.rs"]
mod tests;
