// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-group handlers: SLA checks, trust queries, circuit breaker.
//!
//! `update_task_status` and `report_progress` live in the engine; the
//! handlers here are the read/coordination surface around them.

use crate::engine::sla::{self, SlaInput, SlaSeverity};
use crate::engine::{handoffs, routing, HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::event::HubEvent;
use agentctl_core::task::TaskStatus;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

/// `adaptive_sla_check`: pull-mode scan over live tasks.
///
/// Recommendations are returned to the caller and mirrored as
/// `SLA_WARNING` / `SLA_BREACH` events; tasks are never mutated here.
pub fn adaptive_sla_check(state: &Arc<HubState>) -> HandlerResult {
    if !state.feature(|f| f.sla_engine) {
        return Err(HandlerError::feature_disabled("SLA engine"));
    }

    let recommendations = run_scan(state);
    let count = recommendations.len();
    Ok(json!({"recommendations": recommendations, "count": count}))
}

/// Assemble inputs and scan; shared by the handler and the periodic task.
pub fn run_scan(state: &Arc<HubState>) -> Vec<sla::SlaRecommendation> {
    let progress = state.progress.lock().clone();
    let mut inputs = Vec::new();
    for status in [TaskStatus::InProgress, TaskStatus::ReadyForReview] {
        for task in state.stores.board.with_status(status) {
            let payload = crate::engine::tasks::payload_for_task(state, &task.id);
            let delegator = crate::engine::tasks::delegator_for_task(state, &task.id);
            let last_progress = progress.get(task.id.as_str()).map(|p| p.at);
            inputs.push(SlaInput {
                task,
                payload,
                delegator,
                last_progress,
            });
        }
    }

    let recommendations = sla::scan(&inputs, state.now());
    for rec in &recommendations {
        let event = match rec.severity {
            SlaSeverity::Warning => HubEvent::SlaWarning {
                task_id: rec.task_id.clone().into(),
                assignee: rec.account.clone(),
                action: format!("{:?}", rec.action).to_lowercase(),
                reason: rec.reason.clone(),
            },
            SlaSeverity::Breach => HubEvent::SlaBreach {
                task_id: rec.task_id.clone().into(),
                assignee: rec.account.clone(),
                action: format!("{:?}", rec.action).to_lowercase(),
                reason: rec.reason.clone(),
            },
        };
        state.bus.emit(&event);
    }
    recommendations
}

/// `get_trust`: one account or the whole table.
pub fn get_trust(state: &Arc<HubState>, account: Option<&str>) -> HandlerResult {
    if !state.feature(|f| f.trust) {
        return Err(HandlerError::feature_disabled("Trust"));
    }
    match account {
        Some(account) => {
            let record = state.stores.trust.get(account)?;
            Ok(json!({"account": account, "trust": record}))
        }
        None => {
            let all: Vec<_> = state
                .stores
                .trust
                .all()?
                .into_iter()
                .map(|(account, record)| json!({"account": account, "trust": record}))
                .collect();
            Ok(json!({"accounts": all}))
        }
    }
}

pub fn check_circuit_breaker(state: &Arc<HubState>, account: &str) -> HandlerResult {
    if !state.feature(|f| f.circuit_breaker) {
        return Err(HandlerError::feature_disabled("Circuit breaker"));
    }
    let record = state.stores.trust.get(account)?;
    Ok(json!({
        "account": account,
        "open": record.breaker_open(),
        "consecutiveFailures": record.consecutive_failures,
        "score": record.score,
    }))
}

pub fn reinstate_agent(state: &Arc<HubState>, account: &str) -> HandlerResult {
    if !state.feature(|f| f.circuit_breaker) {
        return Err(HandlerError::feature_disabled("Circuit breaker"));
    }
    let record = state.stores.trust.reinstate(account)?;
    Ok(json!({
        "account": account,
        "open": record.breaker_open(),
        "score": record.score,
    }))
}

/// `suggest_assignee`: capability-based routing over configured accounts.
pub fn suggest_assignee(
    state: &Arc<HubState>,
    skills: &[String],
    exclude: &[String],
    workload: Option<&HashMap<String, u32>>,
) -> HandlerResult {
    if !state.feature(|f| f.capability_routing) {
        return Err(HandlerError::feature_disabled("Capability routing"));
    }

    let trust_enabled = state.feature(|f| f.trust);
    let account_names: Vec<String> = {
        let config = state.config.read();
        config.accounts.iter().map(|a| a.name.clone()).collect()
    };

    let mut candidates = Vec::new();
    for account in account_names {
        let record = state.stores.capabilities.get(&account)?.unwrap_or_default();
        let trust = if trust_enabled {
            Some(state.stores.trust.get(&account)?)
        } else {
            None
        };
        candidates.push(routing::Candidate {
            account,
            record,
            trust,
        });
    }

    let suggestions = routing::suggest(candidates, skills, exclude, workload, state.now());
    Ok(json!({"suggestions": suggestions}))
}

/// `reauthorize_delegation`: a human approved an over-depth chain.
pub async fn reauthorize_delegation(
    state: &Arc<HubState>,
    caller: &str,
    to: &str,
    payload: serde_json::Value,
    context: Option<agentctl_wire::HandoffContext>,
) -> HandlerResult {
    handoffs::handoff_task(state, caller, to, payload, context, true).await
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
