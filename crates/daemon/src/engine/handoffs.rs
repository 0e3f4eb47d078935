// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff engine: validation, delegation-depth gate, delivery, task
//! creation and acceptance.
//!
//! A handoff is stored as a message of kind `handoff`; the message id
//! doubles as the task id. Events are emitted strictly after the
//! message and task have committed.

use crate::engine::{context, workspace, HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::config::DEFAULT_MAX_DELEGATION_DEPTH;
use agentctl_core::event::HubEvent;
use agentctl_core::handoff::{check_delegation_depth, HandoffPayload};
use agentctl_core::id::IdGen;
use agentctl_core::message::{Message, MessageId, MessageKind};
use agentctl_core::task::{Task, TaskId};
use agentctl_wire::HandoffContext;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Effective delegation-depth ceiling.
///
/// Precedence: explicit engine override > config file
/// (`delegationDepth.maxDepth`, then `defaults.maxDelegationDepth`) >
/// built-in default.
pub fn effective_max_depth(state: &HubState) -> u32 {
    if let Some(explicit) = state.engine_overrides.read().max_delegation_depth {
        return explicit;
    }
    let config = state.config.read();
    config
        .delegation_depth
        .max_depth
        .or(config.defaults.max_delegation_depth)
        .unwrap_or(DEFAULT_MAX_DELEGATION_DEPTH)
}

/// `handoff_task` / `reauthorize_delegation` semantics.
///
/// With `reauthorized` the depth gate is bypassed (a human approved the
/// over-depth chain); everything else is identical.
pub async fn handoff_task(
    state: &Arc<HubState>,
    from: &str,
    to: &str,
    payload: Value,
    context_args: Option<HandoffContext>,
    reauthorized: bool,
) -> HandlerResult {
    if to.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: to"));
    }

    let mut payload = HandoffPayload::from_value(payload).map_err(|problems| {
        HandlerError::msg("Invalid handoff payload").with("details", json!(problems))
    })?;

    let max_depth = effective_max_depth(state);
    let check = check_delegation_depth(payload.depth(), max_depth);
    if !check.allowed && !reauthorized {
        state.bus.emit(&HubEvent::DelegationChain {
            chain: vec![from.to_string(), to.to_string()],
            depth: check.current_depth,
            max_depth,
            blocked: true,
            parent_handoff_id: payload.parent_handoff_id.clone(),
        });
        let check_value = serde_json::to_value(&check).unwrap_or(Value::Null);
        return Err(HandlerError::msg(format!(
            "Delegation depth {} exceeds maximum {max_depth}; reauthorization required",
            check.current_depth
        ))
        .with("depthCheck", check_value));
    }

    state.bus.emit(&HubEvent::DelegationChain {
        chain: vec![from.to_string(), to.to_string()],
        depth: check.current_depth,
        max_depth,
        blocked: false,
        parent_handoff_id: payload.parent_handoff_id.clone(),
    });

    // Attach project context when the caller told us where the work lives
    if let Some(project_dir) = context_args.as_ref().and_then(|c| c.project_dir.as_deref()) {
        match context::collect_project_context(project_dir).await {
            Some(auto_context) => payload.auto_context = Some(auto_context),
            None => warn!(dir = %project_dir.display(), "project context collection failed"),
        }
    }

    let now = state.now();
    let id = MessageId::new(state.ids.next());
    let content = serde_json::to_string(&payload)
        .map_err(|e| HandlerError::msg(format!("failed to encode handoff: {e}")))?;

    let mut message_context = HashMap::new();
    if let Some(args) = &context_args {
        if let Some(dir) = &args.project_dir {
            message_context.insert("projectDir".to_string(), dir.display().to_string());
        }
        if let Some(branch) = &args.branch {
            message_context.insert("branch".to_string(), branch.clone());
        }
    }
    if reauthorized {
        message_context.insert("reauthorized".to_string(), "true".to_string());
    }

    let message = Message {
        id: id.clone(),
        from: from.to_string(),
        to: to.to_string(),
        kind: MessageKind::Handoff,
        content,
        timestamp: now,
        read: false,
        context: (!message_context.is_empty()).then_some(message_context),
    };
    state.stores.messages.add_message(&message)?;

    let task_id = TaskId::from(id.clone());
    let task = Task::new(task_id.clone(), payload.goal.clone(), to, now);
    state.stores.board.insert(task)?;

    state.bus.emit(&HubEvent::TaskCreated {
        task_id: task_id.clone(),
        from: from.to_string(),
        assignee: to.to_string(),
        title: payload.goal.clone(),
        payload: Box::new(payload),
    });

    info!(handoff_id = %id, from, to, "handoff delivered");

    Ok(json!({
        "delivered": state.is_connected(to),
        "queued": true,
        "handoffId": id.as_str(),
        "taskId": task_id.as_str(),
        "depthCheck": check,
    }))
}

/// `handoff_accept`: look the handoff up, optionally prepare a worktree,
/// and mark the task assigned.
pub async fn handoff_accept(state: &Arc<HubState>, caller: &str, handoff_id: &str) -> HandlerResult {
    let Some(message) = state.stores.messages.get_handoff_for(caller, handoff_id)? else {
        return Err(HandlerError::not_found(format!("handoff {handoff_id}")));
    };

    let Ok(mut payload) = serde_json::from_str::<HandoffPayload>(&message.content) else {
        return Err(HandlerError::msg(format!(
            "Handoff {handoff_id} is corrupted"
        )));
    };
    let auto_context = payload.auto_context.take();

    state.stores.messages.mark_read(handoff_id)?;

    // Prepare a worktree when the handoff carries a project location
    let mut workspace_value = Value::Null;
    let worktree_enabled = state.feature(|f| f.workspace_worktree);
    if worktree_enabled {
        let project_dir = message
            .context
            .as_ref()
            .and_then(|c| c.get("projectDir"))
            .cloned();
        let branch = message
            .context
            .as_ref()
            .and_then(|c| c.get("branch"))
            .cloned();
        if let (Some(project_dir), Some(branch)) = (project_dir, branch) {
            match workspace::prepare(
                state,
                std::path::Path::new(&project_dir),
                &branch,
                caller,
                handoff_id,
            )
            .await
            {
                Ok(ws) => {
                    workspace_value = serde_json::to_value(&ws).unwrap_or(Value::Null);
                }
                Err(e) => {
                    // Workspace problems never block acceptance
                    warn!(handoff_id, error = %e, "worktree preparation failed, continuing");
                }
            }
        }
    }

    state.bus.emit(&HubEvent::TaskAssigned {
        task_id: TaskId::new(handoff_id),
        delegator: message.from.clone(),
        delegatee: caller.to_string(),
        reason: "handoff_accepted".to_string(),
    });

    Ok(json!({
        "handoff": {
            "id": message.id.as_str(),
            "from": message.from,
            "payload": payload,
            "timestamp": agentctl_core::time_fmt::iso_millis(&message.timestamp),
        },
        "autoContext": auto_context,
        "workspace": workspace_value,
    }))
}

#[cfg(test)]
#[path = "handoffs_tests.rs"]
mod tests;
