// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retro handlers: retrospective sessions, reviews, synthesis and past
//! learnings.

use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::id::IdGen;
use serde_json::json;
use std::sync::Arc;

fn retro_enabled(state: &HubState) -> Result<(), HandlerError> {
    if state.feature(|f| f.retro) {
        Ok(())
    } else {
        Err(HandlerError::feature_disabled("Retro"))
    }
}

pub fn retro_start_session(state: &Arc<HubState>, task_id: &str) -> HandlerResult {
    retro_enabled(state)?;
    if state.stores.board.get(task_id).is_none() {
        return Err(HandlerError::not_found(format!("task {task_id}")));
    }
    let retro_id = state.ids.next();
    state.stores.retro.start(&retro_id, task_id, state.now())?;
    Ok(json!({"retroId": retro_id, "taskId": task_id, "status": "open"}))
}

pub fn retro_submit_review(
    state: &Arc<HubState>,
    caller: &str,
    retro_id: &str,
    content: &str,
) -> HandlerResult {
    retro_enabled(state)?;
    if content.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: content"));
    }
    if state
        .stores
        .retro
        .submit_review(retro_id, caller, content, state.now())?
    {
        Ok(json!({"retroId": retro_id, "submitted": true}))
    } else {
        Err(HandlerError::not_found(format!("retro {retro_id}")))
    }
}

pub fn retro_submit_synthesis(
    state: &Arc<HubState>,
    retro_id: &str,
    content: &str,
) -> HandlerResult {
    retro_enabled(state)?;
    if content.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: content"));
    }
    if state
        .stores
        .retro
        .submit_synthesis(retro_id, content, state.now())?
    {
        Ok(json!({"retroId": retro_id, "status": "synthesized"}))
    } else {
        Err(HandlerError::not_found(format!("retro {retro_id}")))
    }
}

pub fn retro_status(state: &Arc<HubState>, retro_id: &str) -> HandlerResult {
    retro_enabled(state)?;
    match state.stores.retro.get(retro_id)? {
        Some((session, reviews)) => Ok(json!({"session": session, "reviews": reviews})),
        None => Err(HandlerError::not_found(format!("retro {retro_id}"))),
    }
}

pub fn retro_get_past_learnings(
    state: &Arc<HubState>,
    query: Option<&str>,
    limit: Option<u32>,
) -> HandlerResult {
    retro_enabled(state)?;
    let learnings = state
        .stores
        .retro
        .past_learnings(query, limit.unwrap_or(20))?;
    Ok(json!({"learnings": learnings}))
}
