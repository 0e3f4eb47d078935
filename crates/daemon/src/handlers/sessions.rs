// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live and named session handlers.
//!
//! Live pair state is owned by the in-memory manager; the session store
//! is a durable registry for naming, listing and search.

use crate::engine::sessions::SessionError;
use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::activity::{ActivityKind, NewActivity};
use agentctl_core::id::IdGen;
use agentctl_core::session::SessionId;
use serde_json::json;
use std::sync::Arc;

fn sessions_enabled(state: &HubState) -> Result<(), HandlerError> {
    if state.feature(|f| f.sessions) {
        Ok(())
    } else {
        Err(HandlerError::feature_disabled("Sessions"))
    }
}

pub fn share_session(
    state: &Arc<HubState>,
    caller: &str,
    target: &str,
    workspace: Option<String>,
) -> HandlerResult {
    sessions_enabled(state)?;
    let session = state
        .live_sessions
        .create_session(
            SessionId::new(state.ids.next()),
            caller,
            target,
            workspace,
            state.now(),
        )
        .map_err(|e: SessionError| HandlerError::msg(e.to_string()))?;

    if let Err(e) = state.stores.sessions.record_started(&session) {
        tracing::warn!(error = %e, "session registry write failed");
    }
    state.record_activity(
        NewActivity::new(ActivityKind::SessionStarted, caller)
            .meta("sessionId", json!(session.id.as_str()))
            .meta("participant", json!(target)),
    );

    Ok(json!({"session": session}))
}

pub fn join_session(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    match state.live_sessions.join_session(session_id, caller, state.now()) {
        Some(session) => Ok(json!({"session": session})),
        None => Err(HandlerError::msg(format!(
            "Cannot join session {session_id}"
        ))),
    }
}

pub fn session_broadcast(
    state: &Arc<HubState>,
    caller: &str,
    session_id: &str,
    data: serde_json::Value,
) -> HandlerResult {
    sessions_enabled(state)?;
    if state
        .live_sessions
        .add_update(session_id, caller, data, state.now())
    {
        Ok(json!({"stored": true}))
    } else {
        Err(HandlerError::msg(format!(
            "Not a member of session {session_id}"
        )))
    }
}

/// Status also drains the caller's unread updates (cursor semantics).
pub fn session_status(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    let Some(session) = state.live_sessions.get(session_id) else {
        return Err(HandlerError::not_found(format!("session {session_id}")));
    };
    if !session.is_member(caller) {
        return Err(HandlerError::msg(format!(
            "Not a member of session {session_id}"
        )));
    }
    let updates = state.live_sessions.get_updates(session_id, caller);
    Ok(json!({"session": session, "updates": updates}))
}

pub fn session_history(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    match state.live_sessions.history(session_id, caller) {
        Some(updates) => Ok(json!({"sessionId": session_id, "updates": updates})),
        None => Err(HandlerError::msg(format!(
            "Not a member of session {session_id}"
        ))),
    }
}

pub fn leave_session(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    if !state.live_sessions.end_session(session_id, caller) {
        return Err(HandlerError::msg(format!(
            "Not a member of session {session_id}"
        )));
    }
    if let Err(e) = state.stores.sessions.record_ended(session_id, state.now()) {
        tracing::warn!(error = %e, "session registry update failed");
    }
    state.record_activity(
        NewActivity::new(ActivityKind::SessionEnded, caller)
            .meta("sessionId", json!(session_id)),
    );
    Ok(json!({"ended": true}))
}

pub fn session_ping(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    if state.live_sessions.record_ping(session_id, caller, state.now()) {
        Ok(json!({"ok": true}))
    } else {
        Err(HandlerError::msg(format!(
            "Not a member of session {session_id}"
        )))
    }
}

// -- named sessions --

pub fn name_session(state: &Arc<HubState>, session_id: &str, name: &str) -> HandlerResult {
    sessions_enabled(state)?;
    if name.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: name"));
    }
    if state.stores.sessions.set_name(session_id, name)? {
        Ok(json!({"sessionId": session_id, "name": name}))
    } else {
        Err(HandlerError::not_found(format!("session {session_id}")))
    }
}

pub fn list_sessions(state: &Arc<HubState>) -> HandlerResult {
    sessions_enabled(state)?;
    let rows = state.stores.sessions.list(0)?;
    let live: Vec<String> = state
        .live_sessions
        .active_sessions()
        .into_iter()
        .map(|s| s.id.to_string())
        .collect();
    let sessions: Vec<_> = rows
        .into_iter()
        .map(|row| {
            let active = live.contains(&row.id);
            json!({
                "id": row.id,
                "name": row.name,
                "initiator": row.initiator,
                "participant": row.participant,
                "startedAt": agentctl_core::time_fmt::iso_millis(&row.started_at),
                "active": active,
            })
        })
        .collect();
    Ok(json!({"sessions": sessions}))
}

pub fn search_sessions(state: &Arc<HubState>, query: &str, limit: Option<u32>) -> HandlerResult {
    sessions_enabled(state)?;
    let rows = state.stores.sessions.search(query, limit.unwrap_or(20))?;
    Ok(json!({"sessions": rows}))
}

/// `replay_session`: the full in-memory update history, cursor-free.
pub fn replay_session(state: &Arc<HubState>, caller: &str, session_id: &str) -> HandlerResult {
    sessions_enabled(state)?;
    match state.live_sessions.history(session_id, caller) {
        Some(updates) => {
            let count = updates.len();
            Ok(json!({"sessionId": session_id, "updates": updates, "count": count}))
        }
        None => Err(HandlerError::not_found(format!(
            "session {session_id} (live sessions do not survive restarts)"
        ))),
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
