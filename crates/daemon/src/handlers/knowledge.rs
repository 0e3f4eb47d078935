// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Knowledge handlers: note indexing and full-text search.

use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::id::IdGen;
use agentctl_storage::Note;
use serde_json::json;
use std::sync::Arc;

pub fn index_note(
    state: &Arc<HubState>,
    caller: &str,
    title: &str,
    content: &str,
    tags: Vec<String>,
) -> HandlerResult {
    if !state.feature(|f| f.knowledge_index) {
        return Err(HandlerError::feature_disabled("Knowledge index"));
    }
    if title.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: title"));
    }

    let note = Note {
        id: state.ids.next(),
        title: title.to_string(),
        content: content.to_string(),
        tags,
        account: caller.to_string(),
        timestamp: state.now(),
    };
    state.stores.knowledge.index_note(&note)?;
    Ok(json!({"noteId": note.id, "indexed": true}))
}

pub fn search_knowledge(state: &Arc<HubState>, query: &str, limit: Option<u32>) -> HandlerResult {
    if !state.feature(|f| f.knowledge_index) {
        return Err(HandlerError::feature_disabled("Knowledge index"));
    }
    let results = state.stores.knowledge.search(query, limit.unwrap_or(20))?;
    let count = results.len();
    Ok(json!({"results": results, "count": count}))
}
