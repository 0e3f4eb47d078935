// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Messaging handlers: send, read, count, account listing, archiving.

use crate::engine::{HandlerError, HandlerResult};
use crate::lifecycle::HubState;
use agentctl_core::id::IdGen;
use agentctl_core::message::{Message, MessageId, MessageKind};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_PAGE: u32 = 50;
const DEFAULT_ARCHIVE_DAYS: u32 = 30;

pub fn send_message(
    state: &Arc<HubState>,
    caller: &str,
    to: &str,
    content: &str,
    context: Option<HashMap<String, String>>,
) -> HandlerResult {
    if to.trim().is_empty() {
        return Err(HandlerError::msg("Invalid field: to"));
    }

    let message = Message {
        id: MessageId::new(state.ids.next()),
        from: caller.to_string(),
        to: to.to_string(),
        kind: MessageKind::Message,
        content: content.to_string(),
        timestamp: state.now(),
        read: false,
        context,
    };
    let id = state.stores.messages.add_message(&message)?;

    Ok(json!({
        "delivered": state.is_connected(to),
        "queued": true,
        "messageId": id.as_str(),
    }))
}

pub fn read_messages(
    state: &Arc<HubState>,
    caller: &str,
    unread_only: bool,
    limit: Option<u32>,
    offset: Option<u32>,
) -> HandlerResult {
    let messages = if unread_only {
        let unread = state.stores.messages.get_unread_messages(caller)?;
        state.stores.messages.mark_all_read(caller)?;
        unread
    } else {
        state.stores.messages.get_messages(
            caller,
            limit.unwrap_or(DEFAULT_PAGE),
            offset.unwrap_or(0),
        )?
    };

    Ok(json!({
        "messages": messages,
        "count": messages.len(),
    }))
}

pub fn count_unread(state: &Arc<HubState>, caller: &str) -> HandlerResult {
    let count = state.stores.messages.count_unread(caller)?;
    Ok(json!({"count": count}))
}

pub fn list_accounts(state: &Arc<HubState>) -> HandlerResult {
    let config = state.config.read();
    let accounts: Vec<_> = config
        .accounts
        .iter()
        .map(|account| {
            json!({
                "name": account.name,
                "provider": account.provider,
                "color": account.color,
                "label": account.label,
                "connected": state.is_connected(&account.name),
            })
        })
        .collect();
    Ok(json!({"accounts": accounts}))
}

pub fn archive_messages(state: &Arc<HubState>, days: Option<u32>) -> HandlerResult {
    let days = days.unwrap_or(DEFAULT_ARCHIVE_DAYS);
    let archived = state.stores.messages.archive_old(days, state.now())?;
    Ok(json!({"archived": archived, "days": days}))
}

#[cfg(test)]
#[path = "messaging_tests.rs"]
mod tests;
