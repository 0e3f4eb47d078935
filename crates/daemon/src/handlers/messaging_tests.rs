// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::test_state;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn send_then_read_round_trip() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());

    let reply = send_message(&state, "alice", "bob", "hi", None).unwrap();
    assert_eq!(reply["delivered"], json!(false));
    assert_eq!(reply["queued"], json!(true));

    let read = read_messages(&state, "bob", true, None, None).unwrap();
    assert_eq!(read["count"], json!(1));
    assert_eq!(read["messages"][0]["from"], json!("alice"));
    assert_eq!(read["messages"][0]["content"], json!("hi"));

    // Reading consumed the unread flag
    assert_eq!(count_unread(&state, "bob").unwrap()["count"], json!(0));
    let again = read_messages(&state, "bob", true, None, None).unwrap();
    assert_eq!(again["count"], json!(0));
}

#[test]
fn delivered_reflects_connection_table() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    state.client_connected("bob");

    let reply = send_message(&state, "alice", "bob", "hi", None).unwrap();
    assert_eq!(reply["delivered"], json!(true));

    state.client_disconnected("bob");
    let reply = send_message(&state, "alice", "bob", "again", None).unwrap();
    assert_eq!(reply["delivered"], json!(false));
}

#[test]
fn empty_recipient_rejected() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let err = send_message(&state, "alice", "", "hi", None).unwrap_err();
    assert_eq!(err.message, "Invalid field: to");
}

#[test]
fn list_accounts_reports_connection_state() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    {
        let mut config = state.config.write();
        config.accounts = serde_json::from_value(json!([
            {"name": "alice", "provider": "claude-code"},
            {"name": "bob", "provider": "codex-cli"},
        ]))
        .unwrap();
    }
    state.client_connected("alice");

    let reply = list_accounts(&state).unwrap();
    let accounts = reply["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0]["connected"], json!(true));
    assert_eq!(accounts[1]["connected"], json!(false));
}

#[test]
fn archive_removes_old_read_messages_once() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());

    let stale = Message {
        id: MessageId::new("m-old"),
        from: "alice".to_string(),
        to: "bob".to_string(),
        kind: MessageKind::Message,
        content: "ancient".to_string(),
        timestamp: state.now() - chrono::Duration::days(45),
        read: true,
        context: None,
    };
    state.stores.messages.add_message(&stale).unwrap();
    send_message(&state, "alice", "bob", "fresh", None).unwrap();

    let first = archive_messages(&state, Some(30)).unwrap();
    assert_eq!(first["archived"], json!(1));

    let second = archive_messages(&state, Some(30)).unwrap();
    assert_eq!(second["archived"], json!(0));

    // The fresh unread message survived
    assert_eq!(count_unread(&state, "bob").unwrap()["count"], json!(1));
}
