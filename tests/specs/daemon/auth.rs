//! Handshake and messaging specs.

use crate::prelude::*;
use serde_json::json;

#[test]
fn auth_then_message_round_trip() {
    let daemon = Daemon::start();

    // Client connects and authenticates with the stored token
    let mut alice = daemon.client("alice", "s1");

    // Sends a message to a disconnected peer
    let reply = alice.request(json!({
        "type": "send_message",
        "to": "bob",
        "content": "hi",
        "requestId": "r1",
    }));
    assert_eq!(reply["type"], json!("result"));
    assert_eq!(reply["delivered"], json!(false));
    assert_eq!(reply["queued"], json!(true));
    assert_eq!(reply["requestId"], json!("r1"));

    // Bob reads exactly one message with the expected fields
    let mut bob = daemon.client("bob", "s2");
    let read = bob.request(json!({"type": "read_messages", "unreadOnly": true}));
    assert_eq!(read["count"], json!(1));
    assert_eq!(read["messages"][0]["from"], json!("alice"));
    assert_eq!(read["messages"][0]["content"], json!("hi"));

    // Delivered flips once the recipient is connected
    let reply = alice.request(json!({"type": "send_message", "to": "bob", "content": "again"}));
    assert_eq!(reply["delivered"], json!(true));
}

#[test]
fn token_with_trailing_newline_accepted() {
    let daemon = Daemon::start();
    // bob.token was written with a trailing newline
    let _bob = daemon.client("bob", "s2");
}

#[test]
fn wrong_token_rejected_and_connection_closed() {
    let daemon = Daemon::start();
    let mut client = daemon.connect();

    let reply = client.request(json!({"type": "auth", "account": "alice", "token": "nope"}));
    assert_eq!(reply["type"], json!("error"));
    assert!(client.is_closed());
}

#[test]
fn unknown_account_rejected() {
    let daemon = Daemon::start();
    let mut client = daemon.connect();
    let reply = client.request(json!({"type": "auth", "account": "mallory", "token": "s1"}));
    assert_eq!(reply["type"], json!("error"));
}

#[test]
fn only_ping_succeeds_before_auth() {
    let daemon = Daemon::start();
    let mut client = daemon.connect();

    let pong = client.request(json!({"type": "ping", "requestId": "p1"}));
    assert_eq!(pong["type"], json!("pong"));

    let denied = client.request(json!({"type": "count_unread"}));
    assert_eq!(denied["type"], json!("error"));
    assert_eq!(denied["error"], json!("Not authenticated"));

    // Still not closed: auth can proceed
    let ok = client.request(json!({"type": "auth", "account": "alice", "token": "s1"}));
    assert_eq!(ok["type"], json!("auth_ok"));
}

#[test]
fn unknown_type_is_invalid_message_and_connection_survives() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({"type": "nonexistent_command"}));
    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["error"], json!("Invalid message"));

    // Connection remains responsive
    let pong = alice.request(json!({"type": "ping"}));
    assert_eq!(pong["type"], json!("pong"));
}

#[test]
fn missing_field_names_the_field() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({"type": "send_message", "content": "hi"}));
    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["error"], json!("Invalid field: to"));
}

#[test]
fn self_messages_are_permitted() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    alice.request(json!({"type": "send_message", "to": "alice", "content": "note"}));
    let read = alice.request(json!({"type": "read_messages", "unreadOnly": true}));
    assert_eq!(read["count"], json!(1));
}

#[test]
fn request_ids_echo_on_errors_too() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({"type": "nonexistent_command", "requestId": "r9"}));
    assert_eq!(reply["requestId"], json!("r9"));
}

#[test]
fn typed_wire_crate_speaks_the_same_protocol() {
    use agentctl_wire::{encode_frame, Request, Response};

    let daemon = Daemon::start();
    let mut client = daemon.connect();

    // A bridge built on the wire crate produces byte-identical frames
    let frame = encode_frame(&Request::Auth {
        account: "alice".to_string(),
        token: "s1".to_string(),
    })
    .unwrap();
    let value: serde_json::Value = serde_json::from_slice(frame.trim_ascii_end()).unwrap();
    let reply = client.request(value);

    let response: Response = serde_json::from_value(reply).unwrap();
    assert_eq!(response, Response::AuthOk);

    let frame = encode_frame(&Request::CountUnread).unwrap();
    let value: serde_json::Value = serde_json::from_slice(frame.trim_ascii_end()).unwrap();
    let reply = client.request(value);
    assert_eq!(reply["type"], json!("result"));
    assert_eq!(reply["count"], json!(0));
}
