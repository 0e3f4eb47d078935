//! Shared-session specs.

use crate::prelude::*;
use serde_json::json;

#[test]
fn self_pairing_rejected_with_exact_wording() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({"type": "share_session", "target": "alice"}));
    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["error"], json!("Cannot create session with yourself"));
}

#[test]
fn pair_session_update_flow() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let shared = alice.request(json!({"type": "share_session", "target": "bob"}));
    let session_id = shared["session"]["id"].as_str().unwrap().to_string();

    bob.request(json!({"type": "join_session", "sessionId": session_id}));
    alice.request(json!({
        "type": "session_broadcast",
        "sessionId": session_id,
        "data": {"cursor": {"file": "main.rs", "line": 42}},
    }));

    // Status drains unread updates; the second call returns none
    let status = bob.request(json!({"type": "session_status", "sessionId": session_id}));
    assert_eq!(status["updates"].as_array().unwrap().len(), 1);
    let again = bob.request(json!({"type": "session_status", "sessionId": session_id}));
    assert_eq!(again["updates"].as_array().unwrap().len(), 0);

    // History keeps everything
    let history = bob.request(json!({"type": "session_history", "sessionId": session_id}));
    assert_eq!(history["updates"].as_array().unwrap().len(), 1);

    // Ping and leave are membership-gated
    let pinged = bob.request(json!({"type": "session_ping", "sessionId": session_id}));
    assert_eq!(pinged["ok"], json!(true));

    let ended = alice.request(json!({"type": "leave_session", "sessionId": session_id}));
    assert_eq!(ended["ended"], json!(true));

    // Ending twice stays an error-free no-op for members
    let again = alice.request(json!({"type": "leave_session", "sessionId": session_id}));
    assert_eq!(again["ended"], json!(true));
}

#[test]
fn non_members_are_locked_out() {
    let daemon = Daemon::start_with_config({
        let mut config = default_config();
        config["accounts"]
            .as_array_mut()
            .unwrap()
            .push(json!({"name": "carol", "provider": "opencode"}));
        config
    });
    std::fs::write(daemon.base_dir.path().join("tokens/carol.token"), "s3").unwrap();

    let mut alice = daemon.client("alice", "s1");
    let mut carol = daemon.client("carol", "s3");

    let shared = alice.request(json!({"type": "share_session", "target": "bob"}));
    let session_id = shared["session"]["id"].as_str().unwrap().to_string();

    for request in [
        json!({"type": "join_session", "sessionId": session_id}),
        json!({"type": "session_broadcast", "sessionId": session_id, "data": 1}),
        json!({"type": "session_status", "sessionId": session_id}),
        json!({"type": "session_history", "sessionId": session_id}),
        json!({"type": "session_ping", "sessionId": session_id}),
        json!({"type": "leave_session", "sessionId": session_id}),
    ] {
        let reply = carol.request(request);
        assert_eq!(reply["type"], json!("error"), "carol got through: {reply}");
    }
}

#[test]
fn named_sessions_are_searchable() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let shared = alice.request(json!({"type": "share_session", "target": "bob"}));
    let session_id = shared["session"]["id"].as_str().unwrap().to_string();

    alice.request(json!({
        "type": "name_session", "sessionId": session_id, "name": "auth-debugging",
    }));

    let found = alice.request(json!({"type": "search_sessions", "query": "debug"}));
    assert_eq!(found["sessions"].as_array().unwrap().len(), 1);

    let listing = alice.request(json!({"type": "list_sessions"}));
    assert_eq!(listing["sessions"][0]["name"], json!("auth-debugging"));
}
