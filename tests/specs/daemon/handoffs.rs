//! Handoff, task-lifecycle and auto-acceptance specs.

use crate::prelude::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn invalid_handoff_payload_creates_no_task() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let mut payload = handoff_payload("bad", &["true"]);
    payload["acceptance_criteria"] = json!([]);
    let reply = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": payload,
    }));
    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["error"], json!("Invalid handoff payload"));
    assert!(reply["details"].as_array().is_some());

    // No task appeared on the board
    let health = alice.request(json!({"type": "health_status"}));
    assert_eq!(health["tasks"]["todo"], json!(0));
}

#[test]
fn delegation_depth_block_is_observable() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let mut payload = handoff_payload("too deep", &["true"]);
    payload["delegation_depth"] = json!(3);
    let reply = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": payload,
    }));

    assert_eq!(reply["type"], json!("error"));
    assert_eq!(reply["depthCheck"]["allowed"], json!(false));
    assert_eq!(reply["depthCheck"]["currentDepth"], json!(3));
    assert_eq!(reply["depthCheck"]["maxDepth"], json!(3));
    assert_eq!(reply["depthCheck"]["requiresReauthorization"], json!(true));

    // Exactly one blocked delegation_chain activity event
    let chains = alice.request(json!({"type": "query_activity"}));
    let blocked: Vec<_> = chains["events"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["type"] == json!("delegation_chain") && e["metadata"]["blocked"] == json!(true))
        .collect();
    assert_eq!(blocked.len(), 1);

    // Reauthorization delivers the same payload
    let mut payload = handoff_payload("too deep", &["true"]);
    payload["delegation_depth"] = json!(3);
    let reply = alice.request(json!({
        "type": "reauthorize_delegation",
        "to": "bob",
        "payload": payload,
    }));
    assert_eq!(reply["type"], json!("result"));
    assert_eq!(reply["queued"], json!(true));
}

#[test]
fn handoff_accept_and_manual_review_flow() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let reply = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": handoff_payload("implement parser", &["true"]),
    }));
    let task_id = reply["taskId"].as_str().unwrap().to_string();
    assert_eq!(reply["handoffId"], reply["taskId"]);

    let accepted = bob.request(json!({"type": "handoff_accept", "handoffId": task_id}));
    assert_eq!(accepted["handoff"]["from"], json!("alice"));
    assert_eq!(accepted["handoff"]["payload"]["goal"], json!("implement parser"));

    // todo -> accepted is rejected outright
    let bad = bob.request(json!({
        "type": "update_task_status",
        "taskId": task_id,
        "newStatus": "accepted",
    }));
    assert_eq!(bad["type"], json!("error"));

    bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "in_progress",
    }));

    // Progress reports land on the task
    let progress = bob.request(json!({
        "type": "report_progress", "taskId": task_id, "percent": 50, "note": "halfway",
    }));
    assert_eq!(progress["type"], json!("result"));

    // ready_for_review without workspace context: no acceptance run
    let review = bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "ready_for_review",
    }));
    assert_eq!(review["type"], json!("result"));
    assert!(review.get("acceptance").is_none());

    // Rejection requires a reason
    let bad = alice.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "rejected",
    }));
    assert_eq!(bad["type"], json!("error"));

    let rejected = alice.request(json!({
        "type": "update_task_status",
        "taskId": task_id,
        "newStatus": "rejected",
        "reason": "does not handle unicode",
    }));
    assert_eq!(rejected["type"], json!("result"));

    // Rework loop re-opens the task
    let rework = bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "in_progress",
    }));
    assert_eq!(rework["type"], json!("result"));
}

#[test]
fn auto_acceptance_passes_and_raises_trust() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let workspace = daemon.base_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    let reply = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": handoff_payload("echo twice", &["echo hello", "echo world"]),
    }));
    let task_id = reply["taskId"].as_str().unwrap().to_string();

    let trust_before = bob.request(json!({"type": "get_trust", "account": "bob"}));
    let score_before = trust_before["trust"]["score"].as_i64().unwrap();

    bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "in_progress",
    }));
    let review = bob.request(json!({
        "type": "update_task_status",
        "taskId": task_id,
        "newStatus": "ready_for_review",
        "workspacePath": workspace,
        "branch": "feat-echo",
    }));
    assert_eq!(review["acceptance"], json!("running"));

    // The board eventually shows the task accepted
    let mut poll = daemon.client("alice", "s1");
    assert!(wait_until(Duration::from_secs(10), || {
        let health = poll.request(json!({"type": "health_status"}));
        health["tasks"]["accepted"] == json!(1)
    }));

    // An auto-acceptance receipt is persisted
    let analytics = alice.request(json!({"type": "get_analytics"}));
    let receipts = analytics["recentReceipts"].as_array().unwrap();
    assert!(receipts
        .iter()
        .any(|r| r["method"] == json!("auto-acceptance") && r["verdict"] == json!("accepted")));

    // Trust strictly increased
    let trust_after = bob.request(json!({"type": "get_trust", "account": "bob"}));
    assert!(trust_after["trust"]["score"].as_i64().unwrap() > score_before);
}

#[test]
fn failing_commands_reject_with_summary() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let workspace = daemon.base_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    let reply = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": handoff_payload("doomed", &["false"]),
    }));
    let task_id = reply["taskId"].as_str().unwrap().to_string();

    bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "in_progress",
    }));
    bob.request(json!({
        "type": "update_task_status",
        "taskId": task_id,
        "newStatus": "ready_for_review",
        "workspacePath": workspace,
        "branch": "feat-doom",
    }));

    let mut poll = daemon.client("alice", "s1");
    assert!(wait_until(Duration::from_secs(10), || {
        let health = poll.request(json!({"type": "health_status"}));
        health["tasks"]["rejected"] == json!(1)
    }));
}

#[test]
fn critical_handoff_blocks_auto_acceptance() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let workspace = daemon.base_dir.path().join("ws");
    std::fs::create_dir_all(&workspace).unwrap();

    let mut payload = handoff_payload("rotate keys", &["true"]);
    payload["criticality"] = json!("critical");
    let reply = alice.request(json!({"type": "handoff_task", "to": "bob", "payload": payload}));
    let task_id = reply["taskId"].as_str().unwrap().to_string();

    bob.request(json!({
        "type": "update_task_status", "taskId": task_id, "newStatus": "in_progress",
    }));
    let review = bob.request(json!({
        "type": "update_task_status",
        "taskId": task_id,
        "newStatus": "ready_for_review",
        "workspacePath": workspace,
        "branch": "feat-keys",
    }));
    assert_eq!(review["acceptance"], json!("blocked"));
    assert_eq!(review["frictionLevel"], json!("high"));
}

#[test]
fn suggest_assignee_ranks_accounts() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({
        "type": "suggest_assignee",
        "skills": ["rust"],
    }));
    let suggestions = reply["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);
    // Fresh accounts tie; names break the tie ascending
    assert_eq!(suggestions[0]["account"], json!("alice"));
    assert_eq!(suggestions[1]["account"], json!("bob"));
    assert!(suggestions[0]["breakdown"]["skillMatch"].as_f64().is_some());

    let excluded = alice.request(json!({
        "type": "suggest_assignee",
        "skills": [],
        "excludeAccounts": ["alice"],
    }));
    assert_eq!(excluded["suggestions"].as_array().unwrap().len(), 1);
}
