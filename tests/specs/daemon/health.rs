//! Health, knowledge, retro, workflow and config specs.

use crate::prelude::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn health_and_layout() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let check = alice.request(json!({"type": "health_check"}));
    assert_eq!(check["status"], json!("ok"));

    let status = alice.request(json!({"type": "health_status"}));
    assert_eq!(status["stores"]["messages"], json!(true));
    assert_eq!(status["stores"]["trust"], json!(true));
    assert_eq!(status["accounts"], json!(2));
    assert!(status["connectedAccounts"]
        .as_array()
        .unwrap()
        .contains(&json!("alice")));

    // The documented files exist under the base dir
    for file in [
        "config.json",
        "hub.sock",
        "daemon.pid",
        "messages.db",
        "activity.db",
        "tasks.json",
        "prompts.json",
        "clipboard.json",
        "handoff-templates.json",
    ] {
        assert!(
            daemon.base_dir.path().join(file).exists(),
            "missing {file}"
        );
    }
}

#[test]
fn knowledge_index_and_search() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    alice.request(json!({
        "type": "index_note",
        "title": "worktree cleanup",
        "content": "git worktree remove needs --force for dirty trees",
        "tags": ["git"],
    }));

    let found = alice.request(json!({"type": "search_knowledge", "query": "dirty"}));
    assert_eq!(found["count"], json!(1));
    assert_eq!(found["results"][0]["title"], json!("worktree cleanup"));

    let missing = alice.request(json!({"type": "search_knowledge", "query": "kubernetes"}));
    assert_eq!(missing["count"], json!(0));
}

#[test]
fn feature_gates_surface_as_errors() {
    let mut config = default_config();
    config["features"]["knowledgeIndex"] = json!(false);
    config["features"]["workflow"] = json!(false);
    let daemon = Daemon::start_with_config(config);
    let mut alice = daemon.client("alice", "s1");

    let reply = alice.request(json!({"type": "search_knowledge", "query": "x"}));
    assert_eq!(reply["error"], json!("Knowledge index not enabled"));

    let reply = alice.request(json!({"type": "workflow_list"}));
    assert_eq!(reply["error"], json!("Workflow not enabled"));
}

#[test]
fn workflow_trigger_and_status() {
    let daemon = Daemon::start();
    std::fs::write(
        daemon.base_dir.path().join("workflows/smoke.yaml"),
        "name: smoke\nsteps:\n  - name: hello\n    run: echo hello\n  - name: after\n    run: echo after\n    needs: [hello]\n",
    )
    .unwrap();

    let mut alice = daemon.client("alice", "s1");
    let listing = alice.request(json!({"type": "workflow_list"}));
    assert_eq!(listing["workflows"][0]["name"], json!("smoke"));

    let triggered = alice.request(json!({"type": "workflow_trigger", "workflow": "smoke"}));
    let run_id = triggered["runId"].as_str().unwrap().to_string();

    let mut poll = daemon.client("bob", "s2");
    assert!(wait_until(Duration::from_secs(10), || {
        let status = poll.request(json!({"type": "workflow_status", "runId": run_id}));
        status["run"]["status"] == json!("completed")
    }));
}

#[test]
fn retro_lifecycle_over_the_wire() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    let mut bob = daemon.client("bob", "s2");

    let handoff = alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": handoff_payload("retro target", &["true"]),
    }));
    let task_id = handoff["taskId"].as_str().unwrap().to_string();

    let started = alice.request(json!({"type": "retro_start_session", "taskId": task_id}));
    let retro_id = started["retroId"].as_str().unwrap().to_string();

    bob.request(json!({
        "type": "retro_submit_review", "retroId": retro_id, "content": "handoff was clear",
    }));
    alice.request(json!({
        "type": "retro_submit_synthesis", "retroId": retro_id,
        "content": "write acceptance commands before delegating",
    }));

    let status = alice.request(json!({"type": "retro_status", "retroId": retro_id}));
    assert_eq!(status["session"]["status"], json!("synthesized"));
    assert_eq!(status["reviews"].as_array().unwrap().len(), 1);

    let learnings = bob.request(json!({
        "type": "retro_get_past_learnings", "query": "acceptance",
    }));
    assert_eq!(learnings["learnings"].as_array().unwrap().len(), 1);
}

#[test]
fn config_reload_picks_up_changes() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");

    let mut config = default_config();
    config["accounts"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "carol", "provider": "opencode"}));
    std::fs::write(
        daemon.base_dir.path().join("config.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    let reply = alice.request(json!({"type": "config_reload"}));
    assert_eq!(reply["reloaded"], json!(true));
    assert_eq!(reply["accounts"], json!(3));

    let accounts = alice.request(json!({"type": "list_accounts"}));
    assert_eq!(accounts["accounts"].as_array().unwrap().len(), 3);
}

#[test]
fn activity_query_and_search() {
    let daemon = Daemon::start();
    let mut alice = daemon.client("alice", "s1");
    alice.request(json!({
        "type": "handoff_task",
        "to": "bob",
        "payload": handoff_payload("searchable goal", &["true"]),
    }));

    let events = alice.request(json!({"type": "query_activity", "account": "bob"}));
    assert!(events["count"].as_u64().unwrap() >= 1);

    let hits = alice.request(json!({"type": "query_activity", "search": "searchable"}));
    assert!(hits["count"].as_u64().unwrap() >= 1);
}
