// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::engine::handoffs;
use crate::lifecycle::{test_state, test_state_with};
use agentctl_core::config::{CouncilConfig, CouncilReviewer, HubConfig};
use serde_json::json;
use tempfile::tempdir;

fn state_with_reviewers(
    dir: &std::path::Path,
    commands: Vec<Vec<&str>>,
) -> std::sync::Arc<crate::lifecycle::HubState> {
    let mut config = HubConfig::default();
    config.features.council = true;
    config.features.trust = true;
    config.council = Some(CouncilConfig {
        reviewers: commands
            .into_iter()
            .enumerate()
            .map(|(i, argv)| CouncilReviewer {
                name: format!("reviewer-{i}"),
                command: argv.into_iter().map(str::to_string).collect(),
            })
            .collect(),
        timeout_ms: Some(5_000),
        extra: Default::default(),
    });
    test_state_with(dir, config)
}

#[tokio::test]
async fn analyze_caches_by_prompt() {
    let dir = tempdir().unwrap();
    let state = state_with_reviewers(dir.path(), vec![vec!["echo", "approve"]]);

    let first = council_analyze(&state, "review the auth change", None)
        .await
        .unwrap();
    assert_eq!(first["verdict"], json!("accepted"));
    assert_eq!(first["cached"], json!(false));

    let second = council_analyze(&state, "review the auth change", None)
        .await
        .unwrap();
    assert_eq!(second["cached"], json!(true));

    let history = council_history(&state, None).unwrap();
    assert_eq!(history["consultations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn split_council_needs_majority() {
    let dir = tempdir().unwrap();
    let state = state_with_reviewers(
        dir.path(),
        vec![vec!["echo", "approve"], vec!["echo", "reject: risky"]],
    );

    let reply = council_analyze(&state, "borderline change", None).await.unwrap();
    assert_eq!(reply["verdict"], json!("rejected"));
}

#[tokio::test]
async fn unconfigured_council_is_an_error() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    let err = council_analyze(&state, "anything", None).await.unwrap_err();
    assert_eq!(err.message, "Council not configured");
}

#[tokio::test]
async fn verify_writes_a_council_receipt() {
    let dir = tempdir().unwrap();
    let state = state_with_reviewers(dir.path(), vec![vec!["echo", "approve"]]);

    let payload = json!({
        "goal": "council-checked work",
        "acceptance_criteria": ["done"],
        "run_commands": ["true"],
        "blocked_by": ["none"],
    });
    let reply = handoffs::handoff_task(&state, "alice", "bob", payload, None, false)
        .await
        .unwrap();
    let task_id = reply["taskId"].as_str().unwrap();

    let verified = council_verify(&state, task_id).await.unwrap();
    assert_eq!(verified["verdict"], json!("accepted"));

    let receipts = state.stores.receipts.for_task(task_id).unwrap();
    assert_eq!(receipts.len(), 1);
    assert_eq!(receipts[0].method, VerificationMethod::Council);
    assert_eq!(receipts[0].delegator, "alice");
}

#[tokio::test]
async fn feature_gate_enforced() {
    let dir = tempdir().unwrap();
    let state = test_state(dir.path());
    state.config.write().features.council = false;
    let err = council_history(&state, None).unwrap_err();
    assert_eq!(err.message, "Council not enabled");
}
