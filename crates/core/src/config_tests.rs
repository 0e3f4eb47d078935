// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn empty_object_fills_defaults() {
    let config: HubConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.schema_version, 0);
    assert!(config.accounts.is_empty());
    assert!(!config.features.auto_acceptance);
    assert_eq!(config.max_delegation_depth(), DEFAULT_MAX_DELEGATION_DEPTH);
}

#[test]
fn unknown_keys_preserved() {
    let raw = json!({
        "schemaVersion": 3,
        "accounts": [],
        "futureThing": {"a": 1},
    });
    let config: HubConfig = serde_json::from_value(raw.clone()).unwrap();
    let round = serde_json::to_value(&config).unwrap();
    assert_eq!(round["futureThing"], raw["futureThing"]);
}

#[test]
fn depth_precedence_delegation_block_wins() {
    let config: HubConfig = serde_json::from_value(json!({
        "defaults": {"maxDelegationDepth": 5},
        "delegationDepth": {"maxDepth": 2},
    }))
    .unwrap();
    assert_eq!(config.max_delegation_depth(), 2);
}

#[test]
fn depth_falls_back_to_defaults_block() {
    let config: HubConfig = serde_json::from_value(json!({
        "defaults": {"maxDelegationDepth": 5},
    }))
    .unwrap();
    assert_eq!(config.max_delegation_depth(), 5);
}

#[test]
fn duplicate_account_names_rejected() {
    let config: HubConfig = serde_json::from_value(json!({
        "accounts": [
            {"name": "alice", "provider": "claude-code"},
            {"name": "alice", "provider": "codex-cli"},
        ],
    }))
    .unwrap();
    assert_eq!(
        config.validate(),
        Err(crate::account::AccountError::Duplicate("alice".to_string()))
    );
}

#[test]
fn feature_flags_parse_camel_case() {
    let config: HubConfig = serde_json::from_value(json!({
        "features": {"autoAcceptance": true, "workspaceWorktree": true, "circuitBreaker": true},
    }))
    .unwrap();
    assert!(config.features.auto_acceptance);
    assert!(config.features.workspace_worktree);
    assert!(config.features.circuit_breaker);
    assert!(!config.features.council);
}

#[test]
fn save_load_round_trip_is_equal() {
    let config: HubConfig = serde_json::from_value(json!({
        "schemaVersion": 3,
        "accounts": [{"name": "alice", "provider": "claude-code", "color": "cyan"}],
        "entire": {"autoEnable": true},
        "features": {"slaEngine": true},
        "defaults": {"launchInNewWindow": true},
    }))
    .unwrap();
    let text = serde_json::to_string(&config).unwrap();
    let back: HubConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}
