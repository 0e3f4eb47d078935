// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration schema for `config.json`.
//!
//! Loading is tolerant: missing sub-objects are filled with defaults and
//! unknown keys are preserved through a save/load round trip. File I/O,
//! migration and hot-reload live in the daemon's config layer.

use crate::account::{Account, AccountError, QuotaPolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Built-in delegation-depth ceiling when no configuration supplies one.
pub const DEFAULT_MAX_DELEGATION_DEPTH: u32 = 3;

/// Feature flags (closed set, all optional booleans).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub workspace_worktree: bool,
    #[serde(default)]
    pub auto_acceptance: bool,
    #[serde(default)]
    pub capability_routing: bool,
    #[serde(default)]
    pub sla_engine: bool,
    #[serde(default)]
    pub github_integration: bool,
    #[serde(default)]
    pub review_bundles: bool,
    #[serde(default)]
    pub knowledge_index: bool,
    #[serde(default)]
    pub reliability: bool,
    #[serde(default)]
    pub workflow: bool,
    #[serde(default)]
    pub retro: bool,
    #[serde(default)]
    pub sessions: bool,
    #[serde(default)]
    pub trust: bool,
    #[serde(default)]
    pub council: bool,
    #[serde(default)]
    pub circuit_breaker: bool,
    #[serde(default)]
    pub cognitive_friction: bool,
    #[serde(default)]
    pub entire_monitoring: bool,
}

/// `entire` integration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntireConfig {
    #[serde(default)]
    pub auto_enable: bool,
}

/// Desktop notification settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// GitHub integration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One council reviewer: a command invoked with the prompt on stdin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilReviewer {
    pub name: String,
    /// argv; never a shell string
    pub command: Vec<String>,
}

/// Council orchestration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouncilConfig {
    #[serde(default)]
    pub reviewers: Vec<CouncilReviewer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Daemon-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    #[serde(default)]
    pub launch_in_new_window: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_policy: Option<QuotaPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delegation_depth: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Delegation-depth block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationDepthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
}

/// Root configuration object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub entire: EntireConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub council: Option<CouncilConfig>,
    #[serde(default)]
    pub features: Features,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub delegation_depth: DelegationDepthConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            accounts: Vec::new(),
            entire: EntireConfig::default(),
            notifications: None,
            github: None,
            council: None,
            features: Features::default(),
            defaults: Defaults::default(),
            delegation_depth: DelegationDepthConfig::default(),
            extra: Map::new(),
        }
    }
}

impl HubConfig {
    /// Effective delegation-depth maximum from the config file alone
    /// (`delegationDepth.maxDepth` > `defaults.maxDelegationDepth` > built-in).
    pub fn max_delegation_depth(&self) -> u32 {
        self.delegation_depth
            .max_depth
            .or(self.defaults.max_delegation_depth)
            .unwrap_or(DEFAULT_MAX_DELEGATION_DEPTH)
    }

    /// Find a configured account by name.
    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.name == name)
    }

    /// Validate all accounts: names well-formed and unique.
    pub fn validate(&self) -> Result<(), AccountError> {
        let mut seen = std::collections::HashSet::new();
        for account in &self.accounts {
            account.validate()?;
            if !seen.insert(account.name.as_str()) {
                return Err(AccountError::Duplicate(account.name.clone()));
            }
        }
        Ok(())
    }

    /// Canonical serialisation used by the watcher to detect real changes.
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
