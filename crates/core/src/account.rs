// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configured account identities.
//!
//! Accounts are configured (in `config.json`), not stored in the daemon
//! databases. Each account has a companion token file under
//! `tokens/<name>.token` holding the shared secret.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Maximum length of an account name.
pub const MAX_ACCOUNT_NAME_LEN: usize = 63;

/// Errors validating account configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("account name must be 1-{MAX_ACCOUNT_NAME_LEN} characters")]
    NameLength,

    #[error("account name must match [A-Za-z0-9][A-Za-z0-9_-]*: {0}")]
    NameCharset(String),

    #[error("duplicate account name: {0}")]
    Duplicate(String),
}

/// Validate an account name: 1-63 chars, `[A-Za-z0-9][A-Za-z0-9_-]*`.
pub fn validate_account_name(name: &str) -> Result<(), AccountError> {
    if name.is_empty() || name.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(AccountError::NameLength);
    }
    let mut chars = name.chars();
    let valid_first = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid_first || !valid_rest {
        return Err(AccountError::NameCharset(name.to_string()));
    }
    Ok(())
}

/// Provider backing an account (the external coding CLI it runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    ClaudeCode,
    CodexCli,
    Openhands,
    GeminiCli,
    Opencode,
    CursorAgent,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Provider::ClaudeCode => "claude-code",
            Provider::CodexCli => "codex-cli",
            Provider::Openhands => "openhands",
            Provider::GeminiCli => "gemini-cli",
            Provider::Opencode => "opencode",
            Provider::CursorAgent => "cursor-agent",
        };
        write!(f, "{s}")
    }
}

/// Quota policy limiting how much work an account takes on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_tasks: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_task_budget: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A configured account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub provider: Provider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_policy: Option<QuotaPolicy>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Account {
    /// Validate this account entry.
    pub fn validate(&self) -> Result<(), AccountError> {
        validate_account_name(&self.name)
    }
}

#[cfg(test)]
#[path = "account_tests.rs"]
mod tests;
