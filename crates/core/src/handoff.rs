// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff payloads and delegation-depth checking.
//!
//! A handoff is a message whose content is a JSON-encoded [`HandoffPayload`].
//! The required fields describe the delegated work; the optional enriched
//! characteristics feed routing, SLA tracking and the cognitive-friction
//! gate in front of auto-acceptance.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel value in `blocked_by` meaning "no blockers".
pub const BLOCKED_BY_NONE: &str = "none";

/// Enriched characteristic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
    Critical,
}

/// How a task outcome can be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verifiability {
    AutoTestable,
    NeedsReview,
    Subjective,
}

/// Whether a task's effects can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reversibility {
    Reversible,
    Partial,
    Irreversible,
}

/// Structured content of a handoff message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffPayload {
    pub goal: String,
    pub acceptance_criteria: Vec<String>,
    pub run_commands: Vec<String>,
    /// `["none"]` means no blockers
    pub blocked_by: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifiability: Option<Verifiability>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversibility: Option<Reversibility>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration_minutes: Option<u64>,
    /// How many times this work has already been re-delegated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_depth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_handoff_id: Option<String>,

    /// Collected project context (branch, commits, diff), attached by the daemon
    #[serde(
        default,
        rename = "autoContext",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_context: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl HandoffPayload {
    /// Parse a payload from a JSON value, collecting field-level problems.
    ///
    /// Enum fields out of their permitted sets surface as a parse problem;
    /// required fields present but empty surface as validation problems.
    pub fn from_value(value: Value) -> Result<Self, Vec<String>> {
        let payload: HandoffPayload =
            serde_json::from_value(value).map_err(|e| vec![e.to_string()])?;
        let problems = payload.validate();
        if problems.is_empty() {
            Ok(payload)
        } else {
            Err(problems)
        }
    }

    /// Validate required fields, returning one problem per violation.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.goal.trim().is_empty() {
            problems.push("goal must be non-empty".to_string());
        }
        if self.acceptance_criteria.is_empty() {
            problems.push("acceptance_criteria must be a non-empty list".to_string());
        }
        if self.run_commands.is_empty() {
            problems.push("run_commands must be a non-empty list".to_string());
        }
        if self.blocked_by.is_empty() {
            problems.push(format!(
                "blocked_by must be a non-empty list (use [\"{BLOCKED_BY_NONE}\"] for no blockers)"
            ));
        }
        problems
    }

    /// Whether this handoff has real blockers (anything other than `["none"]`).
    pub fn is_blocked(&self) -> bool {
        !self
            .blocked_by
            .iter()
            .all(|b| b.eq_ignore_ascii_case(BLOCKED_BY_NONE))
    }

    /// Effective delegation depth (default 0).
    pub fn depth(&self) -> u32 {
        self.delegation_depth.unwrap_or(0)
    }
}

/// Result of a delegation-depth check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthCheck {
    pub allowed: bool,
    pub current_depth: u32,
    pub max_depth: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub requires_reauthorization: bool,
}

/// Check a handoff's delegation depth against the effective maximum.
///
/// - `depth < max - 1`: allowed, no warning.
/// - `depth == max - 1`: allowed with an "approaching" advisory.
/// - `depth >= max`: blocked; requires reauthorization.
pub fn check_delegation_depth(depth: u32, max_depth: u32) -> DepthCheck {
    if depth >= max_depth {
        DepthCheck {
            allowed: false,
            current_depth: depth,
            max_depth,
            reason: Some(format!(
                "delegation depth {depth} reached the maximum of {max_depth}"
            )),
            requires_reauthorization: true,
        }
    } else if depth + 1 == max_depth {
        DepthCheck {
            allowed: true,
            current_depth: depth,
            max_depth,
            reason: Some("approaching maximum delegation depth".to_string()),
            requires_reauthorization: false,
        }
    } else {
        DepthCheck {
            allowed: true,
            current_depth: depth,
            max_depth,
            reason: None,
            requires_reauthorization: false,
        }
    }
}

#[cfg(test)]
#[path = "handoff_tests.rs"]
mod tests;
