// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cognitive-friction gate in front of auto-acceptance.
//!
//! Tasks whose payload marks them critical, irreversible, or subjective
//! must not be judged by exit codes alone; the gate blocks the runner
//! and sends them back to human review.

use agentctl_core::handoff::{HandoffPayload, Level, Reversibility, Verifiability};
use serde::Serialize;

/// Outcome of the friction check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrictionCheck {
    pub blocked: bool,
    /// "none", "medium" or "high"
    pub friction_level: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

/// Evaluate a handoff payload for auto-acceptance eligibility.
pub fn check(payload: &HandoffPayload) -> FrictionCheck {
    let mut reasons = Vec::new();
    let mut high = false;

    if payload.criticality == Some(Level::Critical) {
        reasons.push("criticality is critical".to_string());
        high = true;
    }
    if payload.reversibility == Some(Reversibility::Irreversible) {
        reasons.push("work is irreversible".to_string());
        high = true;
    }
    if payload.verifiability == Some(Verifiability::Subjective) {
        reasons.push("acceptance is subjective, exit codes cannot judge it".to_string());
    }

    let blocked = !reasons.is_empty();
    FrictionCheck {
        blocked,
        friction_level: if high {
            "high"
        } else if blocked {
            "medium"
        } else {
            "none"
        },
        reasons,
    }
}

#[cfg(test)]
#[path = "friction_tests.rs"]
mod tests;
