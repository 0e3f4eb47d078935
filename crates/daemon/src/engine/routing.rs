// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignee suggestion: score configured accounts for a set of required
//! skills and rank them.

use agentctl_core::capability::{score_candidate, CapabilityRecord, ScoreBreakdown};
use agentctl_core::trust::TrustRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Workload modifier: points subtracted per open task.
const WORKLOAD_POINTS_PER_TASK: f64 = 5.0;

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub account: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    /// Informational only; does not affect the ranking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<i64>,
}

/// Input per candidate account.
pub struct Candidate {
    pub account: String,
    pub record: CapabilityRecord,
    pub trust: Option<TrustRecord>,
}

/// Rank candidates for the required skills.
///
/// Sorted by score descending, ties broken by account name ascending.
/// When a workload map is supplied, a modifier is subtracted before
/// sorting.
pub fn suggest(
    candidates: Vec<Candidate>,
    required_skills: &[String],
    exclude: &[String],
    workload: Option<&HashMap<String, u32>>,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .into_iter()
        .filter(|c| !exclude.contains(&c.account))
        .map(|candidate| {
            let penalty = workload
                .and_then(|map| map.get(&candidate.account))
                .map(|&open| f64::from(open) * WORKLOAD_POINTS_PER_TASK)
                .unwrap_or(0.0);
            let breakdown = score_candidate(&candidate.record, required_skills, now, penalty);
            Suggestion {
                account: candidate.account,
                score: breakdown.total,
                trust_score: candidate.trust.map(|t| t.score),
                breakdown,
            }
        })
        .collect();

    suggestions.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.account.cmp(&b.account))
    });
    suggestions
}

#[cfg(test)]
#[path = "routing_tests.rs"]
mod tests;
