// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability records and the assignee-suggestion scoring formula.
//!
//! Candidates are scored over 100 points: 40 for skill match, 30 for
//! historical success, 20 for speed, 10 for recency. An optional workload
//! modifier is subtracted before ranking.

use crate::time_fmt::serde_iso_millis_opt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Skills and derived counters for one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityRecord {
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub accepted: u64,
    #[serde(default)]
    pub total: u64,
    /// Average minutes from handoff to acceptance
    #[serde(default)]
    pub avg_duration_minutes: f64,
    #[serde(default, with = "serde_iso_millis_opt")]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Per-candidate score breakdown returned with suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub skill_match: f64,
    pub success_rate: f64,
    pub speed: f64,
    pub recency: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub workload_penalty: f64,
    pub total: f64,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

/// Score a candidate for a set of required skills.
pub fn score_candidate(
    record: &CapabilityRecord,
    required_skills: &[String],
    now: DateTime<Utc>,
    workload_penalty: f64,
) -> ScoreBreakdown {
    let skill_match = if required_skills.is_empty() {
        40.0
    } else {
        let matched = required_skills
            .iter()
            .filter(|s| record.skills.contains(s.as_str()))
            .count();
        40.0 * matched as f64 / required_skills.len() as f64
    };

    let success_rate = if record.total == 0 {
        15.0
    } else {
        30.0 * record.accepted as f64 / record.total as f64
    };

    let speed = match record.avg_duration_minutes {
        m if m < 5.0 => 20.0,
        m if m < 15.0 => 15.0,
        m if m < 30.0 => 10.0,
        _ => 5.0,
    };

    let recency = match record
        .last_activity
        .map(|t| (now - t).num_minutes())
    {
        Some(m) if m <= 10 => 10.0,
        Some(m) if m <= 30 => 7.0,
        Some(m) if m <= 60 => 4.0,
        _ => 1.0,
    };

    let total = skill_match + success_rate + speed + recency - workload_penalty;
    ScoreBreakdown {
        skill_match,
        success_rate,
        speed,
        recency,
        workload_penalty,
        total,
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
