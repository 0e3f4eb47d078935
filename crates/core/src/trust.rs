// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-account trust scores and their deterministic update rules.
//!
//! Scores are integers in [0, 100]. Each outcome applies a bounded delta:
//! completed work never decreases trust and rejected work never increases
//! it. The counters feed the circuit breaker and routing metadata.

use serde::{Deserialize, Serialize};

/// Score assigned to accounts with no recorded history.
pub const DEFAULT_TRUST_SCORE: i64 = 50;

/// Largest delta any single outcome may apply.
pub const MAX_DELTA: i64 = 10;

const COMPLETED_DELTA: i64 = 5;
const SLA_BONUS: i64 = 2;
const REJECTED_DELTA: i64 = -4;
const AUTO_ACCEPTANCE_FAILED_DELTA: i64 = -8;

/// Consecutive failures before the circuit breaker opens.
const BREAKER_FAILURE_LIMIT: u32 = 3;

/// Trust floor below which the circuit breaker opens.
const BREAKER_SCORE_FLOOR: i64 = 20;

/// Outcome of a task, as seen by the trust engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustOutcome {
    /// Task accepted; `within_sla` marks delivery inside the SLA window
    Completed { within_sla: bool },
    /// Task rejected by the reviewer
    Rejected,
    /// Auto-acceptance ran the task's commands and they failed
    AutoAcceptanceFailed,
}

/// Rolling trust state for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRecord {
    pub score: i64,
    pub completed: u64,
    pub failed: u64,
    pub rejected: u64,
    pub sla_hits: u64,
    pub sla_misses: u64,
    pub consecutive_failures: u32,
}

impl Default for TrustRecord {
    fn default() -> Self {
        Self {
            score: DEFAULT_TRUST_SCORE,
            completed: 0,
            failed: 0,
            rejected: 0,
            sla_hits: 0,
            sla_misses: 0,
            consecutive_failures: 0,
        }
    }
}

impl TrustRecord {
    /// Apply an outcome, returning `(old_score, new_score)`.
    pub fn apply(&mut self, outcome: TrustOutcome) -> (i64, i64) {
        let old = self.score;
        let delta = match outcome {
            TrustOutcome::Completed { within_sla } => {
                self.completed += 1;
                self.consecutive_failures = 0;
                if within_sla {
                    self.sla_hits += 1;
                    COMPLETED_DELTA + SLA_BONUS
                } else {
                    self.sla_misses += 1;
                    COMPLETED_DELTA
                }
            }
            TrustOutcome::Rejected => {
                self.rejected += 1;
                self.consecutive_failures += 1;
                REJECTED_DELTA
            }
            TrustOutcome::AutoAcceptanceFailed => {
                self.failed += 1;
                self.consecutive_failures += 1;
                AUTO_ACCEPTANCE_FAILED_DELTA
            }
        };
        debug_assert!(delta.abs() <= MAX_DELTA);
        self.score = (old + delta).clamp(0, 100);
        (old, self.score)
    }

    /// Whether the circuit breaker is open for this account.
    pub fn breaker_open(&self) -> bool {
        self.consecutive_failures >= BREAKER_FAILURE_LIMIT || self.score < BREAKER_SCORE_FLOOR
    }

    /// Reset the breaker state (reinstate the account).
    pub fn reinstate(&mut self) {
        self.consecutive_failures = 0;
        if self.score < BREAKER_SCORE_FLOOR {
            self.score = BREAKER_SCORE_FLOOR;
        }
    }
}

#[cfg(test)]
#[path = "trust_tests.rs"]
mod tests;
