// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Verification receipts: immutable records of how a task outcome was judged.

use crate::task::TaskId;
use crate::time_fmt::serde_iso_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final verdict on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    Rejected,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accepted => "accepted",
            Verdict::Rejected => "rejected",
        }
    }
}

/// How the verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMethod {
    HumanReview,
    AutoAcceptance,
    Council,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::HumanReview => "human-review",
            VerificationMethod::AutoAcceptance => "auto-acceptance",
            VerificationMethod::Council => "council",
        }
    }
}

/// Immutable record of a task outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReceipt {
    pub task_id: TaskId,
    pub delegator: String,
    pub delegatee: String,
    /// Verbatim handoff content at verification time
    pub spec_payload: String,
    pub verdict: Verdict,
    pub method: VerificationMethod,
    #[serde(with = "serde_iso_millis")]
    pub timestamp: DateTime<Utc>,
}
