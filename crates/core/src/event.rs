// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed lifecycle events carried on the in-process event bus.
//!
//! The kind set is closed. Bus dispatch is synchronous on the emitter;
//! subscribers are isolated from each other's failures.

use crate::handoff::HandoffPayload;
use crate::receipt::VerificationMethod;
use crate::task::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of event kinds for subscriber registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    TaskCreated,
    TaskAssigned,
    TaskStarted,
    CheckpointReached,
    TaskCompleted,
    TaskVerified,
    ProgressUpdate,
    DelegationChain,
    TrustUpdate,
    SlaWarning,
    SlaBreach,
    Reassignment,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::TaskCreated => "TASK_CREATED",
            EventKind::TaskAssigned => "TASK_ASSIGNED",
            EventKind::TaskStarted => "TASK_STARTED",
            EventKind::CheckpointReached => "CHECKPOINT_REACHED",
            EventKind::TaskCompleted => "TASK_COMPLETED",
            EventKind::TaskVerified => "TASK_VERIFIED",
            EventKind::ProgressUpdate => "PROGRESS_UPDATE",
            EventKind::DelegationChain => "DELEGATION_CHAIN",
            EventKind::TrustUpdate => "TRUST_UPDATE",
            EventKind::SlaWarning => "SLA_WARNING",
            EventKind::SlaBreach => "SLA_BREACH",
            EventKind::Reassignment => "REASSIGNMENT",
        };
        write!(f, "{s}")
    }
}

/// Result carried on `TASK_COMPLETED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskResult {
    Success,
    Failure,
}

/// Events that cross component boundaries inside the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HubEvent {
    #[serde(rename = "TASK_CREATED")]
    TaskCreated {
        task_id: TaskId,
        from: String,
        assignee: String,
        title: String,
        /// Enriched characteristics from the handoff payload
        payload: Box<HandoffPayload>,
    },

    #[serde(rename = "TASK_ASSIGNED")]
    TaskAssigned {
        task_id: TaskId,
        delegator: String,
        delegatee: String,
        reason: String,
    },

    #[serde(rename = "TASK_STARTED")]
    TaskStarted { task_id: TaskId, account: String },

    #[serde(rename = "CHECKPOINT_REACHED")]
    CheckpointReached { task_id: TaskId, account: String, percent: u8 },

    #[serde(rename = "TASK_COMPLETED")]
    TaskCompleted {
        task_id: TaskId,
        account: String,
        result: TaskResult,
    },

    #[serde(rename = "TASK_VERIFIED")]
    TaskVerified {
        task_id: TaskId,
        account: String,
        passed: bool,
        method: VerificationMethod,
    },

    #[serde(rename = "PROGRESS_UPDATE")]
    ProgressUpdate {
        task_id: TaskId,
        account: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    #[serde(rename = "DELEGATION_CHAIN")]
    DelegationChain {
        /// `[from, to]`, extended with the parent handoff when present
        chain: Vec<String>,
        depth: u32,
        max_depth: u32,
        blocked: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_handoff_id: Option<String>,
    },

    #[serde(rename = "TRUST_UPDATE")]
    TrustUpdate {
        account: String,
        old_score: i64,
        new_score: i64,
    },

    #[serde(rename = "SLA_WARNING")]
    SlaWarning {
        task_id: TaskId,
        assignee: String,
        action: String,
        reason: String,
    },

    #[serde(rename = "SLA_BREACH")]
    SlaBreach {
        task_id: TaskId,
        assignee: String,
        action: String,
        reason: String,
    },

    #[serde(rename = "REASSIGNMENT")]
    Reassignment {
        task_id: TaskId,
        from: String,
        to: String,
        reason: String,
    },
}

impl HubEvent {
    /// The kind tag used for subscriber registration.
    pub fn kind(&self) -> EventKind {
        match self {
            HubEvent::TaskCreated { .. } => EventKind::TaskCreated,
            HubEvent::TaskAssigned { .. } => EventKind::TaskAssigned,
            HubEvent::TaskStarted { .. } => EventKind::TaskStarted,
            HubEvent::CheckpointReached { .. } => EventKind::CheckpointReached,
            HubEvent::TaskCompleted { .. } => EventKind::TaskCompleted,
            HubEvent::TaskVerified { .. } => EventKind::TaskVerified,
            HubEvent::ProgressUpdate { .. } => EventKind::ProgressUpdate,
            HubEvent::DelegationChain { .. } => EventKind::DelegationChain,
            HubEvent::TrustUpdate { .. } => EventKind::TrustUpdate,
            HubEvent::SlaWarning { .. } => EventKind::SlaWarning,
            HubEvent::SlaBreach { .. } => EventKind::SlaBreach,
            HubEvent::Reassignment { .. } => EventKind::Reassignment,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
