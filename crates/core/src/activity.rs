// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity events: the append-only log consumed by UIs and analytics.

use crate::time_fmt::serde_iso_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed enumeration of activity event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
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
    AccountConnected,
    AccountDisconnected,
    SessionStarted,
    SessionEnded,
    WorkflowStarted,
    WorkflowCompleted,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::TaskCreated => "task_created",
            ActivityKind::TaskAssigned => "task_assigned",
            ActivityKind::TaskStarted => "task_started",
            ActivityKind::CheckpointReached => "checkpoint_reached",
            ActivityKind::TaskCompleted => "task_completed",
            ActivityKind::TaskVerified => "task_verified",
            ActivityKind::ProgressUpdate => "progress_update",
            ActivityKind::DelegationChain => "delegation_chain",
            ActivityKind::TrustUpdate => "trust_update",
            ActivityKind::SlaWarning => "sla_warning",
            ActivityKind::SlaBreach => "sla_breach",
            ActivityKind::Reassignment => "reassignment",
            ActivityKind::AccountConnected => "account_connected",
            ActivityKind::AccountDisconnected => "account_disconnected",
            ActivityKind::SessionStarted => "session_started",
            ActivityKind::SessionEnded => "session_ended",
            ActivityKind::WorkflowStarted => "workflow_started",
            ActivityKind::WorkflowCompleted => "workflow_completed",
        }
    }

    pub fn parse(s: &str) -> Option<ActivityKind> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An activity event about to be inserted (id assigned by the store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl NewActivity {
    pub fn new(kind: ActivityKind, account: impl Into<String>) -> Self {
        Self {
            kind,
            account: account.into(),
            task_id: None,
            workflow_run_id: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn workflow_run(mut self, run_id: impl Into<String>) -> Self {
        self.workflow_run_id = Some(run_id.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Merge a whole map into the metadata.
    pub fn merged(mut self, map: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata.extend(map);
        self
    }
}

/// A stored activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(with = "serde_iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}
