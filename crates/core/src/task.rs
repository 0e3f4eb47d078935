// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and its lifecycle state machine.
//!
//! A task is created from a handoff message (the message id is the task id)
//! and moves through: todo → in_progress → ready_for_review →
//! accepted | rejected, with rejected → in_progress allowing rework.
//! Every transition appends a `status_changed` event to the task's log.

use crate::message::MessageId;
use crate::time_fmt::serde_iso_millis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a task. Equal to the creating handoff's message id.
    pub struct TaskId;
}

impl From<MessageId> for TaskId {
    fn from(id: MessageId) -> Self {
        TaskId(id.0)
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    ReadyForReview,
    Accepted,
    Rejected,
}

impl TaskStatus {
    /// Whether a transition from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Todo, InProgress)
                | (InProgress, ReadyForReview)
                | (ReadyForReview, Accepted)
                | (ReadyForReview, Rejected)
                | (Rejected, InProgress)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::ReadyForReview => "ready_for_review",
            TaskStatus::Accepted => "accepted",
            TaskStatus::Rejected => "rejected",
        }
    }

    /// Parse a wire-format status string.
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "ready_for_review" => Some(TaskStatus::ReadyForReview),
            "accepted" => Some(TaskStatus::Accepted),
            "rejected" => Some(TaskStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of entry in a task's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    StatusChanged,
    Progress,
}

/// An entry in a task's append-only event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    #[serde(rename = "type")]
    pub kind: TaskEventKind,
    #[serde(with = "serde_iso_millis")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
}

/// Workspace attached to a task when it reaches review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceContext {
    pub workspace_path: PathBuf,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
}

/// A typed link from one task to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLink {
    pub to: TaskId,
    pub relation: String,
    #[serde(with = "serde_iso_millis")]
    pub linked_at: DateTime<Utc>,
}

/// Task lifecycle errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("rejection requires a reason")]
    MissingReason,
}

/// The persistent record created from a handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub assignee: String,
    #[serde(rename = "createdAt", with = "serde_iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub events: Vec<TaskEvent>,
    #[serde(
        default,
        rename = "workspaceContext",
        skip_serializing_if = "Option::is_none"
    )]
    pub workspace_context: Option<WorkspaceContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<TaskLink>,
}

impl Task {
    /// Create a fresh task from a handoff.
    pub fn new(id: TaskId, title: impl Into<String>, assignee: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            status: TaskStatus::Todo,
            assignee: assignee.into(),
            created_at: now,
            events: Vec::new(),
            workspace_context: None,
            priority: None,
            links: Vec::new(),
        }
    }

    /// Apply a status transition, appending a `status_changed` event.
    ///
    /// Rejections require a non-empty reason. Workspace context, once set,
    /// is not overwritten.
    pub fn transition(
        &mut self,
        next: TaskStatus,
        reason: Option<String>,
        workspace: Option<WorkspaceContext>,
        now: DateTime<Utc>,
    ) -> Result<(), TaskError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        if next == TaskStatus::Rejected && reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
            return Err(TaskError::MissingReason);
        }
        if next == TaskStatus::ReadyForReview && self.workspace_context.is_none() {
            self.workspace_context = workspace;
        }
        let from = self.status;
        self.status = next;
        self.events.push(TaskEvent {
            kind: TaskEventKind::StatusChanged,
            timestamp: now,
            from: Some(from),
            to: Some(next),
            reason,
            percent: None,
        });
        Ok(())
    }

    /// Record a progress report on the event log.
    pub fn record_progress(&mut self, percent: Option<u8>, note: Option<String>, now: DateTime<Utc>) {
        self.events.push(TaskEvent {
            kind: TaskEventKind::Progress,
            timestamp: now,
            from: None,
            to: None,
            reason: note,
            percent,
        });
    }

    /// Timestamp of the most recent progress report, if any.
    pub fn last_progress_at(&self) -> Option<DateTime<Utc>> {
        self.events
            .iter()
            .rev()
            .find(|e| e.kind == TaskEventKind::Progress)
            .map(|e| e.timestamp)
    }

    /// Timestamp the task entered its current status.
    pub fn status_changed_at(&self) -> DateTime<Utc> {
        self.events
            .iter()
            .rev()
            .find(|e| e.kind == TaskEventKind::StatusChanged)
            .map(|e| e.timestamp)
            .unwrap_or(self.created_at)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
