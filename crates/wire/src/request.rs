// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request envelope: the closed set of request types accepted by the daemon.
//!
//! Every frame has a `type` tag and an optional opaque `requestId` that is
//! echoed on the correlated response. Unknown `type` values are a
//! validation error ("Invalid message"), never an unchecked dispatch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Context accompanying a handoff: where the work lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// Request from a bridge to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Handshake; must be the first frame on a connection
    Auth { account: String, token: String },

    /// Health check ping (allowed before auth)
    Ping,

    // -- messaging --
    SendMessage {
        to: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<HashMap<String, String>>,
    },

    ReadMessages {
        #[serde(default, rename = "unreadOnly")]
        unread_only: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<u32>,
    },

    CountUnread,

    ListAccounts,

    ArchiveMessages {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        days: Option<u32>,
    },

    // -- handoff --
    HandoffTask {
        to: String,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<HandoffContext>,
    },

    HandoffAccept {
        #[serde(rename = "handoffId")]
        handoff_id: String,
    },

    SuggestAssignee {
        #[serde(default)]
        skills: Vec<String>,
        #[serde(default, rename = "excludeAccounts")]
        exclude_accounts: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
        /// Optional account -> open-task-count map; subtracted as a modifier
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workload: Option<HashMap<String, u32>>,
    },

    ReauthorizeDelegation {
        to: String,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<HandoffContext>,
    },

    // -- tasks --
    UpdateTaskStatus {
        #[serde(rename = "taskId")]
        task_id: String,
        #[serde(rename = "newStatus")]
        new_status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        #[serde(default, rename = "workspacePath", skip_serializing_if = "Option::is_none")]
        workspace_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
        #[serde(default, rename = "workspaceId", skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,
    },

    ReportProgress {
        #[serde(rename = "taskId")]
        task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        percent: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    AdaptiveSlaCheck,

    GetTrust {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
    },

    CheckCircuitBreaker { account: String },

    ReinstateAgent { account: String },

    // -- workspace --
    PrepareWorktreeForHandoff {
        #[serde(rename = "repoPath")]
        repo_path: PathBuf,
        branch: String,
        #[serde(rename = "handoffId")]
        handoff_id: String,
    },

    GetWorkspaceStatus {
        #[serde(default, rename = "workspaceId", skip_serializing_if = "Option::is_none")]
        workspace_id: Option<String>,
    },

    CleanupWorkspace {
        #[serde(rename = "workspaceId")]
        workspace_id: String,
    },

    // -- live sessions --
    ShareSession {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace: Option<String>,
    },

    JoinSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    SessionBroadcast {
        #[serde(rename = "sessionId")]
        session_id: String,
        data: Value,
    },

    SessionStatus {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    SessionHistory {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    LeaveSession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    SessionPing {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    // -- named sessions --
    NameSession {
        #[serde(rename = "sessionId")]
        session_id: String,
        name: String,
    },

    ListSessions,

    SearchSessions {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },

    // -- knowledge --
    SearchKnowledge {
        query: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },

    IndexNote {
        title: String,
        content: String,
        #[serde(default)]
        tags: Vec<String>,
    },

    // -- workflow --
    WorkflowTrigger {
        workflow: String,
        #[serde(default)]
        params: serde_json::Map<String, Value>,
    },

    WorkflowStatus {
        #[serde(rename = "runId")]
        run_id: String,
    },

    WorkflowList,

    WorkflowCancel {
        #[serde(rename = "runId")]
        run_id: String,
    },

    // -- health / misc --
    HealthCheck,

    HealthStatus,

    QueryActivity {
        /// Activity kind filter (e.g. "delegation_chain")
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        account: Option<String>,
        #[serde(default, rename = "workflowRunId", skip_serializing_if = "Option::is_none")]
        workflow_run_id: Option<String>,
        /// ISO-8601 lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        since: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
        /// Full-text search instead of filtered listing
        #[serde(default, skip_serializing_if = "Option::is_none")]
        search: Option<String>,
    },

    ConfigReload,

    SearchCode {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },

    ReplaySession {
        #[serde(rename = "sessionId")]
        session_id: String,
    },

    LinkTask {
        #[serde(rename = "taskId")]
        task_id: String,
        #[serde(rename = "linkedTaskId")]
        linked_task_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relation: Option<String>,
    },

    GetTaskLinks {
        #[serde(rename = "taskId")]
        task_id: String,
    },

    GetReviewBundle {
        #[serde(rename = "taskId")]
        task_id: String,
    },

    GenerateReviewBundle {
        #[serde(rename = "taskId")]
        task_id: String,
    },

    GetAnalytics,

    CouncilAnalyze {
        content: String,
        #[serde(default, rename = "taskId", skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
    },

    CouncilVerify {
        #[serde(rename = "taskId")]
        task_id: String,
    },

    CouncilHistory {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },

    RetroStartSession {
        #[serde(rename = "taskId")]
        task_id: String,
    },

    RetroSubmitReview {
        #[serde(rename = "retroId")]
        retro_id: String,
        content: String,
    },

    RetroSubmitSynthesis {
        #[serde(rename = "retroId")]
        retro_id: String,
        content: String,
    },

    RetroStatus {
        #[serde(rename = "retroId")]
        retro_id: String,
    },

    RetroGetPastLearnings {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
}

/// A decoded frame: the typed request plus its correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub request: Request,
    pub request_id: Option<String>,
}

/// Request decoding errors, worded for the wire.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// Malformed JSON, non-object frame, or unknown `type`
    #[error("Invalid message")]
    Invalid,

    /// A known type with a missing or ill-typed field
    #[error("Invalid field: {0}")]
    InvalidField(String),
}

/// Decode one frame into an [`Envelope`].
pub fn decode_request(bytes: &[u8]) -> Result<Envelope, RequestError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|_| RequestError::Invalid)?;
    let obj = value.as_object().ok_or(RequestError::Invalid)?;
    if !obj.get("type").is_some_and(Value::is_string) {
        return Err(RequestError::Invalid);
    }
    let request_id = obj
        .get("requestId")
        .and_then(Value::as_str)
        .map(str::to_string);

    let request = Request::deserialize(&value).map_err(|e| classify(&e.to_string()))?;
    Ok(Envelope {
        request,
        request_id,
    })
}

/// Best-effort `requestId` extraction for frames that failed to decode,
/// so even error replies stay correlated.
pub fn peek_request_id(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("requestId")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Map a serde error message onto the wire error taxonomy.
///
/// serde reports unknown tags as `unknown variant ...` and missing fields
/// as ``missing field `name```; everything else (type mismatches) names the
/// offending value, so fall back to the generic wording.
fn classify(message: &str) -> RequestError {
    if message.starts_with("unknown variant") {
        return RequestError::Invalid;
    }
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some(end) = rest.find('`') {
            return RequestError::InvalidField(rest[..end].to_string());
        }
    }
    RequestError::Invalid
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
