// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task / handoff engine and its supporting coordinators.
//!
//! Handlers stay thin; the semantics of handoffs, task lifecycle,
//! auto-acceptance, routing, SLA scanning and live sessions live here.

pub mod acceptance;
pub mod context;
pub mod friction;
pub mod handoffs;
pub mod routing;
pub mod sessions;
pub mod sla;
pub mod tasks;
pub mod workflow;
pub mod workspace;

use serde_json::{Map, Value};

/// Error surfaced to the wire as `{type:"error", error, ...details}`.
#[derive(Debug)]
pub struct HandlerError {
    pub message: String,
    pub details: Map<String, Value>,
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::msg(format!("Not found: {what}"))
    }

    pub fn feature_disabled(feature: &str) -> Self {
        Self::msg(format!("{feature} not enabled"))
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<agentctl_storage::StoreError> for HandlerError {
    fn from(e: agentctl_storage::StoreError) -> Self {
        use agentctl_storage::StoreError;
        match e {
            StoreError::NotFound(what) => Self::msg(format!("Not found: {what}")),
            StoreError::Task(e) => Self::msg(e.to_string()),
            StoreError::Conflict(what) => Self::msg(what),
            other => Self::msg(other.to_string()),
        }
    }
}

impl From<agentctl_core::task::TaskError> for HandlerError {
    fn from(e: agentctl_core::task::TaskError) -> Self {
        Self::msg(e.to_string())
    }
}

/// Result alias used by every handler.
pub type HandlerResult = Result<Value, HandlerError>;
