// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelope from daemon to bridge.
//!
//! Every correlated request receives either a `result` (payload flattened
//! into the envelope) or an `error`. `requestId` is echoed when supplied.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Handshake accepted
    AuthOk,

    /// Reply to `ping`
    Pong {
        #[serde(
            default,
            rename = "requestId",
            skip_serializing_if = "Option::is_none"
        )]
        request_id: Option<String>,
    },

    /// Successful request; handler payload is flattened into the frame
    Result {
        #[serde(flatten)]
        payload: Map<String, Value>,
        #[serde(
            default,
            rename = "requestId",
            skip_serializing_if = "Option::is_none"
        )]
        request_id: Option<String>,
    },

    /// Failed request
    Error {
        error: String,
        /// Structured details (e.g. validation problems, depth checks)
        #[serde(flatten)]
        details: Map<String, Value>,
        #[serde(
            default,
            rename = "requestId",
            skip_serializing_if = "Option::is_none"
        )]
        request_id: Option<String>,
    },
}

impl Response {
    pub fn pong(request_id: Option<String>) -> Self {
        Response::Pong { request_id }
    }

    /// A `result` frame from any serializable payload.
    ///
    /// Non-object payloads are wrapped under a `value` key so the envelope
    /// stays an object.
    pub fn result<T: Serialize>(payload: T, request_id: Option<String>) -> Self {
        let payload = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
            Err(e) => {
                return Response::Error {
                    error: format!("serialization failed: {e}"),
                    details: Map::new(),
                    request_id,
                }
            }
        };
        Response::Result {
            payload,
            request_id,
        }
    }

    /// A bare `error` frame.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        Response::Error {
            error: message.into(),
            details: Map::new(),
            request_id,
        }
    }

    /// An `error` frame with structured detail fields.
    pub fn error_with(
        message: impl Into<String>,
        details: Map<String, Value>,
        request_id: Option<String>,
    ) -> Self {
        Response::Error {
            error: message.into(),
            details,
            request_id,
        }
    }

    /// Attach a correlation id (replacing any present).
    pub fn with_request_id(mut self, id: Option<String>) -> Self {
        match &mut self {
            Response::AuthOk => {}
            Response::Pong { request_id }
            | Response::Result { request_id, .. }
            | Response::Error { request_id, .. } => *request_id = id,
        }
        self
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
