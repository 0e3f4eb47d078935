// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! agentctl-wire: IPC protocol for daemon communication.
//!
//! Wire format: newline-delimited JSON frames (UTF-8, max 4 MiB).
//! This crate is consumed by the daemon and by per-account bridge
//! processes; it defines the closed request set and response envelope.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod request;
mod response;

pub use framing::{
    encode_frame, read_frame, write_frame, FrameDecoder, FramingError, MAX_FRAME_SIZE,
};
pub use request::{
    decode_request, peek_request_id, Envelope, HandoffContext, Request, RequestError,
};
pub use response::Response;

#[cfg(test)]
mod property_tests;
