// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection authentication.
//!
//! The presented token is compared against `tokens/<account>.token`.
//! Both sides are hashed before comparison so the check runs in constant
//! time regardless of where the strings differ.

use crate::engine::HandlerError;
use crate::lifecycle::HubState;
use agentctl_core::account::validate_account_name;
use sha2::{Digest, Sha256};

/// Compare a presented token against the stored secret, constant-time.
pub fn verify_token(presented: &str, stored: &[u8]) -> bool {
    // Token files may carry a trailing newline; the secret does not
    let stored = trim_ascii_end(stored);
    let presented_digest = Sha256::digest(presented.as_bytes());
    let stored_digest = Sha256::digest(stored);
    presented_digest == stored_digest
}

fn trim_ascii_end(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end > 0 && (bytes[end - 1] == b'\n' || bytes[end - 1] == b'\r') {
        end -= 1;
    }
    &bytes[..end]
}

/// Authenticate a handshake frame.
pub fn authenticate(state: &HubState, account: &str, token: &str) -> Result<(), HandlerError> {
    validate_account_name(account)
        .map_err(|_| HandlerError::msg("Authentication failed"))?;

    if state.config.read().account(account).is_none() {
        return Err(HandlerError::msg("Authentication failed"));
    }

    let token_path = state.paths.token_file(account);
    let stored = std::fs::read(&token_path)
        .map_err(|_| HandlerError::msg("Authentication failed"))?;

    if verify_token(token, &stored) {
        Ok(())
    } else {
        Err(HandlerError::msg("Authentication failed"))
    }
}
