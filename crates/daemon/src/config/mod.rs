// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config layer: load, migrate, save and hot-reload `config.json`.
//!
//! Loading is tolerant (missing sub-objects filled, unknown keys kept).
//! Migration backs the file up to `<path>.backup.<version>` before
//! rewriting it with the current schema version.

pub mod watcher;

use agentctl_core::config::{HubConfig, CURRENT_SCHEMA_VERSION};
use agentctl_storage::{backup_versioned, save_json_atomic, StoreError};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid account: {0}")]
    Account(#[from] agentctl_core::account::AccountError),
}

/// Load configuration, filling defaults for a missing file.
pub fn load_config(path: &Path) -> Result<HubConfig, ConfigError> {
    if !path.exists() {
        return Ok(HubConfig::default());
    }
    let raw = std::fs::read_to_string(path)?;
    let config: HubConfig = serde_json::from_str(&raw)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration atomically.
pub fn save_config(path: &Path, config: &HubConfig) -> Result<(), ConfigError> {
    save_json_atomic(path, config)?;
    Ok(())
}

/// Migrate an on-disk config to the current schema version.
///
/// Backs the original up to `<path>.backup.<oldVersion>` first. Returns
/// the old version when a migration ran.
pub fn migrate_config(path: &Path) -> Result<Option<u32>, ConfigError> {
    let mut config = load_config(path)?;
    if !path.exists() || config.schema_version >= CURRENT_SCHEMA_VERSION {
        return Ok(None);
    }

    let old_version = config.schema_version;
    backup_versioned(path, old_version)?;
    config.schema_version = CURRENT_SCHEMA_VERSION;
    save_config(path, &config)?;
    info!(
        from = old_version,
        to = CURRENT_SCHEMA_VERSION,
        path = %path.display(),
        "migrated config schema"
    );
    Ok(Some(old_version))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
