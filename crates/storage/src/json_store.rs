// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON file persistence for small entities.
//!
//! Writes go to a `.tmp` sibling, are fsynced, then renamed over the
//! target so a crash mid-save never corrupts the file. Schema upgrades
//! leave a timestamped backup beside the original.

use crate::db::StoreError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Load a JSON file, defaulting when absent.
///
/// A corrupt file is moved aside to `.bak` and treated as absent rather
/// than taking the daemon down.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    match serde_json::from_reader(reader) {
        Ok(value) => Ok(value),
        Err(e) => {
            let bak = path.with_extension("bak");
            warn!(
                error = %e,
                path = %path.display(),
                "corrupt JSON store, moving to .bak and starting fresh",
            );
            fs::rename(path, &bak)?;
            Ok(T::default())
        }
    }
}

/// Save atomically: write to `.tmp`, fsync, rename over the target.
pub fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Copy the current file to `<path>.backup.<version>` before a schema upgrade.
pub fn backup_versioned(path: &Path, version: u32) -> Result<Option<PathBuf>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = PathBuf::from(format!("{}.backup.{version}", path.display()));
    fs::copy(path, &backup)?;
    Ok(Some(backup))
}

/// A small JSON-file-backed store holding one value of type `T`.
///
/// All mutation goes through [`JsonFileStore::update`], which persists
/// atomically before returning.
pub struct JsonFileStore<T> {
    path: PathBuf,
    value: Mutex<T>,
}

impl<T: Serialize + DeserializeOwned + Default + Clone> JsonFileStore<T> {
    /// Open the store, creating the file with the default value if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let value: T = load_json(&path)?;
        if !path.exists() {
            save_json_atomic(&path, &value)?;
        }
        Ok(Self {
            path,
            value: Mutex::new(value),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A clone of the current value.
    pub fn read(&self) -> T {
        self.value.lock().clone()
    }

    /// Mutate the value and persist; the in-memory copy only changes if
    /// the write succeeds.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, StoreError> {
        let mut guard = self.value.lock();
        let mut next = guard.clone();
        let result = f(&mut next);
        save_json_atomic(&self.path, &next)?;
        *guard = next;
        Ok(result)
    }
}

/// Store for review bundles: one JSON file per task under `review-bundles/`.
pub struct ReviewBundleStore {
    dir: PathBuf,
}

impl ReviewBundleStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a task id; rejects ids that could escape the directory.
    fn bundle_path(&self, task_id: &str) -> Result<PathBuf, StoreError> {
        let safe = !task_id.is_empty()
            && task_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(StoreError::Conflict(format!(
                "unsafe task id for bundle file: {task_id}"
            )));
        }
        Ok(self.dir.join(format!("{task_id}.json")))
    }

    pub fn save(&self, task_id: &str, bundle: &serde_json::Value) -> Result<(), StoreError> {
        let path = self.bundle_path(task_id)?;
        save_json_atomic(&path, bundle)
    }

    pub fn load(&self, task_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.bundle_path(task_id)?;
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }
}

/// Timestamp helper for backup names shown in logs.
pub fn backup_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

#[cfg(test)]
#[path = "json_store_tests.rs"]
mod tests;
