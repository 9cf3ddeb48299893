// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic-file store (§4.1).
//!
//! `save` writes to `{path}.tmp` then renames over the target, so a crash
//! mid-write never leaves a half-written file in place. `load` never raises
//! to callers: any I/O or parse error yields the caller-supplied default and
//! is reported through `tracing` as a `STATE_CORRUPT` condition (§7).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize `value` to `path` via write-temp-then-rename.
///
/// No locking is provided; callers ensure single-writer discipline.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(path);
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

/// Load `path`, returning `default` on any I/O error, missing file, or
/// parse failure. Never raises.
pub fn load<T: DeserializeOwned>(path: &Path, default: T) -> T {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "STATE_CORRUPT: falling back to default");
                default
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => default,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "STATE_CORRUPT: falling back to default");
            default
        }
    }
}

/// Convenience for `T: Default`.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    load(path, T::default())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) => path.with_extension(format!("{}.tmp", ext.to_string_lossy())),
        None => path.with_extension("tmp"),
    }
}

/// A typed handle bound to one path, for components that own a single
/// persisted value (supervisor state, idempotency cache, DLQ, ...).
#[derive(Debug, Clone)]
pub struct AtomicStore<T> {
    path: PathBuf,
    _marker: std::marker::PhantomData<T>,
}

impl<T> AtomicStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: std::marker::PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> T {
        load_or_default(&self.path)
    }

    pub fn save(&self, value: &T) -> Result<(), StorageError> {
        save(&self.path, value)
    }
}

#[cfg(test)]
#[path = "atomic_store_tests.rs"]
mod tests;
