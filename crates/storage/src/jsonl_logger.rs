// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logger (§4.2): append-only JSONL writer with size-based
//! rotation. Rotation errors are swallowed so the producer never fails;
//! levels carry no semantics beyond filtering by consumers.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::warn;
use vigil_core::LogLine;

pub const DEFAULT_MAX_LOG_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MAX_LOG_FILES: u32 = 5;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Single JSONL path writer. Safe to share across tasks via `&JsonlLogger`
/// (internally mutex-protected); one instance should own the path.
pub struct JsonlLogger {
    path: PathBuf,
    max_size_bytes: u64,
    max_files: u32,
    file: Mutex<File>,
}

impl JsonlLogger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LoggerError> {
        Self::with_limits(path, DEFAULT_MAX_LOG_SIZE_BYTES, DEFAULT_MAX_LOG_FILES)
    }

    pub fn with_limits(
        path: impl Into<PathBuf>,
        max_size_bytes: u64,
        max_files: u32,
    ) -> Result<Self, LoggerError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(&path)?;
        Ok(Self {
            path,
            max_size_bytes,
            max_files,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one structured log line, rotating first if the file has
    /// grown past `max_size_bytes`.
    pub fn append(&self, line: &LogLine) -> Result<(), LoggerError> {
        self.rotate_if_needed();

        let mut json = serde_json::to_vec(line)?;
        json.push(b'\n');

        let mut guard = self.file.lock().unwrap_or_else(|p| p.into_inner());
        guard.write_all(&json)?;
        guard.flush()?;
        Ok(())
    }

    fn rotate_if_needed(&self) {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if size < self.max_size_bytes {
            return;
        }
        if let Err(e) = self.rotate() {
            warn!(path = %self.path.display(), error = %e, "log rotation failed, continuing without rotating");
        }
    }

    /// Shift `path.N` -> `path.(N+1)` from `max_files-1` down to 1,
    /// dropping the file that would exceed `max_files`, then move the
    /// live file to `path.1`.
    fn rotate(&self) -> io::Result<()> {
        let numbered = |n: u32| -> PathBuf {
            let mut p = self.path.clone().into_os_string();
            p.push(format!(".{n}"));
            PathBuf::from(p)
        };

        let oldest = numbered(self.max_files);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for n in (1..self.max_files).rev() {
            let src = numbered(n);
            if src.exists() {
                fs::rename(&src, numbered(n + 1))?;
            }
        }

        fs::rename(&self.path, numbered(1))?;

        let mut guard = self.file.lock().unwrap_or_else(|p| p.into_inner());
        *guard = open_append(&self.path)?;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
#[path = "jsonl_logger_tests.rs"]
mod tests;
