// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal tracing setup for the daemon's own operational log, distinct
//! from the structured JSONL logger the correlation tracker writes to (§4.2
//! covers that one; this is plain human-readable diagnostic output).

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const MAX_LOG_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_ROTATED_LOGS: u32 = 3;

/// Shift `path.N` -> `path.(N+1)` before tracing-appender opens the live
/// file fresh; same scheme `vigil_storage::JsonlLogger` uses for rotation.
fn rotate_log_if_needed(path: &Path) {
    let Ok(metadata) = std::fs::metadata(path) else { return };
    if metadata.len() < MAX_LOG_SIZE_BYTES {
        return;
    }

    let numbered = |n: u32| -> PathBuf {
        let mut p = path.as_os_str().to_owned();
        p.push(format!(".{n}"));
        PathBuf::from(p)
    };

    let _ = std::fs::remove_file(numbered(MAX_ROTATED_LOGS));
    for n in (1..MAX_ROTATED_LOGS).rev() {
        let src = numbered(n);
        if src.exists() {
            let _ = std::fs::rename(&src, numbered(n + 1));
        }
    }
    let _ = std::fs::rename(path, numbered(1));
}

/// Install a global tracing subscriber writing to `log_path`, honoring
/// `RUST_LOG` for level filtering. Keep the returned guard alive for the
/// life of the process or buffered lines never reach disk.
pub fn init(log_path: &Path) -> std::io::Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    rotate_log_if_needed(log_path);

    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("vigild.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}
