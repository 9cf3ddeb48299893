// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-side crash log (§3, §4.15): a bounded, persisted ring of
//! [`CrashRecord`]s used to decide the "too many restarts" pause.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vigil_core::{BoundedHistory, Clock, CrashReason, CrashRecord, SystemClock};
use vigil_storage::AtomicStore;

const MAX_RECORDS: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CrashLogFile {
    records: Vec<CrashRecord>,
}

pub struct CrashLog<C: Clock = SystemClock> {
    store: AtomicStore<CrashLogFile>,
    records: Mutex<BoundedHistory<CrashRecord>>,
    clock: C,
}

impl CrashLog<SystemClock> {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> CrashLog<C> {
    pub fn with_clock(path: impl Into<std::path::PathBuf>, clock: C) -> Self {
        let store: AtomicStore<CrashLogFile> = AtomicStore::new(path);
        let file = store.load();
        let mut history = BoundedHistory::new(MAX_RECORDS);
        for record in file.records {
            history.push(record);
        }
        Self {
            store,
            records: Mutex::new(history),
            clock,
        }
    }

    pub fn record(&self, reason: CrashReason, previous_pid: Option<u32>, new_pid: Option<u32>) {
        let record = CrashRecord {
            timestamp_ms: self.clock.now_ms(),
            reason,
            previous_pid,
            new_pid,
        };
        let mut records = self.records.lock();
        records.push(record);
        self.persist(&records);
    }

    /// Count of crashes recorded within the last `window_ms`.
    pub fn count_within(&self, window_ms: u64) -> usize {
        let now_ms = self.clock.now_ms();
        let cutoff = now_ms.saturating_sub(window_ms);
        self.records.lock().iter().filter(|r| r.timestamp_ms >= cutoff).count()
    }

    fn persist(&self, records: &BoundedHistory<CrashRecord>) {
        let file = CrashLogFile {
            records: records.iter().cloned().collect(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist crash log");
        }
    }
}

#[cfg(test)]
#[path = "crash_log_tests.rs"]
mod tests;
