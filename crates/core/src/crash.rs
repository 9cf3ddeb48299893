// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash records appended to a bounded, window-trimmed ring (§3).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrashReason {
    HeartbeatStale,
    ProcessDead,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrashRecord {
    pub timestamp_ms: u64,
    pub reason: CrashReason,
    pub previous_pid: Option<u32>,
    pub new_pid: Option<u32>,
}

#[cfg(test)]
#[path = "crash_tests.rs"]
mod tests;
