// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle tracker & context-clear (§4.13): counts the child's turn
//! markers from stdout and watches the agent directory's signal files to
//! decide when a context clear is due.

use parking_lot::Mutex;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use vigil_core::{Clock, MatchedBet, SystemClock};

pub const DEFAULT_MAX_MESSAGES: u32 = 50;
pub const DEFAULT_CLEAR_COOLDOWN_MS: u64 = 60_000;
pub const DEFAULT_MAX_RUNTIME_MS: u64 = 4 * 60 * 60 * 1000;

pub const HEARTBEAT_FILE: &str = "heartbeat.txt";
pub const CLEAR_CONTEXT_FILE: &str = "CLEAR_CONTEXT";
pub const IN_PROGRESS_TX_FILE: &str = "IN_PROGRESS_TX";
pub const MATCHED_BET_FILE: &str = "MATCHED_BET";

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
fn message_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)tool_use|tool_result|assistant|human|\[TOOL").expect("static pattern is valid"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    MessageCountAndCooldown,
    MaxRuntimeExceeded,
    SignalFile,
}

/// Heartbeat age read straight off the file's mtime (§4.14 step 1); the
/// watchdog trusts this exclusively, never the child's own clock.
pub fn heartbeat_age(agent_dir: &Path) -> Option<Duration> {
    let metadata = std::fs::metadata(agent_dir.join(HEARTBEAT_FILE)).ok()?;
    metadata.modified().ok()?.elapsed().ok()
}

pub struct LifecycleTracker<C: Clock = SystemClock> {
    agent_dir: PathBuf,
    message_count: Mutex<u32>,
    session_started_ms: Mutex<u64>,
    last_clear_ms: Mutex<u64>,
    max_messages: u32,
    clear_cooldown_ms: u64,
    max_runtime_ms: u64,
    clock: C,
}

impl LifecycleTracker<SystemClock> {
    pub fn new(agent_dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(agent_dir, DEFAULT_MAX_MESSAGES, DEFAULT_CLEAR_COOLDOWN_MS, DEFAULT_MAX_RUNTIME_MS, SystemClock)
    }
}

impl<C: Clock> LifecycleTracker<C> {
    pub fn with_clock(agent_dir: impl Into<PathBuf>, max_messages: u32, clear_cooldown_ms: u64, max_runtime_ms: u64, clock: C) -> Self {
        let now = clock.now_ms();
        Self {
            agent_dir: agent_dir.into(),
            message_count: Mutex::new(0),
            session_started_ms: Mutex::new(now),
            last_clear_ms: Mutex::new(now),
            max_messages,
            clear_cooldown_ms,
            max_runtime_ms,
            clock,
        }
    }

    /// Feed one line of the child's stdout; counts it as a message when it
    /// matches the turn-marker pattern.
    pub fn observe_line(&self, line: &str) {
        if message_pattern().is_match(line) {
            *self.message_count.lock() += 1;
        }
    }

    pub fn message_count(&self) -> u32 {
        *self.message_count.lock()
    }

    fn signal_path(&self, name: &str) -> PathBuf {
        self.agent_dir.join(name)
    }

    /// Guarantees an outstanding transaction is never aborted mid-flight.
    pub fn transaction_in_progress(&self) -> bool {
        self.signal_path(IN_PROGRESS_TX_FILE).exists()
    }

    /// Evaluate the three trigger conditions, deferring entirely while a
    /// transaction is in flight.
    pub fn should_clear(&self) -> Option<ClearReason> {
        if self.transaction_in_progress() {
            return None;
        }
        if self.signal_path(CLEAR_CONTEXT_FILE).exists() {
            return Some(ClearReason::SignalFile);
        }

        let now = self.clock.now_ms();
        let elapsed_since_clear = now.saturating_sub(*self.last_clear_ms.lock());
        if self.message_count() >= self.max_messages && elapsed_since_clear >= self.clear_cooldown_ms {
            return Some(ClearReason::MessageCountAndCooldown);
        }

        let runtime = now.saturating_sub(*self.session_started_ms.lock());
        if runtime >= self.max_runtime_ms {
            return Some(ClearReason::MaxRuntimeExceeded);
        }

        None
    }

    /// Reset the session counters a clear does not carry across: message
    /// count and runtime. Cumulative bet/P&L totals live in `SupervisorState`
    /// and are untouched here.
    pub fn record_clear(&self) {
        let now = self.clock.now_ms();
        *self.message_count.lock() = 0;
        *self.session_started_ms.lock() = now;
        *self.last_clear_ms.lock() = now;
        let _ = std::fs::remove_file(self.signal_path(CLEAR_CONTEXT_FILE));
    }

    /// Poll the `MATCHED_BET` signal file; if present, parse its
    /// `key: value` body and delete it.
    pub fn poll_matched_bet(&self) -> Option<MatchedBet> {
        let path = self.signal_path(MATCHED_BET_FILE);
        let body = std::fs::read_to_string(&path).ok()?;
        let _ = std::fs::remove_file(&path);
        parse_matched_bet(&body)
    }
}

fn parse_matched_bet(body: &str) -> Option<MatchedBet> {
    let mut bet_id = None;
    let mut pnl = None;
    let mut timestamp = None;
    for line in body.lines() {
        let Some((key, value)) = line.split_once(':') else { continue };
        match key.trim() {
            "betId" => bet_id = Some(value.trim().to_string()),
            "pnl" => pnl = value.trim().parse::<f64>().ok(),
            "timestamp" => timestamp = Some(value.trim().to_string()),
            _ => {}
        }
    }
    Some(MatchedBet {
        bet_id: bet_id?,
        pnl: pnl?,
        timestamp: timestamp?,
    })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
