// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete [`DiagnosticInputs`] backed by the child's log, agent state, and
//! the synthetic prober's last result (§4.10).

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vigil_core::AgentState;
use vigil_learning::DiagnosticInputs;

/// The child is expected to emit one of these markers per tool invocation;
/// anything else in the log is prose and doesn't count toward the ratio.
const TOOL_SUCCESS_MARKER: &str = "[TOOL]";
const TOOL_ERROR_MARKER: &str = "[TOOL_ERROR]";

pub struct AgentDiagnosticInputs {
    agent_dir: PathBuf,
    agent_log_path: PathBuf,
    agent_state: Arc<Mutex<AgentState>>,
    last_probe_healthy: Arc<Mutex<Option<bool>>>,
}

impl AgentDiagnosticInputs {
    pub fn new(
        agent_dir: impl Into<PathBuf>,
        agent_log_path: impl Into<PathBuf>,
        agent_state: Arc<Mutex<AgentState>>,
        last_probe_healthy: Arc<Mutex<Option<bool>>>,
    ) -> Self {
        Self {
            agent_dir: agent_dir.into(),
            agent_log_path: agent_log_path.into(),
            agent_state,
            last_probe_healthy,
        }
    }
}

impl DiagnosticInputs for AgentDiagnosticInputs {
    fn tool_call_counts(&self) -> (u64, u64) {
        let Ok(contents) = std::fs::read_to_string(&self.agent_log_path) else {
            return (0, 0);
        };
        let mut success = 0u64;
        let mut failure = 0u64;
        for line in contents.lines() {
            if line.contains(TOOL_ERROR_MARKER) {
                failure += 1;
            } else if line.contains(TOOL_SUCCESS_MARKER) {
                success += 1;
            }
        }
        (success, failure)
    }

    fn decision_outcomes(&self) -> (u64, u64) {
        let state = self.agent_state.lock();
        let wins = state.matched_bets.iter().filter(|b| b.pnl > 0.0).count() as u64;
        let losses = state.matched_bets.iter().filter(|b| b.pnl <= 0.0).count() as u64;
        (wins, losses)
    }

    fn external_services_healthy(&self) -> Option<bool> {
        *self.last_probe_healthy.lock()
    }

    fn agent_directory(&self) -> &Path {
        &self.agent_dir
    }
}

#[cfg(test)]
#[path = "diagnostic_inputs_tests.rs"]
mod tests;
