// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor and agent state (§3).
//!
//! `SupervisorState` is owned and mutated exclusively by the supervisor.
//! `AgentState` is opaque business data owned by the child; the supervisor
//! only reads `phase` for metrics and passes the rest through unexamined.

use crate::phase::AgentPhase;
use serde::{Deserialize, Serialize};

/// Persistent supervisor bookkeeping. Created at first start, mutated only
/// by the supervisor, persisted on every transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupervisorState {
    pub agent_pid: Option<u32>,
    pub start_time_ms: u64,
    pub restart_count: u32,
    pub last_restart_at: Option<String>,
    /// Cumulative count of context clears (not restarts).
    #[serde(default)]
    pub context_clear_count: u32,
    /// Cumulative bets matched, preserved across context clears.
    #[serde(default)]
    pub cumulative_bets_matched: u64,
    /// Cumulative realized P&L in integer hundredths-of-a-cent, preserved
    /// across context clears. Stored as a fixed-point integer rather than a
    /// float so totals are exact under repeated addition.
    #[serde(default)]
    pub cumulative_pnl_hundredths: i64,
}

impl Default for SupervisorState {
    fn default() -> Self {
        Self {
            agent_pid: None,
            start_time_ms: 0,
            restart_count: 0,
            last_restart_at: None,
            context_clear_count: 0,
            cumulative_bets_matched: 0,
            cumulative_pnl_hundredths: 0,
        }
    }
}

/// Opaque agent/business state. Everything except `phase` is passed through
/// untouched; corruption on load falls back to [`AgentState::default`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentState {
    #[serde(default)]
    pub agent_address: Option<String>,
    #[serde(default)]
    pub total_capital: Option<f64>,
    #[serde(default)]
    pub current_balance: Option<f64>,
    #[serde(default)]
    pub matched_bets: Vec<MatchedBet>,
    #[serde(default)]
    pub last_research_at: Option<String>,
    #[serde(default)]
    pub research_job_id: Option<String>,
    #[serde(default)]
    pub phase: AgentPhase,
}

impl Default for AgentState {
    fn default() -> Self {
        Self {
            agent_address: None,
            total_capital: None,
            current_balance: None,
            matched_bets: Vec::new(),
            last_research_at: None,
            research_job_id: None,
            phase: AgentPhase::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedBet {
    pub bet_id: String,
    pub pnl: f64,
    pub timestamp: String,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
