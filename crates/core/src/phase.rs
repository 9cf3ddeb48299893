// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The one field of agent state the supervisor actually interprets.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentPhase {
    Idle,
    Research,
    Evaluating,
    Executing,
}

impl AgentPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, AgentPhase::Idle)
    }
}

impl Default for AgentPhase {
    fn default() -> Self {
        AgentPhase::Idle
    }
}

impl fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentPhase::Idle => "idle",
            AgentPhase::Research => "research",
            AgentPhase::Evaluating => "evaluating",
            AgentPhase::Executing => "executing",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
