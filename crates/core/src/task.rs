// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task state machine value type (§3, §4.7).
//!
//! Payloads are a tagged union per task type rather than an untyped map --
//! the one ad-hoc-dictionary spot the design notes call out for locking down.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    pub struct TaskId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    MatchBet,
    SyncState,
    RegisterAgent,
    Research,
    Other,
}

impl TaskType {
    /// MATCH_BET tasks trigger out-of-band alerting when they land in the DLQ.
    pub fn is_critical(&self) -> bool {
        matches!(self, TaskType::MatchBet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// One variant per task type, carrying only the fields that type needs; an
/// `extra` bag is kept for logging-only context that doesn't warrant its own
/// field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    MatchBet {
        bet_id: String,
        market_id: String,
        amount: f64,
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
    SyncState {
        agent_address: String,
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
    RegisterAgent {
        agent_address: String,
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
    Research {
        job_id: String,
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
    Other {
        #[serde(default)]
        extra: HashMap<String, serde_json::Value>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub name: String,
    pub data: serde_json::Value,
    pub recorded_at_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub state: TaskState,
    pub attempts: u32,
    pub max_attempts: u32,
    pub payload: TaskPayload,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub errors: Vec<String>,
    pub first_attempt_ms: u64,
    pub last_attempt_ms: u64,
}

impl Task {
    pub fn new(id: TaskId, task_type: TaskType, payload: TaskPayload, max_attempts: u32, now_ms: u64) -> Self {
        Self {
            id,
            task_type,
            state: TaskState::Pending,
            attempts: 0,
            max_attempts,
            payload,
            checkpoints: Vec::new(),
            errors: Vec::new(),
            first_attempt_ms: now_ms,
            last_attempt_ms: now_ms,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
