// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter entity and weekly review analysis (§3, §4.6).

use crate::task::{TaskId, TaskPayload, TaskType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadLetter {
    pub id: TaskId,
    pub task_type: TaskType,
    pub attempts: u32,
    pub payload: TaskPayload,
    /// Errors in attempt order.
    pub errors: Vec<String>,
    pub first_attempt_ms: u64,
    pub last_attempt_ms: u64,
}

/// Coarse error classification derived by matching the last error message.
/// Used only to bucket dead letters for the weekly review; it does not
/// change retry behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Timeout,
    ConnectionRefused,
    InsufficientFunds,
    ContractRevert,
    RateLimited,
    Unknown,
}

impl ErrorCategory {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("timeout") {
            ErrorCategory::Timeout
        } else if lower.contains("connection_refused") || lower.contains("connection refused") {
            ErrorCategory::ConnectionRefused
        } else if lower.contains("insufficient_funds") || lower.contains("insufficient funds") {
            ErrorCategory::InsufficientFunds
        } else if lower.contains("contract_revert") || lower.contains("revert") {
            ErrorCategory::ContractRevert
        } else if lower.contains("rate_limited") || lower.contains("rate limited") || lower.contains("429") {
            ErrorCategory::RateLimited
        } else {
            ErrorCategory::Unknown
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReviewAnalysis {
    pub total: usize,
    pub by_task_type: HashMap<String, usize>,
    pub by_error_category: HashMap<String, usize>,
    pub oldest_timestamp_ms: Option<u64>,
}

#[cfg(test)]
#[path = "dead_letter_tests.rs"]
mod tests;
