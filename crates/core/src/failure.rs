// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-history entities consumed by the learning store (§3, §4.9).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Strictly-typed fields the pattern detector actually reasons about, plus
/// an opaque `extra` map for logging-only context that doesn't warrant a
/// first-class field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FailureContext {
    #[serde(default)]
    pub segment_size: Option<u64>,
    #[serde(default)]
    pub rpc_endpoint: Option<String>,
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureRecord {
    pub timestamp_ms: u64,
    pub phase: String,
    pub error_type: String,
    pub error_message: String,
    #[serde(default)]
    pub context: FailureContext,
    #[serde(default)]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    ApiTimeoutPeakHours,
    TerminalOverload,
    RpcCongestion,
    RepeatedAuthFailures,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    AvoidPeakHours,
    IncreaseTerminalCount,
    ReduceSegmentSize,
    SwitchRpc,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailurePattern {
    pub pattern_type: PatternType,
    pub description: String,
    pub occurrences: usize,
    pub recommendation: Recommendation,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
#[path = "failure_tests.rs"]
mod tests;
