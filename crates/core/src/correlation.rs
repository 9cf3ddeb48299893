// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation ID and structured log line value types (§3, §4.2, §4.8).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// `{opType}-{nowMs}-{6-char-random}`, see `vigil-engine`'s correlation tracker.
    pub struct CorrelationId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogLine {
    pub correlation_id: Option<String>,
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[cfg(test)]
#[path = "correlation_tests.rs"]
mod tests;
