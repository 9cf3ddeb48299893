// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-learning store (§4.9): windowed pattern detector and adaptation
//! emitter.

use chrono::{DateTime, Timelike, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vigil_core::{
    Clock, FailureContext, FailurePattern, FailureRecord, PatternType, Recommendation, SupervisorObserver, SystemClock,
};
use vigil_storage::AtomicStore;

pub const DEFAULT_MAX_HISTORY: usize = 1000;
pub const DEFAULT_PATTERN_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

const API_TIMEOUT_THRESHOLD: usize = 5;
const TERMINAL_OVERLOAD_THRESHOLD: usize = 3;
const RPC_CONGESTION_THRESHOLD: usize = 5;
const SEGMENT_SIZE_OVERLOAD_FLOOR: u64 = 5000;
const MAX_TERMINAL_COUNT: u32 = 10;
const TERMINAL_COUNT_STEP: u32 = 2;

/// Mutable knobs an adaptation is allowed to touch. Owned by the caller
/// (the supervisor); `apply_adaptations` mutates it in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdaptiveConfig {
    pub peak_hours_to_avoid: Vec<u32>,
    pub terminal_count: u32,
    pub prefer_secondary_rpc: bool,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            peak_hours_to_avoid: Vec::new(),
            terminal_count: 1,
            prefer_secondary_rpc: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdaptationResult {
    pub adapted: bool,
    pub adaptation: PatternType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct FailureStoreFile {
    records: Vec<FailureRecord>,
    adaptations_applied: HashSet<PatternType>,
}

pub struct FailureStore<C: Clock = SystemClock> {
    store: AtomicStore<FailureStoreFile>,
    records: Mutex<Vec<FailureRecord>>,
    adaptations_applied: Mutex<HashSet<PatternType>>,
    max_history: usize,
    window_ms: u64,
    observer: Arc<dyn SupervisorObserver>,
    clock: C,
}

impl FailureStore<SystemClock> {
    pub fn new(path: impl Into<std::path::PathBuf>, observer: Arc<dyn SupervisorObserver>) -> Self {
        Self::with_clock(path, observer, DEFAULT_MAX_HISTORY, DEFAULT_PATTERN_WINDOW_MS, SystemClock)
    }
}

impl<C: Clock> FailureStore<C> {
    pub fn with_clock(
        path: impl Into<std::path::PathBuf>,
        observer: Arc<dyn SupervisorObserver>,
        max_history: usize,
        window_ms: u64,
        clock: C,
    ) -> Self {
        let store: AtomicStore<FailureStoreFile> = AtomicStore::new(path);
        let file = store.load();
        Self {
            store,
            records: Mutex::new(file.records),
            adaptations_applied: Mutex::new(file.adaptations_applied),
            max_history,
            window_ms,
            observer,
            clock,
        }
    }

    pub fn record(&self, phase: impl Into<String>, error_type: impl Into<String>, error_message: impl Into<String>, context: FailureContext) {
        let mut records = self.records.lock();
        records.push(FailureRecord {
            timestamp_ms: self.clock.now_ms(),
            phase: phase.into(),
            error_type: error_type.into(),
            error_message: error_message.into(),
            context,
            resolution: None,
        });
        while records.len() > self.max_history {
            records.remove(0);
        }
        self.persist(&records);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn windowed(&self) -> Vec<FailureRecord> {
        let now_ms = self.clock.now_ms();
        let window_start = now_ms.saturating_sub(self.window_ms);
        self.records.lock().iter().filter(|r| r.timestamp_ms >= window_start).cloned().collect()
    }

    #[allow(clippy::unwrap_used)]
    fn hour_of_day(timestamp_ms: u64) -> u32 {
        // the Unix epoch itself is always a valid timestamp
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
            .unwrap_or_else(|| DateTime::<Utc>::from_timestamp(0, 0).unwrap())
            .hour()
    }

    /// Detect the patterns described in §4.9 over the last `window_ms`.
    pub fn detect_patterns(&self) -> Vec<FailurePattern> {
        let records = self.windowed();
        let mut patterns = Vec::new();

        if let Some(p) = self.detect_api_timeout_peak_hours(&records) {
            patterns.push(p);
        }
        if let Some(p) = self.detect_terminal_overload(&records) {
            patterns.push(p);
        }
        if let Some(p) = self.detect_rpc_congestion(&records) {
            patterns.push(p);
        }
        patterns
    }

    fn detect_api_timeout_peak_hours(&self, records: &[FailureRecord]) -> Option<FailurePattern> {
        let matching: Vec<&FailureRecord> = records
            .iter()
            .filter(|r| {
                r.error_message.to_lowercase().contains("timeout") || matches!(r.error_type.as_str(), "TIMEOUT" | "API_TIMEOUT")
            })
            .collect();
        if matching.len() < API_TIMEOUT_THRESHOLD {
            return None;
        }

        let mut by_hour: HashMap<u32, usize> = HashMap::new();
        for r in &matching {
            *by_hour.entry(Self::hour_of_day(r.timestamp_ms)).or_insert(0) += 1;
        }
        let mut peak_hours: Vec<u32> = by_hour.iter().filter(|(_, &n)| n >= API_TIMEOUT_THRESHOLD).map(|(&h, _)| h).collect();
        peak_hours.sort_unstable();
        if peak_hours.is_empty() {
            return None;
        }

        Some(FailurePattern {
            pattern_type: PatternType::ApiTimeoutPeakHours,
            description: format!("API timeouts cluster in hours {peak_hours:?}"),
            occurrences: matching.len(),
            recommendation: Recommendation::AvoidPeakHours,
            metadata: serde_json::json!({"peakHours": peak_hours}),
        })
    }

    fn detect_terminal_overload(&self, records: &[FailureRecord]) -> Option<FailurePattern> {
        let matching: Vec<&FailureRecord> = records
            .iter()
            .filter(|r| {
                r.phase == "research"
                    && (matches!(r.error_type.as_str(), "CRASH" | "OOM") || r.error_message.to_lowercase().contains("crash"))
                    && r.context.segment_size.is_some_and(|s| s > SEGMENT_SIZE_OVERLOAD_FLOOR)
            })
            .collect();
        if matching.len() < TERMINAL_OVERLOAD_THRESHOLD {
            return None;
        }

        let sizes: Vec<u64> = matching.iter().filter_map(|r| r.context.segment_size).collect();
        let avg = sizes.iter().sum::<u64>() as f64 / sizes.len() as f64;

        Some(FailurePattern {
            pattern_type: PatternType::TerminalOverload,
            description: "research terminals crashing under oversized segments".to_string(),
            occurrences: matching.len(),
            recommendation: Recommendation::IncreaseTerminalCount,
            metadata: serde_json::json!({"averageSegmentSize": avg}),
        })
    }

    fn detect_rpc_congestion(&self, records: &[FailureRecord]) -> Option<FailurePattern> {
        let matching: Vec<&FailureRecord> = records
            .iter()
            .filter(|r| r.error_type == "RPC_ERROR" || r.error_message.to_lowercase().contains("rpc"))
            .collect();
        if matching.len() < RPC_CONGESTION_THRESHOLD {
            return None;
        }

        Some(FailurePattern {
            pattern_type: PatternType::RpcCongestion,
            description: "RPC errors exceeding the congestion threshold".to_string(),
            occurrences: matching.len(),
            recommendation: Recommendation::SwitchRpc,
            metadata: serde_json::json!({}),
        })
    }

    /// Apply every not-yet-applied pattern's adaptation to `config`,
    /// reporting each through the observer. Idempotent: re-running with the
    /// same patterns produces `adapted: false` entries.
    pub fn apply_adaptations(&self, config: &mut AdaptiveConfig) -> Vec<AdaptationResult> {
        let patterns = self.detect_patterns();
        let mut applied = self.adaptations_applied.lock();
        let mut results = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            if applied.contains(&pattern.pattern_type) {
                results.push(AdaptationResult {
                    adapted: false,
                    adaptation: pattern.pattern_type,
                    description: "already applied".to_string(),
                });
                continue;
            }

            let description = match pattern.recommendation {
                Recommendation::AvoidPeakHours => {
                    if let Some(hours) = pattern.metadata.get("peakHours").and_then(|v| v.as_array()) {
                        config.peak_hours_to_avoid = hours.iter().filter_map(|h| h.as_u64()).map(|h| h as u32).collect();
                    }
                    format!("now avoiding hours {:?}", config.peak_hours_to_avoid)
                }
                Recommendation::IncreaseTerminalCount => {
                    config.terminal_count = (config.terminal_count + TERMINAL_COUNT_STEP).min(MAX_TERMINAL_COUNT);
                    format!("terminal count increased to {}", config.terminal_count)
                }
                Recommendation::SwitchRpc => {
                    config.prefer_secondary_rpc = true;
                    "switched to secondary RPC endpoint".to_string()
                }
                Recommendation::ReduceSegmentSize | Recommendation::None => pattern.description.clone(),
            };

            applied.insert(pattern.pattern_type);
            self.observer.on_adaptation(&format!("{:?}", pattern.pattern_type), &description);
            results.push(AdaptationResult {
                adapted: true,
                adaptation: pattern.pattern_type,
                description,
            });
        }

        self.persist_adaptations(&applied);
        results
    }

    /// Clear the applied-adaptations set so the same pattern can re-fire.
    pub fn reset_adaptations(&self) {
        let mut applied = self.adaptations_applied.lock();
        applied.clear();
        self.persist_adaptations(&applied);
    }

    fn persist(&self, records: &[FailureRecord]) {
        let file = FailureStoreFile {
            records: records.to_vec(),
            adaptations_applied: self.adaptations_applied.lock().clone(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist failure history");
        }
    }

    fn persist_adaptations(&self, applied: &HashSet<PatternType>) {
        let file = FailureStoreFile {
            records: self.records.lock().clone(),
            adaptations_applied: applied.clone(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist failure history");
        }
    }
}

#[cfg(test)]
#[path = "failure_store_tests.rs"]
mod tests;
