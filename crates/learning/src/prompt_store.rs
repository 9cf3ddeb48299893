// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt-evolution store (§4.12): versioned prompt with reversible,
//! appended hints. The base prompt prefix is never mutated.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vigil_core::{BoundedHistory, Clock, PromptChanges, PromptVersion, SupervisorObserver, SystemClock};
use vigil_storage::AtomicStore;

pub const MAX_VERSION_HISTORY: usize = 10;
const HINTS_SECTION_HEADER: &str = "## Adaptive Decision Hints";

const LOW_TOOL_SUCCESS_HINTS: &[&str] = &[
    "Re-read the tool's error message before retrying; don't repeat an identical call.",
    "Prefer the smaller, more specific tool when several could answer the same question.",
];
const FAILED_RESEARCH_HINTS: &[&str] = &[
    "If a research terminal has crashed twice on the same segment, split the segment instead of retrying whole.",
    "Abandon a research cycle that has produced no signal after its time budget rather than extending it.",
];
const LOW_WIN_RATE_HINTS: &[&str] = &[
    "Require a stronger edge before entering a position when recent decisions have trended toward losses.",
    "Favor markets with clearer resolution criteria over ambiguous ones.",
];

/// Effectiveness signals the supervisor feeds in each evaluation tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptMetrics {
    pub tool_call_success_rate: f64,
    pub failed_research_cycles: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PromptStoreFile {
    base_content: String,
    versions: Vec<PromptVersion>,
    current_version: u32,
}

pub struct PromptStore<C: Clock = SystemClock> {
    store: AtomicStore<PromptStoreFile>,
    base_content: Mutex<String>,
    versions: Mutex<BoundedHistory<PromptVersion>>,
    current_version: Mutex<u32>,
    observer: Arc<dyn SupervisorObserver>,
    clock: C,
}

impl PromptStore<SystemClock> {
    pub fn new(path: impl Into<std::path::PathBuf>, base_content: impl Into<String>, observer: Arc<dyn SupervisorObserver>) -> Self {
        Self::with_clock(path, base_content, observer, SystemClock)
    }
}

impl<C: Clock> PromptStore<C> {
    pub fn with_clock(path: impl Into<std::path::PathBuf>, base_content: impl Into<String>, observer: Arc<dyn SupervisorObserver>, clock: C) -> Self {
        let store: AtomicStore<PromptStoreFile> = AtomicStore::new(path);
        let mut file = store.load();
        if file.base_content.is_empty() {
            file.base_content = base_content.into();
        }
        if file.versions.is_empty() {
            file.versions.push(PromptVersion {
                version: 1,
                timestamp_ms: clock.now_ms(),
                changes: PromptChanges::default(),
                reason: "initial version".to_string(),
                content: file.base_content.clone(),
            });
            file.current_version = 1;
        }

        let mut versions = BoundedHistory::new(MAX_VERSION_HISTORY);
        for v in file.versions {
            versions.push(v);
        }

        Self {
            store,
            base_content: Mutex::new(file.base_content),
            versions: Mutex::new(versions),
            current_version: Mutex::new(file.current_version),
            observer,
            clock,
        }
    }

    pub fn current_version(&self) -> u32 {
        *self.current_version.lock()
    }

    pub fn current_content(&self) -> String {
        let versions = self.versions.lock();
        let current = *self.current_version.lock();
        versions
            .iter()
            .find(|v| v.version == current)
            .map(|v| v.content.clone())
            .unwrap_or_else(|| self.base_content.lock().clone())
    }

    fn existing_hints(&self, content: &str) -> Vec<String> {
        content
            .split_once(HINTS_SECTION_HEADER)
            .map(|(_, section)| section.lines().filter_map(|l| l.trim().strip_prefix("- ").map(str::to_string)).collect())
            .unwrap_or_default()
    }

    /// Inspect effectiveness signals and append up to 2 hints per triggered
    /// condition, skipping any hint already present.
    pub fn analyze_prompt_effectiveness(&self, metrics: PromptMetrics) -> Option<PromptVersion> {
        let current_content = self.current_content();
        let already = self.existing_hints(&current_content);

        let mut new_hints = Vec::new();
        if metrics.tool_call_success_rate < 0.6 {
            new_hints.extend(LOW_TOOL_SUCCESS_HINTS.iter().filter(|h| !already.iter().any(|a| a == *h)).take(2));
        }
        if metrics.failed_research_cycles > 5 {
            new_hints.extend(FAILED_RESEARCH_HINTS.iter().filter(|h| !already.iter().any(|a| a == *h)).take(2));
        }
        if metrics.win_rate < 0.35 {
            new_hints.extend(LOW_WIN_RATE_HINTS.iter().filter(|h| !already.iter().any(|a| a == *h)).take(2));
        }

        if new_hints.is_empty() {
            return None;
        }

        let mut all_hints = already;
        all_hints.extend(new_hints.iter().map(|h| h.to_string()));

        let content = format!(
            "{}\n\n{HINTS_SECTION_HEADER}\n{}\n",
            self.base_content.lock().trim_end(),
            all_hints.iter().map(|h| format!("- {h}")).collect::<Vec<_>>().join("\n"),
        );

        let changes = PromptChanges {
            additions: new_hints.into_iter().map(str::to_string).collect(),
            ..Default::default()
        };
        Some(self.update_prompt(content, changes, "effectiveness analysis"))
    }

    /// Create a new version, advance `currentVersion`, persist, and notify
    /// the observer.
    pub fn update_prompt(&self, content: impl Into<String>, changes: PromptChanges, reason: impl Into<String>) -> PromptVersion {
        let mut versions = self.versions.lock();
        let next_version = versions.iter().map(|v| v.version).max().unwrap_or(0) + 1;
        let version = PromptVersion {
            version: next_version,
            timestamp_ms: self.clock.now_ms(),
            changes,
            reason: reason.into(),
            content: content.into(),
        };
        versions.push(version.clone());
        *self.current_version.lock() = next_version;
        drop(versions);

        self.persist();
        self.observer.on_prompt_changed(next_version, &version.reason);
        version
    }

    /// Restore a prior version's content as a new current version (the
    /// version counter always advances; history is never rewritten in
    /// place). Defaults to the version before the current one.
    pub fn rollback_prompt(&self, target_version: Option<u32>) -> Option<PromptVersion> {
        let current = *self.current_version.lock();
        let target = target_version.unwrap_or_else(|| current.saturating_sub(1));
        let target_content = self.versions.lock().iter().find(|v| v.version == target).map(|v| v.content.clone())?;

        Some(self.update_prompt(
            target_content,
            PromptChanges::default(),
            format!("rollback to version {target}"),
        ))
    }

    /// Drop every hint, returning the prompt to the base content.
    pub fn reset_to_base(&self) -> PromptVersion {
        let base = self.base_content.lock().clone();
        self.update_prompt(base, PromptChanges::default(), "reset to base")
    }

    fn persist(&self) {
        let file = PromptStoreFile {
            base_content: self.base_content.lock().clone(),
            versions: self.versions.lock().iter().cloned().collect(),
            current_version: *self.current_version.lock(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist prompt evolution history");
        }
    }
}

#[cfg(test)]
#[path = "prompt_store_tests.rs"]
mod tests;
