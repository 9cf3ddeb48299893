// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observer interface for lifecycle events raised by subsystems (§9 design
//! notes: replaces the source's ad-hoc `setOnAlert`/`setOnPromptChanged`/
//! `setOnAdaptation` setters with one named-method interface). The
//! supervisor is the only concrete observer in production; tests use
//! [`NoopObserver`] or a recording stand-in.

use crate::task::TaskType;

/// Notified of events other subsystems can't react to synchronously.
/// All methods have no-op default bodies so implementers only override
/// what they care about.
pub trait SupervisorObserver: Send + Sync {
    /// A dead letter of a critical task type (`MATCH_BET`) was inserted.
    /// Must not block the caller (§5); implementations that do I/O should
    /// hand off to a background task themselves.
    fn on_critical_dead_letter(&self, task_id: &str, task_type: TaskType, attempts: u32, last_error: &str) {
        let _ = (task_id, task_type, attempts, last_error);
    }

    /// A new prompt version was written.
    fn on_prompt_changed(&self, version: u32, reason: &str) {
        let _ = (version, reason);
    }

    /// A failure pattern produced a new adaptation.
    fn on_adaptation(&self, pattern_type: &str, description: &str) {
        let _ = (pattern_type, description);
    }

    /// A diagnostic FAIL requested a remediation the observer must act on
    /// (restart, fallback enablement, ...) beyond what ran in-process.
    fn on_remediation(&self, action: &str, detail: &str) {
        let _ = (action, detail);
    }
}

/// An observer that ignores every event. Useful for tests and for
/// subsystems exercised in isolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SupervisorObserver for NoopObserver {}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
