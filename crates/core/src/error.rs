// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced by the supervisor core (§7).
//!
//! Most failures recover locally (storage, logging, alerting, rotation) and
//! never reach this type. What's left is the small set of error kinds that
//! genuinely need to propagate to a caller.

use thiserror::Error;

pub type SupervisorResult<T> = Result<T, SupervisorError>;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// A circuit breaker refused the call outright.
    #[error("circuit '{breaker}' is open")]
    CircuitOpen { breaker: String },

    /// The call reached the dependency, which returned an error.
    #[error("dependency call failed: {0}")]
    DependencyFailure(String),

    /// A task exhausted its retry budget; always paired with a DLQ insert.
    #[error("task '{task_id}' failed after {attempts} attempts: {last_error}")]
    TaskFailed {
        task_id: String,
        attempts: u32,
        last_error: String,
    },

    /// Configuration was missing or invalid; fatal only at startup.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The child process crashed; triggers the restart path. Internal only --
    /// never returned to a subsystem caller, just used to tag the event.
    #[error("child process crashed: {0}")]
    ChildCrash(String),
}

impl SupervisorError {
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, SupervisorError::CircuitOpen { .. })
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
