// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the one piece of external I/O the supervisor owns: the
//! child process (§6, §4.13, §4.14, §4.15).

pub mod child;
pub mod lifecycle;
pub mod subprocess;

pub use child::{is_alive, terminate, ChildAdapter, ChildAdapterError, ChildHandle, ChildSpawnConfig, TokioChildAdapter, FORCE_KILL_WAIT, GRACEFUL_STOP_WAIT};
pub use lifecycle::{
    heartbeat_age, ClearReason, LifecycleTracker, CLEAR_CONTEXT_FILE, DEFAULT_CLEAR_COOLDOWN_MS, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_RUNTIME_MS,
    HEARTBEAT_FILE, IN_PROGRESS_TX_FILE, MATCHED_BET_FILE,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use child::FakeChildAdapter;
