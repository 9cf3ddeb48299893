// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-engine: the stateful subsystems that sit between the supervisor
//! and the outside world -- idempotency, dead-lettering, the task queue,
//! and correlation tracking (components E, F, G, H).

mod correlation_tracker;
mod dead_letter;
mod idempotency;
mod task_queue;

pub use correlation_tracker::CorrelationTracker;
pub use dead_letter::{DeadLetterQueue, DEFAULT_REVIEW_INTERVAL_MS};
pub use idempotency::{IdempotencyCache, IdempotentOutcome, DEFAULT_TTL_MS};
pub use task_queue::{FailOutcome, RecoveryPolicy, TaskCounts, TaskQueue};
