// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Persistence primitives shared by every supervisor subsystem: the
//! atomic-file store (component A) and the structured JSONL logger with
//! rotation (component B).

mod atomic_store;
mod jsonl_logger;

pub use atomic_store::{load, load_or_default, save, AtomicStore, StorageError};
pub use jsonl_logger::{JsonlLogger, LoggerError, DEFAULT_MAX_LOG_FILES, DEFAULT_MAX_LOG_SIZE_BYTES};
