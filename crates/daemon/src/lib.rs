// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! vigil-daemon: the process that owns the supervised child (component O)
//! and the independent watchdog that owns the supervisor in turn
//! (component N).
//!
//! This crate wires together every subsystem built in the other workspace
//! crates; it adds only the pieces that don't belong anywhere else: startup
//! configuration, the crash log, the concrete diagnostic inputs, and the
//! HTTP health/metrics surface.

pub mod config;
pub mod crash_log;
pub mod diagnostic_inputs;
pub mod health;
pub mod http;
pub mod logging;
pub mod metrics;
pub mod supervisor;
pub mod watchdog;

pub use config::{Config, ConfigError};
pub use crash_log::CrashLog;
pub use diagnostic_inputs::AgentDiagnosticInputs;
pub use supervisor::{Supervisor, TracingObserver};
pub use watchdog::{Watchdog, WatchdogState};
