// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation tracker (§4.8): async-context-bound correlation IDs, scoped
//! operations, and completion timing.
//!
//! The ambient context is carried by a `tokio::task_local`, so nested
//! operations automatically inherit their parent's id unless they start a
//! new scope, and concurrent tasks never see each other's context.

use parking_lot::Mutex;
use rand::Rng;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use vigil_core::{Clock, CorrelationId, LogLevel, LogLine, SystemClock};
use vigil_storage::JsonlLogger;

tokio::task_local! {
    static CURRENT_CONTEXT: OperationContext;
}

#[derive(Debug, Clone)]
struct OperationContext {
    correlation_id: CorrelationId,
    op_type: String,
}

fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..6).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char).collect()
}

pub struct CorrelationTracker<C: Clock = SystemClock> {
    logger: Arc<JsonlLogger>,
    started_at_ms: Mutex<HashMap<CorrelationId, u64>>,
    clock: C,
}

impl CorrelationTracker<SystemClock> {
    pub fn new(logger: Arc<JsonlLogger>) -> Self {
        Self::with_clock(logger, SystemClock)
    }
}

impl<C: Clock> CorrelationTracker<C> {
    pub fn with_clock(logger: Arc<JsonlLogger>, clock: C) -> Self {
        Self {
            logger,
            started_at_ms: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn new_context(&self, op_type: &str) -> OperationContext {
        let now_ms = self.clock.now_ms();
        let correlation_id = CorrelationId::new(format!("{op_type}-{now_ms}-{}", random_suffix()));
        self.started_at_ms.lock().insert(correlation_id.clone(), now_ms);
        OperationContext {
            correlation_id,
            op_type: op_type.to_string(),
        }
    }

    /// Run `f` with a fresh correlation id bound to the current task. Nested
    /// calls to `start_operation`/`start_async_operation` inside `f` push
    /// their own scope; code that doesn't call either inherits this one.
    pub fn start_operation<F, R>(&self, op_type: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let ctx = self.new_context(op_type);
        CURRENT_CONTEXT.sync_scope(ctx, f)
    }

    pub async fn start_async_operation<F, Fut, R>(&self, op_type: &str, f: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        let ctx = self.new_context(op_type);
        CURRENT_CONTEXT.scope(ctx, f()).await
    }

    /// The ambient correlation id, or `None` outside any operation's scope.
    pub fn current_correlation_id() -> Option<CorrelationId> {
        CURRENT_CONTEXT.try_with(|ctx| ctx.correlation_id.clone()).ok()
    }

    fn current_op_type() -> Option<String> {
        CURRENT_CONTEXT.try_with(|ctx| ctx.op_type.clone()).ok()
    }

    /// Log completion with elapsed duration, and drop the start-time entry.
    pub fn end_operation(&self, id: &CorrelationId, success: bool) {
        let now_ms = self.clock.now_ms();
        let started = self.started_at_ms.lock().remove(id);
        let elapsed_ms = started.map(|s| now_ms.saturating_sub(s)).unwrap_or(0);
        let op_type = Self::current_op_type().unwrap_or_else(|| "unknown".to_string());
        let level = if success { LogLevel::Info } else { LogLevel::Warn };
        self.log(
            Some(id.clone()),
            level,
            &format!("operation {} after {elapsed_ms}ms: {op_type}", if success { "completed" } else { "failed" }),
            Some(serde_json::json!({"durationMs": elapsed_ms, "success": success})),
        );
    }

    /// Write a log line through the structured logger. `id = None` looks up
    /// the ambient context instead of requiring the caller to thread it.
    pub fn log(&self, id: Option<CorrelationId>, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
        let correlation_id = id.or_else(Self::current_correlation_id).map(|c| c.as_str().to_string());
        let line = LogLine {
            correlation_id,
            timestamp: self.clock.now_iso8601(),
            level,
            message: message.to_string(),
            data,
        };
        if let Err(e) = self.logger.append(&line) {
            tracing::warn!(error = %e, "failed to append correlation log line");
        }
    }
}

#[cfg(test)]
#[path = "correlation_tracker_tests.rs"]
mod tests;
