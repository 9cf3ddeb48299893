// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency cache (§4.5, §5, §8 property 3): deterministic
//! operation-id -> cached result with TTL and periodic cleanup.
//!
//! Lookup+insert is made atomic with a per-operation-id single-flight
//! lock: a second concurrent caller for the same `(action, params)` either
//! observes the cached result or waits on the first caller's in-flight
//! `op`, never invoking `op` twice.

use parking_lot::Mutex as SyncMutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use vigil_core::{operation_id, Clock, OperationResult, SupervisorError, SupervisorResult, SystemClock};
use vigil_storage::AtomicStore;

pub const DEFAULT_TTL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    entries: HashMap<String, OperationResult>,
}

pub struct IdempotentOutcome<T> {
    pub result: T,
    pub was_cached: bool,
    pub operation_id: String,
}

pub struct IdempotencyCache<C: Clock = SystemClock> {
    store: AtomicStore<CacheFile>,
    entries: SyncMutex<HashMap<String, OperationResult>>,
    locks: SyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    ttl_ms: u64,
    clock: C,
}

impl IdempotencyCache<SystemClock> {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_clock(path, DEFAULT_TTL_MS, SystemClock)
    }
}

impl<C: Clock> IdempotencyCache<C> {
    pub fn with_clock(path: impl Into<std::path::PathBuf>, ttl_ms: u64, clock: C) -> Self {
        let store: AtomicStore<CacheFile> = AtomicStore::new(path);
        let entries = store.load().entries;
        Self {
            store,
            entries: SyncMutex::new(entries),
            locks: SyncMutex::new(HashMap::new()),
            ttl_ms,
            clock,
        }
    }

    fn lock_for(&self, key: &str) -> Arc<AsyncMutex<()>> {
        self.locks
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn cached(&self, key: &str, now_ms: u64) -> Option<OperationResult> {
        let entries = self.entries.lock();
        entries.get(key).filter(|e| now_ms.saturating_sub(e.stored_at_ms) < self.ttl_ms).cloned()
    }

    /// Run `op` exactly once per `(action, params)` within the TTL. Later
    /// calls for the same key return the cached result without invoking `op`.
    pub async fn execute_idempotent<F, Fut, T>(
        &self,
        action: &str,
        params: &serde_json::Value,
        op: F,
    ) -> SupervisorResult<IdempotentOutcome<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
        T: Serialize + DeserializeOwned + Clone,
    {
        let key = operation_id(action, params);
        let single_flight = self.lock_for(&key);
        let _guard = single_flight.lock().await;

        let now_ms = self.clock.now_ms();
        if let Some(cached) = self.cached(&key, now_ms) {
            let result: T = serde_json::from_value(cached.result)
                .map_err(|e| SupervisorError::DependencyFailure(e.to_string()))?;
            return Ok(IdempotentOutcome {
                result,
                was_cached: true,
                operation_id: key,
            });
        }

        let value = op().await.map_err(SupervisorError::DependencyFailure)?;
        let stored = OperationResult {
            operation_id: key.clone(),
            result: serde_json::to_value(&value).map_err(|e| SupervisorError::DependencyFailure(e.to_string()))?,
            stored_at_ms: now_ms,
        };
        {
            let mut entries = self.entries.lock();
            entries.insert(key.clone(), stored);
            self.persist(&entries);
        }

        Ok(IdempotentOutcome {
            result: value,
            was_cached: false,
            operation_id: key,
        })
    }

    /// Drop entries older than the TTL. Run on an hourly timer.
    pub fn cleanup_expired(&self) {
        let now_ms = self.clock.now_ms();
        let ttl_ms = self.ttl_ms;
        let mut entries = self.entries.lock();
        entries.retain(|_, e| now_ms.saturating_sub(e.stored_at_ms) < ttl_ms);
        self.persist(&entries);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, entries: &HashMap<String, OperationResult>) {
        if let Err(e) = self.store.save(&CacheFile {
            entries: entries.clone(),
        }) {
            tracing::warn!(error = %e, "failed to persist idempotency cache");
        }
    }
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
