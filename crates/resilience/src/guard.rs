// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service guard (§4.4): groups one breaker per named dependency, drives
//! the fallback chain, and exposes health snapshots.

use crate::{BreakerConfig, BreakerSnapshot, BreakerState, CircuitBreaker};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use vigil_core::{SupervisorError, SupervisorResult, SystemClock};

/// A named outbound dependency the supervisor talks to.
pub type DependencyName = &'static str;

pub const POLYMARKET_API: DependencyName = "polymarketAPI";
pub const BASE_RPC: DependencyName = "baseRPC";
pub const BACKEND: DependencyName = "backend";

/// Owns one [`CircuitBreaker`] per dependency plus a set of dependencies
/// currently forced to prefer their fallback (§4.10, §4.11 callbacks).
pub struct ServiceGuard {
    breakers: HashMap<DependencyName, CircuitBreaker<SystemClock>>,
    fallback_preferred: Mutex<HashSet<DependencyName>>,
}

impl ServiceGuard {
    pub fn new(config: BreakerConfig) -> Self {
        let mut breakers = HashMap::new();
        for name in [POLYMARKET_API, BASE_RPC, BACKEND] {
            breakers.insert(name, CircuitBreaker::new(name, config.clone()));
        }
        Self {
            breakers,
            fallback_preferred: Mutex::new(HashSet::new()),
        }
    }

    pub fn breaker(&self, name: DependencyName) -> Option<&CircuitBreaker<SystemClock>> {
        self.breakers.get(name)
    }

    /// Mark dependencies to prefer their fallback chain even while CLOSED.
    /// Called by the self-diagnostic engine (J) and synthetic prober (K).
    pub fn enable_fallbacks(&self, names: &[DependencyName]) {
        let mut preferred = self.fallback_preferred.lock();
        for name in names {
            preferred.insert(name);
        }
    }

    pub fn disable_fallbacks(&self, names: &[DependencyName]) {
        let mut preferred = self.fallback_preferred.lock();
        for name in names {
            preferred.remove(name);
        }
    }

    fn prefers_fallback(&self, name: DependencyName) -> bool {
        self.fallback_preferred.lock().contains(name)
    }

    /// Run `op` through the named dependency's breaker with no fallback:
    /// the breaker's error propagates to the caller.
    pub async fn call<F, Fut, T>(&self, name: DependencyName, op: F) -> SupervisorResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let breaker = self
            .breakers
            .get(name)
            .ok_or_else(|| SupervisorError::ConfigInvalid(format!("unknown dependency '{name}'")))?;
        breaker.execute(op).await
    }

    /// Run `op` through the named dependency's breaker. The fallback value
    /// is returned instead of `op`'s result when the dependency is forced
    /// to prefer its fallback, the breaker is OPEN, or `op` itself fails.
    pub async fn call_with_fallback<F, Fut, T, FB, FutFb>(
        &self,
        name: DependencyName,
        op: F,
        fallback: FB,
    ) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
        FB: FnOnce() -> FutFb,
        FutFb: Future<Output = T>,
    {
        let Some(breaker) = self.breakers.get(name) else {
            return fallback().await;
        };

        if self.prefers_fallback(name) || breaker.state() == BreakerState::Open {
            return fallback().await;
        }
        match breaker.execute(op).await {
            Ok(value) => value,
            Err(_) => fallback().await,
        }
    }

    pub fn get_circuit_breaker_states(&self) -> HashMap<DependencyName, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|(name, breaker)| (*name, breaker.snapshot()))
            .collect()
    }

    /// Healthy iff the breaker for that dependency is not OPEN.
    pub fn get_service_health(&self) -> HashMap<DependencyName, bool> {
        self.breakers
            .iter()
            .map(|(name, breaker)| (*name, breaker.state() != BreakerState::Open))
            .collect()
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
