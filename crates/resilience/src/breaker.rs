// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker state machine (§4.3, §8 property 2).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::info;
use vigil_core::{Clock, SupervisorError, SupervisorResult, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreakerTotals {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown_ms: u64,
    pub success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown_ms: 30_000,
            success_threshold: 1,
        }
    }
}

struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    last_failure_at: Option<i64>,
    opened_at: Option<i64>,
    half_open_successes: u32,
    totals: BreakerTotals,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            last_failure_at: None,
            opened_at: None,
            half_open_successes: 0,
            totals: BreakerTotals::default(),
        }
    }
}

/// Value-copy snapshot of a breaker, safe to hand out to metrics/health
/// builders without holding the lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<i64>,
    pub opened_at: Option<i64>,
    pub half_open_successes: u32,
    pub totals: BreakerTotals,
}

/// Per-service breaker. In-memory only; recreated fresh on supervisor
/// restart. Mutex-protected so two concurrent `execute` calls serialize
/// (§5 ordering guarantees).
pub struct CircuitBreaker<C: Clock = SystemClock> {
    name: String,
    config: BreakerConfig,
    clock: C,
    inner: Mutex<Inner>,
}

impl CircuitBreaker<SystemClock> {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        Self::with_clock(name, config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    pub fn with_clock(name: impl Into<String>, config: BreakerConfig, clock: C) -> Self {
        Self {
            name: name.into(),
            config,
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.inner.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
            opened_at: inner.opened_at,
            half_open_successes: inner.half_open_successes,
            totals: inner.totals,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Run `op` through the breaker. `op` is only invoked if the breaker
    /// allows the call (CLOSED, HALF_OPEN, or OPEN-with-cooldown-elapsed).
    pub async fn execute<F, Fut, T>(&self, op: F) -> SupervisorResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, String>>,
    {
        let now = self.clock.now_ms() as i64;

        let allowed = {
            let mut inner = self.inner.lock();
            match inner.state {
                BreakerState::Open => {
                    let opened_at = inner.opened_at.unwrap_or(now);
                    if now.saturating_sub(opened_at) as u64 >= self.config.cooldown_ms {
                        inner.state = BreakerState::HalfOpen;
                        inner.half_open_successes = 0;
                        true
                    } else {
                        inner.totals.calls += 1;
                        false
                    }
                }
                BreakerState::Closed | BreakerState::HalfOpen => true,
            }
        };

        if !allowed {
            return Err(SupervisorError::CircuitOpen {
                breaker: self.name.clone(),
            });
        }

        let result = op().await;

        let mut inner = self.inner.lock();
        inner.totals.calls += 1;
        match result {
            Ok(value) => {
                inner.totals.successes += 1;
                inner.consecutive_failures = 0;
                if inner.state == BreakerState::HalfOpen {
                    inner.half_open_successes += 1;
                    if inner.half_open_successes >= self.config.success_threshold {
                        inner.state = BreakerState::Closed;
                        inner.half_open_successes = 0;
                        inner.opened_at = None;
                        info!(breaker = %self.name, "circuit closed");
                    }
                }
                Ok(value)
            }
            Err(e) => {
                inner.totals.failures += 1;
                inner.last_failure_at = Some(now);
                match inner.state {
                    BreakerState::HalfOpen => {
                        inner.state = BreakerState::Open;
                        inner.half_open_successes = 0;
                        inner.opened_at = Some(now);
                        info!(breaker = %self.name, "circuit reopened from half-open probe failure");
                    }
                    BreakerState::Closed => {
                        inner.consecutive_failures += 1;
                        if inner.consecutive_failures >= self.config.failure_threshold {
                            inner.state = BreakerState::Open;
                            inner.opened_at = Some(now);
                            info!(breaker = %self.name, "circuit opened");
                        }
                    }
                    BreakerState::Open => {}
                }
                Err(SupervisorError::DependencyFailure(e))
            }
        }
    }

    pub fn force_open(&self) {
        let now = self.clock.now_ms() as i64;
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Open;
        inner.opened_at = Some(now);
        info!(breaker = %self.name, "circuit force-opened");
    }

    pub fn force_close(&self) {
        let mut inner = self.inner.lock();
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
        inner.half_open_successes = 0;
        inner.opened_at = None;
        info!(breaker = %self.name, "circuit force-closed");
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::default();
        info!(breaker = %self.name, "circuit reset");
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
