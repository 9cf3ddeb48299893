// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

async fn ok() -> Result<u32, String> {
    Ok(42)
}

async fn fail() -> Result<u32, String> {
    Err("down".into())
}

async fn fallback_value() -> u32 {
    0
}

#[tokio::test]
async fn without_fallback_propagates_dependency_error() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    let result = guard.call(POLYMARKET_API, fail).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn with_fallback_absorbs_failure() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    let result = guard.call_with_fallback(POLYMARKET_API, fail, fallback_value).await;
    assert_eq!(result, 0);
}

#[tokio::test]
async fn success_path_returns_op_result_even_with_fallback_present() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    let result = guard.call_with_fallback(BASE_RPC, ok, fallback_value).await;
    assert_eq!(result, 42);
}

#[tokio::test]
async fn enable_fallbacks_forces_fallback_even_when_closed() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    guard.enable_fallbacks(&[BACKEND]);
    let result = guard.call_with_fallback(BACKEND, ok, fallback_value).await;
    assert_eq!(result, 0, "op should not have run while fallback is preferred");
}

#[tokio::test]
async fn disable_fallbacks_restores_primary_path() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    guard.enable_fallbacks(&[BACKEND]);
    guard.disable_fallbacks(&[BACKEND]);
    let result = guard.call_with_fallback(BACKEND, ok, fallback_value).await;
    assert_eq!(result, 42);
}

#[test]
fn health_snapshot_reflects_breaker_state() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    guard.breaker(BASE_RPC).unwrap().force_open();
    let health = guard.get_service_health();
    assert_eq!(health[&BASE_RPC], false);
    assert_eq!(health[&POLYMARKET_API], true);
}

#[test]
fn breaker_states_snapshot_is_a_value_copy() {
    let guard = ServiceGuard::new(BreakerConfig::default());
    let states = guard.get_circuit_breaker_states();
    assert_eq!(states.len(), 3);
    assert!(states.contains_key(&POLYMARKET_API));
}
