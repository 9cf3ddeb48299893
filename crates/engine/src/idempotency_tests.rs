// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::tempdir;
use vigil_core::FakeClock;

fn cache(dir: &tempfile::TempDir, ttl_ms: u64, clock: FakeClock) -> IdempotencyCache<FakeClock> {
    IdempotencyCache::with_clock(dir.path().join("idempotency-cache.json"), ttl_ms, clock)
}

#[tokio::test]
async fn second_call_is_cached_and_does_not_invoke_op() {
    let dir = tempdir().unwrap();
    let cache = cache(&dir, DEFAULT_TTL_MS, FakeClock::new(0));
    let calls = Arc::new(AtomicU32::new(0));

    let params = serde_json::json!({"betId": "123"});
    let run = |calls: Arc<AtomicU32>| async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(42u32)
    };

    let first = cache
        .execute_idempotent("MATCH_BET", &params, || run(calls.clone()))
        .await
        .unwrap();
    let second = cache
        .execute_idempotent("MATCH_BET", &params, || run(calls.clone()))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!first.was_cached);
    assert!(second.was_cached);
    assert_eq!(first.result, second.result);
    assert_eq!(first.operation_id, second.operation_id);
}

#[tokio::test]
async fn different_params_are_independent_keys() {
    let dir = tempdir().unwrap();
    let cache = cache(&dir, DEFAULT_TTL_MS, FakeClock::new(0));

    let a = cache
        .execute_idempotent("MATCH_BET", &serde_json::json!({"betId": "1"}), || async { Ok::<_, String>(1u32) })
        .await
        .unwrap();
    let b = cache
        .execute_idempotent("MATCH_BET", &serde_json::json!({"betId": "2"}), || async { Ok::<_, String>(2u32) })
        .await
        .unwrap();

    assert_ne!(a.operation_id, b.operation_id);
}

#[tokio::test]
async fn failure_is_not_cached() {
    let dir = tempdir().unwrap();
    let cache = cache(&dir, DEFAULT_TTL_MS, FakeClock::new(0));
    let params = serde_json::json!({"betId": "fails"});

    let first = cache
        .execute_idempotent::<_, _, u32>("MATCH_BET", &params, || async { Err("boom".to_string()) })
        .await;
    assert!(first.is_err());

    let second = cache
        .execute_idempotent("MATCH_BET", &params, || async { Ok::<_, String>(7u32) })
        .await
        .unwrap();
    assert!(!second.was_cached);
}

#[tokio::test]
async fn ttl_expiry_causes_recompute() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new(0);
    let cache = cache(&dir, 1_000, clock.clone());
    let params = serde_json::json!({"betId": "ttl"});

    let calls = Arc::new(AtomicU32::new(0));
    let run = |calls: Arc<AtomicU32>| async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(1u32)
    };

    cache.execute_idempotent("MATCH_BET", &params, || run(calls.clone())).await.unwrap();
    clock.advance_ms(2_000);
    cache.execute_idempotent("MATCH_BET", &params, || run(calls.clone())).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cleanup_expired_drops_old_entries() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new(0);
    let cache = cache(&dir, 500, clock.clone());
    cache
        .execute_idempotent("SYNC_STATE", &serde_json::json!({}), || async { Ok::<_, String>(1u32) })
        .await
        .unwrap();
    assert_eq!(cache.len(), 1);

    clock.advance_ms(1_000);
    cache.cleanup_expired();
    assert!(cache.is_empty());
}
