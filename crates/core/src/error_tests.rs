// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn circuit_open_display_includes_breaker_name() {
    let err = SupervisorError::CircuitOpen {
        breaker: "polymarketAPI".to_string(),
    };
    assert!(err.to_string().contains("polymarketAPI"));
    assert!(err.is_circuit_open());
}

#[test]
fn task_failed_is_not_circuit_open() {
    let err = SupervisorError::TaskFailed {
        task_id: "t-1".to_string(),
        attempts: 3,
        last_error: "boom".to_string(),
    };
    assert!(!err.is_circuit_open());
    assert!(err.to_string().contains("t-1"));
}
