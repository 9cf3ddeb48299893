// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn watchdog_schedule_matches_table() {
    assert_eq!(restart_backoff_ms(1.0), 0);
    assert_eq!(restart_backoff_ms(2.0), 30_000);
    assert_eq!(restart_backoff_ms(3.0), 60_000);
    assert_eq!(restart_backoff_ms(4.0), 300_000);
    assert_eq!(restart_backoff_ms(5.0), 300_000);
    assert_eq!(restart_backoff_ms(100.0), 300_000);
}

#[test]
fn watchdog_schedule_handles_degenerate_inputs() {
    assert_eq!(restart_backoff_ms(f64::NAN), 0);
    assert_eq!(restart_backoff_ms(-1.0), 0);
    assert_eq!(restart_backoff_ms(f64::INFINITY), 0);
    assert_eq!(restart_backoff_ms(f64::NEG_INFINITY), 0);
}

#[test]
fn watchdog_schedule_floors_fractional_attempts() {
    assert_eq!(restart_backoff_ms(2.9), 30_000);
    assert_eq!(restart_backoff_ms(1.1), 0);
}

#[test]
fn supervisor_backoff_doubles_and_caps() {
    assert_eq!(supervisor_restart_delay_ms(0), 0);
    assert_eq!(supervisor_restart_delay_ms(1), 2_000);
    assert_eq!(supervisor_restart_delay_ms(2), 4_000);
    assert_eq!(supervisor_restart_delay_ms(3), 8_000);
    assert_eq!(supervisor_restart_delay_ms(4), 16_000);
    assert_eq!(supervisor_restart_delay_ms(5), 30_000); // would be 32_000, capped
    assert_eq!(supervisor_restart_delay_ms(10), 30_000);
}
