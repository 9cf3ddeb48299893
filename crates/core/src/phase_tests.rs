// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_phase_is_idle() {
    assert_eq!(AgentPhase::default(), AgentPhase::Idle);
    assert!(AgentPhase::default().is_idle());
}

#[test]
fn non_idle_phases_report_not_idle() {
    assert!(!AgentPhase::Research.is_idle());
    assert!(!AgentPhase::Evaluating.is_idle());
    assert!(!AgentPhase::Executing.is_idle());
}

#[test]
fn display_matches_serde_rename() {
    assert_eq!(AgentPhase::Evaluating.to_string(), "evaluating");
}

#[test]
fn json_round_trips() {
    let json = serde_json::to_string(&AgentPhase::Executing).unwrap();
    assert_eq!(json, "\"executing\"");
    let back: AgentPhase = serde_json::from_str(&json).unwrap();
    assert_eq!(back, AgentPhase::Executing);
}
