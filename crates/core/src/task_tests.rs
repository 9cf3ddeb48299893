// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn match_bet_is_critical_others_are_not() {
    assert!(TaskType::MatchBet.is_critical());
    assert!(!TaskType::SyncState.is_critical());
    assert!(!TaskType::Research.is_critical());
}

#[test]
fn terminal_states() {
    assert!(TaskState::Completed.is_terminal());
    assert!(TaskState::Failed.is_terminal());
    assert!(!TaskState::Pending.is_terminal());
    assert!(!TaskState::InProgress.is_terminal());
}

#[test]
fn new_task_starts_pending_with_zero_attempts() {
    let task = Task::new(
        TaskId::new("t-1"),
        TaskType::MatchBet,
        TaskPayload::MatchBet {
            bet_id: "b-1".into(),
            market_id: "m-1".into(),
            amount: 10.0,
            extra: Default::default(),
        },
        3,
        1_000,
    );
    assert_eq!(task.state, TaskState::Pending);
    assert_eq!(task.attempts, 0);
    assert!(task.checkpoints.is_empty());
}

#[test]
fn payload_round_trips_through_json_with_tag() {
    let payload = TaskPayload::Research {
        job_id: "job-1".into(),
        extra: Default::default(),
    };
    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"kind\":\"research\""));
    let back: TaskPayload = serde_json::from_str(&json).unwrap();
    assert_eq!(payload, back);
}
