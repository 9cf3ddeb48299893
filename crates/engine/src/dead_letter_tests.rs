// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::mpsc;
use tempfile::tempdir;
use vigil_core::FakeClock;

struct AlertRecorder {
    tx: mpsc::Sender<String>,
}

impl SupervisorObserver for AlertRecorder {
    fn on_critical_dead_letter(&self, task_id: &str, _task_type: TaskType, _attempts: u32, _last_error: &str) {
        let _ = self.tx.send(task_id.to_string());
    }
}

fn payload() -> TaskPayload {
    TaskPayload::MatchBet {
        bet_id: "b-1".into(),
        market_id: "m-1".into(),
        amount: 10.0,
        extra: Default::default(),
    }
}

#[tokio::test]
async fn critical_insert_fires_alert_exactly_once_per_task_id() {
    let dir = tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    let observer = Arc::new(AlertRecorder { tx });
    let dlq = DeadLetterQueue::with_clock(
        dir.path().join("dead-letters.json"),
        observer,
        DEFAULT_REVIEW_INTERVAL_MS,
        FakeClock::new(0),
    );

    dlq.move_to_dead_letter(TaskId::new("t-1"), TaskType::MatchBet, 3, vec!["timeout".into()], payload());
    // re-insert with same id must not re-fire
    dlq.move_to_dead_letter(TaskId::new("t-1"), TaskType::MatchBet, 4, vec!["timeout".into(), "timeout".into()], payload());

    let first = rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();
    assert_eq!(first, "t-1");
    assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());

    let entry = dlq.get(&TaskId::new("t-1")).unwrap();
    assert_eq!(entry.attempts, 4);
}

#[tokio::test]
async fn non_critical_insert_never_alerts() {
    let dir = tempdir().unwrap();
    let (tx, rx) = mpsc::channel();
    let observer = Arc::new(AlertRecorder { tx });
    let dlq = DeadLetterQueue::with_clock(
        dir.path().join("dead-letters.json"),
        observer,
        DEFAULT_REVIEW_INTERVAL_MS,
        FakeClock::new(0),
    );

    dlq.move_to_dead_letter(
        TaskId::new("t-2"),
        TaskType::SyncState,
        1,
        vec!["rpc error".into()],
        TaskPayload::SyncState {
            agent_address: "0xabc".into(),
            extra: Default::default(),
        },
    );

    assert!(rx.recv_timeout(std::time::Duration::from_millis(100)).is_err());
}

#[tokio::test]
async fn retry_removes_and_returns_entry() {
    let dir = tempdir().unwrap();
    let (tx, _rx) = mpsc::channel();
    let observer = Arc::new(AlertRecorder { tx });
    let dlq = DeadLetterQueue::with_clock(
        dir.path().join("dead-letters.json"),
        observer,
        DEFAULT_REVIEW_INTERVAL_MS,
        FakeClock::new(0),
    );
    dlq.move_to_dead_letter(TaskId::new("t-3"), TaskType::Research, 2, vec!["oops".into()], TaskPayload::Research {
        job_id: "j-1".into(),
        extra: Default::default(),
    });

    let retried = dlq.retry_dead_letter(&TaskId::new("t-3"));
    assert!(retried.is_some());
    assert!(dlq.get(&TaskId::new("t-3")).is_none());
    assert!(dlq.retry_dead_letter(&TaskId::new("t-3")).is_none());
}

#[tokio::test]
async fn review_buckets_by_task_type_and_error_category() {
    let dir = tempdir().unwrap();
    let (tx, _rx) = mpsc::channel();
    let observer = Arc::new(AlertRecorder { tx });
    let dlq = DeadLetterQueue::with_clock(
        dir.path().join("dead-letters.json"),
        observer,
        DEFAULT_REVIEW_INTERVAL_MS,
        FakeClock::new(0),
    );

    dlq.move_to_dead_letter(TaskId::new("a"), TaskType::MatchBet, 1, vec!["timeout occurred".into()], payload());
    dlq.move_to_dead_letter(
        TaskId::new("b"),
        TaskType::MatchBet,
        1,
        vec!["connection refused".into()],
        payload(),
    );

    let review = dlq.review_dead_letters();
    assert_eq!(review.total, 2);
    assert_eq!(review.by_task_type["MatchBet"], 2);
    assert_eq!(review.by_error_category["Timeout"], 1);
    assert_eq!(review.by_error_category["ConnectionRefused"], 1);
}

#[tokio::test]
async fn weekly_review_runs_once_per_interval() {
    let dir = tempdir().unwrap();
    let (tx, _rx) = mpsc::channel();
    let observer = Arc::new(AlertRecorder { tx });
    let clock = FakeClock::new(0);
    let dlq = DeadLetterQueue::with_clock(dir.path().join("dead-letters.json"), observer, 1_000, clock.clone());

    assert!(dlq.maybe_run_weekly_review().is_some());
    assert!(dlq.maybe_run_weekly_review().is_none());

    clock.advance_ms(1_500);
    assert!(dlq.maybe_run_weekly_review().is_some());
}
