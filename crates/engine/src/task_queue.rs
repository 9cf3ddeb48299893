// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task queue (§4.7, §8 property 4): per-task state machine, retries,
//! checkpoints, and startup recovery.

use crate::dead_letter::DeadLetterQueue;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use vigil_core::{Checkpoint, Clock, SystemClock, Task, TaskId, TaskPayload, TaskState, TaskType};
use vigil_storage::AtomicStore;

/// What startup recovery does with tasks found `IN_PROGRESS` (§9 open
/// question -- the source left this implicit; here it is an explicit
/// policy the supervisor picks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Reset recovered tasks to PENDING so they are re-picked.
    #[default]
    ResetToPending,
    /// Treat an interrupted IN_PROGRESS task as exhausted and dead-letter
    /// it immediately, regardless of remaining attempts.
    DeadLetterImmediately,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct TaskQueueFile {
    tasks: HashMap<String, Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    RequeuedPending,
    DeadLettered,
}

/// Value-copy count of tasks per state, for the metrics endpoint (§5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub failed: u64,
}

pub struct TaskQueue<C: Clock = SystemClock> {
    store: AtomicStore<TaskQueueFile>,
    tasks: Mutex<HashMap<TaskId, Task>>,
    dlq: Arc<DeadLetterQueue<C>>,
    clock: C,
}

impl<C: Clock> TaskQueue<C> {
    pub fn new(path: impl Into<std::path::PathBuf>, dlq: Arc<DeadLetterQueue<C>>, clock: C) -> Self {
        let store: AtomicStore<TaskQueueFile> = AtomicStore::new(path);
        let file = store.load();
        let tasks = file.tasks.into_iter().map(|(id, t)| (TaskId::new(id), t)).collect();
        Self {
            store,
            tasks: Mutex::new(tasks),
            dlq,
            clock,
        }
    }

    pub fn enqueue(&self, id: TaskId, task_type: TaskType, payload: TaskPayload, max_attempts: u32) -> TaskId {
        let now_ms = self.clock.now_ms();
        let task = Task::new(id.clone(), task_type, payload, max_attempts, now_ms);
        let mut tasks = self.tasks.lock();
        tasks.insert(id.clone(), task);
        self.persist(&tasks);
        id
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.tasks.lock().get(id).cloned()
    }

    /// PENDING -> IN_PROGRESS.
    pub fn claim(&self, id: &TaskId) -> Option<Task> {
        let mut tasks = self.tasks.lock();
        let task = tasks.get_mut(id)?;
        if task.state != TaskState::Pending {
            return None;
        }
        task.state = TaskState::InProgress;
        task.last_attempt_ms = self.clock.now_ms();
        let result = task.clone();
        self.persist(&tasks);
        Some(result)
    }

    /// IN_PROGRESS -> COMPLETED. No-op on an already-terminal task.
    pub fn complete(&self, id: &TaskId) -> bool {
        let mut tasks = self.tasks.lock();
        let Some(task) = tasks.get_mut(id) else { return false };
        if task.state.is_terminal() {
            return false;
        }
        task.state = TaskState::Completed;
        self.persist(&tasks);
        true
    }

    /// IN_PROGRESS + failure: increments attempts and re-appends the
    /// error. Returns to PENDING while `attempts < maxAttempts`,
    /// otherwise becomes FAILED and moves into the dead-letter queue.
    pub fn fail(&self, id: &TaskId, err: String) -> Option<FailOutcome> {
        let (outcome, snapshot) = {
            let mut tasks = self.tasks.lock();
            let task = tasks.get_mut(id)?;
            if task.state.is_terminal() {
                return None;
            }
            task.attempts += 1;
            task.errors.push(err);
            task.last_attempt_ms = self.clock.now_ms();

            let outcome = if task.attempts < task.max_attempts {
                task.state = TaskState::Pending;
                FailOutcome::RequeuedPending
            } else {
                task.state = TaskState::Failed;
                FailOutcome::DeadLettered
            };
            let snapshot = task.clone();
            self.persist(&tasks);
            (outcome, snapshot)
        };

        if outcome == FailOutcome::DeadLettered {
            self.dlq.move_to_dead_letter(
                snapshot.id,
                snapshot.task_type,
                snapshot.attempts,
                snapshot.errors,
                snapshot.payload,
            );
        }

        Some(outcome)
    }

    pub fn checkpoint(&self, id: &TaskId, name: impl Into<String>, data: serde_json::Value) -> bool {
        let mut tasks = self.tasks.lock();
        let Some(task) = tasks.get_mut(id) else { return false };
        if task.state.is_terminal() {
            return false;
        }
        task.checkpoints.push(Checkpoint {
            name: name.into(),
            data,
            recorded_at_ms: self.clock.now_ms(),
        });
        self.persist(&tasks);
        true
    }

    /// Snapshot of how many tasks sit in each state, for the metrics
    /// endpoint. Cheap value copy, never a live reference.
    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in self.tasks.lock().values() {
            match task.state {
                TaskState::Pending => counts.pending += 1,
                TaskState::InProgress => counts.in_progress += 1,
                TaskState::Completed => counts.completed += 1,
                TaskState::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// How many tasks of `task_type` currently sit FAILED, for callers that
    /// track a single task type's failure rate (e.g. research-cycle health).
    pub fn failed_count_by_type(&self, task_type: TaskType) -> u64 {
        self.tasks
            .lock()
            .values()
            .filter(|t| t.task_type == task_type && t.state == TaskState::Failed)
            .count() as u64
    }

    /// All tasks left IN_PROGRESS -- normally from an unclean shutdown.
    pub fn recover_tasks(&self) -> Vec<Task> {
        self.tasks
            .lock()
            .values()
            .filter(|t| t.state == TaskState::InProgress)
            .cloned()
            .collect()
    }

    /// Apply `policy` to every recovered IN_PROGRESS task. Call once at
    /// startup after `recover_tasks`.
    pub fn apply_recovery_policy(&self, policy: RecoveryPolicy) {
        let recovered = self.recover_tasks();
        match policy {
            RecoveryPolicy::ResetToPending => {
                let mut tasks = self.tasks.lock();
                for task in &recovered {
                    if let Some(t) = tasks.get_mut(&task.id) {
                        t.state = TaskState::Pending;
                    }
                }
                self.persist(&tasks);
            }
            RecoveryPolicy::DeadLetterImmediately => {
                for task in recovered {
                    {
                        let mut tasks = self.tasks.lock();
                        if let Some(t) = tasks.get_mut(&task.id) {
                            t.state = TaskState::Failed;
                        }
                        self.persist(&tasks);
                    }
                    self.dlq.move_to_dead_letter(task.id, task.task_type, task.attempts, task.errors, task.payload);
                }
            }
        }
    }

    fn persist(&self, tasks: &HashMap<TaskId, Task>) {
        let file = TaskQueueFile {
            tasks: tasks.iter().map(|(id, t)| (id.as_str().to_string(), t.clone())).collect(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist task queue");
        }
    }
}

#[cfg(test)]
#[path = "task_queue_tests.rs"]
mod tests;
