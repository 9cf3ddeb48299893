// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dead-letter queue (§4.6, §8 property 5): terminal-failure record,
//! critical alerting, weekly review.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vigil_core::{Clock, DeadLetter, ErrorCategory, ReviewAnalysis, SupervisorObserver, SystemClock, TaskId, TaskPayload, TaskType};
use vigil_storage::AtomicStore;

pub const DEFAULT_REVIEW_INTERVAL_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct DlqFile {
    entries: HashMap<String, DeadLetter>,
    /// Critical task ids already alerted on, so re-insertion never
    /// double-fires the out-of-band alert.
    alerted: HashSet<String>,
    last_review_ms: Option<u64>,
}

pub struct DeadLetterQueue<C: Clock = SystemClock> {
    store: AtomicStore<DlqFile>,
    entries: Mutex<HashMap<TaskId, DeadLetter>>,
    alerted: Mutex<HashSet<TaskId>>,
    last_review_ms: Mutex<Option<u64>>,
    review_interval_ms: u64,
    observer: Arc<dyn SupervisorObserver>,
    clock: C,
}

impl DeadLetterQueue<SystemClock> {
    pub fn new(path: impl Into<std::path::PathBuf>, observer: Arc<dyn SupervisorObserver>) -> Self {
        Self::with_clock(path, observer, DEFAULT_REVIEW_INTERVAL_MS, SystemClock)
    }
}

impl<C: Clock> DeadLetterQueue<C> {
    pub fn with_clock(
        path: impl Into<std::path::PathBuf>,
        observer: Arc<dyn SupervisorObserver>,
        review_interval_ms: u64,
        clock: C,
    ) -> Self {
        let store: AtomicStore<DlqFile> = AtomicStore::new(path);
        let file = store.load();
        let entries = file
            .entries
            .into_iter()
            .map(|(id, dl)| (TaskId::new(id), dl))
            .collect();
        let alerted = file.alerted.into_iter().map(TaskId::new).collect();
        Self {
            store,
            entries: Mutex::new(entries),
            alerted: Mutex::new(alerted),
            last_review_ms: Mutex::new(file.last_review_ms),
            review_interval_ms,
            observer,
            clock,
        }
    }

    /// Insert or update a dead letter. Fires the critical alert exactly
    /// once per distinct `taskId` for MATCH_BET entries.
    pub fn move_to_dead_letter(
        &self,
        task_id: TaskId,
        task_type: TaskType,
        attempts: u32,
        errors: Vec<String>,
        payload: TaskPayload,
    ) {
        let now_ms = self.clock.now_ms();
        let is_new = {
            let mut entries = self.entries.lock();
            let is_new = !entries.contains_key(&task_id);
            let entry = entries.entry(task_id.clone()).or_insert_with(|| DeadLetter {
                id: task_id.clone(),
                task_type,
                attempts,
                payload: payload.clone(),
                errors: Vec::new(),
                first_attempt_ms: now_ms,
                last_attempt_ms: now_ms,
            });
            entry.attempts = attempts;
            entry.errors = errors.clone();
            entry.payload = payload;
            entry.last_attempt_ms = now_ms;
            is_new
        };

        // `insert` returns true the first time a given id is seen, so this
        // also doubles as the "not yet alerted" check (§8 property 5).
        let newly_alerted = is_new && task_type.is_critical() && self.alerted.lock().insert(task_id.clone());

        {
            let entries = self.entries.lock();
            let alerted = self.alerted.lock();
            self.persist(&entries, &alerted);
        }

        if newly_alerted {
            let last_error = errors.last().cloned().unwrap_or_default();
            eprintln!(
                "DLQ critical: taskId={} type={:?} attempts={} lastError={}",
                task_id, task_type, attempts, last_error
            );
            let observer = self.observer.clone();
            let task_id_str = task_id.as_str().to_string();
            tokio::spawn(async move {
                observer.on_critical_dead_letter(&task_id_str, task_type, attempts, &last_error);
            });
        }
    }

    /// Remove and return an entry so the task queue can reinsert it. Does
    /// NOT itself re-enqueue (§9 open question: made explicit here).
    pub fn retry_dead_letter(&self, task_id: &TaskId) -> Option<DeadLetter> {
        let mut entries = self.entries.lock();
        let removed = entries.remove(task_id);
        if removed.is_some() {
            self.persist(&entries, &self.alerted.lock());
        }
        removed
    }

    pub fn get(&self, task_id: &TaskId) -> Option<DeadLetter> {
        self.entries.lock().get(task_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn review_dead_letters(&self) -> ReviewAnalysis {
        let entries = self.entries.lock();
        let mut by_task_type: HashMap<String, usize> = HashMap::new();
        let mut by_error_category: HashMap<String, usize> = HashMap::new();
        let mut oldest = None;

        for entry in entries.values() {
            *by_task_type.entry(format!("{:?}", entry.task_type)).or_insert(0) += 1;
            let category = entry
                .errors
                .last()
                .map(|e| ErrorCategory::classify(e))
                .unwrap_or(ErrorCategory::Unknown);
            *by_error_category.entry(format!("{category:?}")).or_insert(0) += 1;
            oldest = Some(oldest.map_or(entry.first_attempt_ms, |o: u64| o.min(entry.first_attempt_ms)));
        }

        ReviewAnalysis {
            total: entries.len(),
            by_task_type,
            by_error_category,
            oldest_timestamp_ms: oldest,
        }
    }

    /// Run the weekly review if `review_interval_ms` has elapsed since the
    /// last one, updating `lastReview` regardless of whether it ran.
    pub fn maybe_run_weekly_review(&self) -> Option<ReviewAnalysis> {
        let now_ms = self.clock.now_ms();
        let mut last_review = self.last_review_ms.lock();
        let due = last_review.map_or(true, |last| now_ms.saturating_sub(last) >= self.review_interval_ms);
        if !due {
            return None;
        }
        *last_review = Some(now_ms);
        drop(last_review);
        let entries = self.entries.lock();
        self.persist(&entries, &self.alerted.lock());
        drop(entries);
        Some(self.review_dead_letters())
    }

    fn persist(&self, entries: &HashMap<TaskId, DeadLetter>, alerted: &HashSet<TaskId>) {
        let file = DlqFile {
            entries: entries.iter().map(|(id, dl)| (id.as_str().to_string(), dl.clone())).collect(),
            alerted: alerted.iter().map(|id| id.as_str().to_string()).collect(),
            last_review_ms: *self.last_review_ms.lock(),
        };
        if let Err(e) = self.store.save(&file) {
            tracing::warn!(error = %e, "failed to persist dead-letter queue");
        }
    }
}

#[cfg(test)]
#[path = "dead_letter_tests.rs"]
mod tests;
