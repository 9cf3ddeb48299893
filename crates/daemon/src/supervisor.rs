// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor (component O, §4.15): owns the child's lifecycle end to end --
//! startup recovery, spawn, stdout/stderr tailing, crash-and-restart with
//! backoff, the context-clear sequence (§4.13), and the periodic tasks that
//! drive every other subsystem. Serves `/health` and `/metrics` through
//! [`crate::http`].

use crate::config::Config;
use crate::crash_log::CrashLog;
use crate::diagnostic_inputs::AgentDiagnosticInputs;
use crate::http::AppState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use vigil_adapters::{terminate, ChildAdapter, ChildHandle, ChildSpawnConfig, LifecycleTracker, TokioChildAdapter};
use vigil_core::{supervisor_restart_delay_ms, AgentState, Clock, CrashReason, DiagnosticReport, SupervisorObserver, SupervisorState, SystemClock, TaskType};
use vigil_engine::{DeadLetterQueue, RecoveryPolicy, TaskQueue};
use vigil_learning::{AdaptiveConfig, DiagnosticEngine, DiagnosticInputs, FailureStore, PromptMetrics, PromptStore, SyntheticProber};
use vigil_resilience::ServiceGuard;
use vigil_storage::AtomicStore;

const DIAGNOSTICS_INTERVAL_MS: u64 = 5 * 60 * 1000;
const PROBE_INTERVAL_MS: u64 = 10 * 60 * 1000;
const ADAPTATION_INTERVAL_MS: u64 = 60 * 60 * 1000;
const DLQ_REVIEW_POLL_INTERVAL_MS: u64 = 60 * 60 * 1000;
const MEMORY_SAMPLE_INTERVAL_MS: u64 = 5 * 60 * 1000;
const PROMPT_EVAL_INTERVAL_MS: u64 = 60 * 60 * 1000;
const LIFECYCLE_POLL_INTERVAL_MS: u64 = 2_000;

const CHILD_TERM_WAIT: Duration = Duration::from_secs(5);
const CHILD_KILL_WAIT: Duration = Duration::from_secs(1);

const BASE_PROMPT: &str = "You are an autonomous Polymarket trading agent.";

/// Production [`SupervisorObserver`]: every event becomes a structured log
/// line at the severity an operator would expect to filter on.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SupervisorObserver for TracingObserver {
    fn on_critical_dead_letter(&self, task_id: &str, task_type: vigil_core::TaskType, attempts: u32, last_error: &str) {
        tracing::error!(task_id, ?task_type, attempts, last_error, "critical task dead-lettered");
    }

    fn on_prompt_changed(&self, version: u32, reason: &str) {
        tracing::info!(version, reason, "prompt version changed");
    }

    fn on_adaptation(&self, pattern_type: &str, description: &str) {
        tracing::info!(pattern_type, description, "adaptation applied");
    }

    fn on_remediation(&self, action: &str, detail: &str) {
        tracing::warn!(action, detail, "diagnostic remediation");
    }
}

/// Current RSS for the diagnostic engine's memory-trend check. Linux-only;
/// returns 0 (no trend signal) wherever `/proc/self/status` isn't present.
fn current_rss_bytes() -> u64 {
    let Ok(contents) = std::fs::read_to_string("/proc/self/status") else {
        return 0;
    };
    contents
        .lines()
        .find_map(|line| line.strip_prefix("VmRSS:"))
        .and_then(|rest| rest.trim().split_whitespace().next())
        .and_then(|kib| kib.parse::<u64>().ok())
        .map(|kib| kib * 1024)
        .unwrap_or(0)
}

pub struct Supervisor<C: Clock = SystemClock> {
    config: Config,
    clock: C,
    adapter: Arc<dyn ChildAdapter>,
    observer: Arc<dyn SupervisorObserver>,

    supervisor_state: Arc<Mutex<SupervisorState>>,
    supervisor_store: AtomicStore<SupervisorState>,
    agent_state: Arc<Mutex<AgentState>>,
    agent_store: AtomicStore<AgentState>,

    lifecycle: LifecycleTracker<C>,
    guard: Arc<ServiceGuard>,
    task_queue: Arc<TaskQueue<C>>,
    dead_letters: Arc<DeadLetterQueue<C>>,
    failure_store: Arc<FailureStore<C>>,
    prompt_store: Arc<PromptStore<C>>,
    diagnostic_inputs: Arc<AgentDiagnosticInputs>,
    diagnostic_engine: Arc<DiagnosticEngine<C>>,
    prober: Arc<SyntheticProber>,
    crash_log: CrashLog<C>,
    last_probe_healthy: Arc<Mutex<Option<bool>>>,
    last_diagnostic: Arc<Mutex<Option<DiagnosticReport>>>,

    restarting: Arc<AtomicBool>,
    shutting_down: Arc<AtomicBool>,
}

impl Supervisor<SystemClock> {
    pub fn new(config: Config, observer: Arc<dyn SupervisorObserver>) -> Self {
        Self::with_clock(config, observer, SystemClock)
    }
}

impl<C: Clock> Supervisor<C> {
    pub fn with_clock(config: Config, observer: Arc<dyn SupervisorObserver>, clock: C) -> Self {
        let supervisor_store: AtomicStore<SupervisorState> = AtomicStore::new(config.supervisor_state_path());
        let supervisor_state = Arc::new(Mutex::new(supervisor_store.load()));
        let agent_store: AtomicStore<AgentState> = AtomicStore::new(config.agent_state_path());
        let agent_state = Arc::new(Mutex::new(agent_store.load()));

        let guard = Arc::new(ServiceGuard::new(Default::default()));
        let dead_letters = Arc::new(DeadLetterQueue::with_clock(
            config.dead_letters_path(),
            observer.clone(),
            vigil_engine::DEFAULT_REVIEW_INTERVAL_MS,
            clock.clone(),
        ));
        let task_queue = Arc::new(TaskQueue::new(config.task_queue_path(), dead_letters.clone(), clock.clone()));
        let failure_store = Arc::new(FailureStore::with_clock(
            config.failure_history_path(),
            observer.clone(),
            vigil_learning::DEFAULT_MAX_HISTORY,
            vigil_learning::DEFAULT_PATTERN_WINDOW_MS,
            clock.clone(),
        ));
        let prompt_store = Arc::new(PromptStore::with_clock(config.prompt_evolution_path(), BASE_PROMPT, observer.clone(), clock.clone()));
        let last_probe_healthy = Arc::new(Mutex::new(None));
        let diagnostic_inputs = Arc::new(AgentDiagnosticInputs::new(
            config.agent_dir.clone(),
            config.agent_log_path(),
            agent_state.clone(),
            last_probe_healthy.clone(),
        ));
        let diagnostic_engine = Arc::new(DiagnosticEngine::with_clock(
            config.diagnostics_dir.clone(),
            diagnostic_inputs.clone(),
            observer.clone(),
            Default::default(),
            clock.clone(),
        ));
        let prober = Arc::new(SyntheticProber::new(guard.clone(), config.market_url.clone(), config.rpc_url.clone(), config.agent_dir.clone()));
        let crash_log = CrashLog::with_clock(config.crash_log_path(), clock.clone());
        let lifecycle = LifecycleTracker::with_clock(
            config.agent_dir.clone(),
            vigil_adapters::DEFAULT_MAX_MESSAGES,
            vigil_adapters::DEFAULT_CLEAR_COOLDOWN_MS,
            vigil_adapters::DEFAULT_MAX_RUNTIME_MS,
            clock.clone(),
        );

        Self {
            config,
            clock,
            adapter: Arc::new(TokioChildAdapter),
            observer,
            supervisor_state,
            supervisor_store,
            agent_state,
            agent_store,
            lifecycle,
            guard,
            task_queue,
            dead_letters,
            failure_store,
            prompt_store,
            diagnostic_inputs,
            diagnostic_engine,
            prober,
            crash_log,
            last_probe_healthy,
            last_diagnostic: Arc::new(Mutex::new(None)),
            restarting: Arc::new(AtomicBool::new(false)),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn http_state(&self) -> AppState<C> {
        AppState {
            supervisor_state: self.supervisor_state.clone(),
            guard: self.guard.clone(),
            task_queue: self.task_queue.clone(),
            dead_letters: self.dead_letters.clone(),
            watchdog_state_path: self.config.watchdog_state_path(),
            last_diagnostic: self.last_diagnostic.clone(),
            wallet_address: self.config.child_env.iter().find(|(k, _)| k == "WALLET_ADDRESS").map(|(_, v)| v.clone()),
            restarting: self.restarting.clone(),
            clock: self.clock.clone(),
        }
    }

    pub fn request_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }

    fn persist_supervisor_state(&self) {
        let snapshot = self.supervisor_state.lock().clone();
        if let Err(e) = self.supervisor_store.save(&snapshot) {
            tracing::warn!(error = %e, "failed to persist supervisor state");
        }
    }

    fn persist_agent_state(&self) {
        let snapshot = self.agent_state.lock().clone();
        if let Err(e) = self.agent_store.save(&snapshot) {
            tracing::warn!(error = %e, "failed to persist agent state");
        }
    }

    async fn spawn_child(&self) -> Result<ChildHandle, vigil_adapters::ChildAdapterError> {
        let spawn_config = ChildSpawnConfig {
            command: self.config.child_command.clone(),
            args: self.config.child_args.clone(),
            working_dir: self.config.bot_root.clone(),
            env: self.config.child_env.clone(),
        };
        self.adapter.spawn(spawn_config).await
    }

    async fn append_line(path: &std::path::Path, line: &str) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }

    /// Tail the child's stdout into `agent.log`, feeding every line to the
    /// lifecycle tracker's turn-count heuristic (§4.13).
    fn tail_stdout(self: &Arc<Self>, mut handle: ChildHandle) -> ChildHandle {
        if let Some(stdout) = handle.take_stdout() {
            let this = self.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    this.lifecycle.observe_line(&line);
                    if let Err(e) = Self::append_line(&this.config.agent_log_path(), &line).await {
                        tracing::warn!(error = %e, "failed to append agent log line");
                    }
                }
            });
        }
        handle
    }

    /// Tail the child's stderr into the same log, undifferentiated from
    /// stdout (§5: a single `agent.log`).
    fn tail_stderr(self: &Arc<Self>, mut handle: ChildHandle) -> ChildHandle {
        if let Some(stderr) = handle.take_stderr() {
            let this = self.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Err(e) = Self::append_line(&this.config.agent_log_path(), &line).await {
                        tracing::warn!(error = %e, "failed to append agent log line");
                    }
                }
            });
        }
        handle
    }

    /// Context-clear sequence (§4.13): graceful-stop the old child, sweep
    /// research-terminal scratch directories, clear the signal file and
    /// session counters. The caller respawns once this returns.
    async fn context_clear(&self, pid: u32) {
        let _ = terminate(pid, CHILD_TERM_WAIT, CHILD_KILL_WAIT).await;
        self.sweep_research_terminals();
        self.lifecycle.record_clear();
        self.supervisor_state.lock().context_clear_count += 1;
        self.persist_supervisor_state();
    }

    fn sweep_research_terminals(&self) {
        let Ok(entries) = std::fs::read_dir(&self.config.agent_dir) else { return };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("research-terminal-") {
                let _ = std::fs::remove_dir_all(entry.path());
            }
        }
    }

    fn apply_matched_bet(&self) {
        let Some(bet) = self.lifecycle.poll_matched_bet() else { return };
        let pnl_hundredths = (bet.pnl * 100.0).round() as i64;
        {
            let mut state = self.supervisor_state.lock();
            state.cumulative_bets_matched += 1;
            state.cumulative_pnl_hundredths = state.cumulative_pnl_hundredths.saturating_add(pnl_hundredths);
        }
        self.agent_state.lock().matched_bets.push(bet);
        self.persist_supervisor_state();
        self.persist_agent_state();
    }

    /// Owns the child across its whole lifetime: spawn, tail, wait, and on
    /// an unplanned exit restart with exponential backoff (§4.15). Returns
    /// once `request_shutdown` has been observed and the child has exited.
    async fn supervise_child(self: &Arc<Self>) {
        let mut restart_attempt: u32 = 0;

        loop {
            let handle = match self.spawn_child().await {
                Ok(h) => h,
                Err(e) => {
                    tracing::error!(error = %e, "failed to spawn child, retrying after backoff");
                    restart_attempt += 1;
                    tokio::time::sleep(Duration::from_millis(supervisor_restart_delay_ms(restart_attempt))).await;
                    continue;
                }
            };
            let pid = handle.pid;
            {
                let mut state = self.supervisor_state.lock();
                state.agent_pid = Some(pid);
                if state.start_time_ms == 0 {
                    state.start_time_ms = self.clock.now_ms();
                }
            }
            self.persist_supervisor_state();
            self.restarting.store(false, Ordering::SeqCst);

            let mut handle = self.tail_stdout(handle);
            handle = self.tail_stderr(handle);

            let mut tick = tokio::time::interval(Duration::from_millis(LIFECYCLE_POLL_INTERVAL_MS));
            let mut context_clearing = false;
            let exit_status = loop {
                tokio::select! {
                    status = handle.wait() => break status,
                    _ = tick.tick() => {
                        self.apply_matched_bet();
                        if self.shutting_down.load(Ordering::SeqCst) {
                            let _ = terminate(pid, CHILD_TERM_WAIT, CHILD_KILL_WAIT).await;
                            break handle.wait().await;
                        }
                        if self.lifecycle.should_clear().is_some() {
                            context_clearing = true;
                            self.restarting.store(true, Ordering::SeqCst);
                            self.context_clear(pid).await;
                            break handle.wait().await;
                        }
                    }
                }
            };

            if self.shutting_down.load(Ordering::SeqCst) {
                return;
            }

            let clean_exit = context_clearing || matches!(exit_status, Ok(status) if status.success());
            if clean_exit {
                // A flagged context-clear (regardless of how the terminate
                // escalation left the exit status), or an intentional exit
                // code 0 (§6) -- neither counts against restartCount/backoff
                // (§4.13, §8 property 7).
                restart_attempt = 0;
                continue;
            }

            restart_attempt += 1;
            self.restarting.store(true, Ordering::SeqCst);
            self.crash_log.record(CrashReason::ProcessDead, Some(pid), None);
            {
                let mut state = self.supervisor_state.lock();
                state.restart_count += 1;
                state.last_restart_at = Some(self.clock.now_iso8601());
            }
            self.persist_supervisor_state();

            let delay_ms = supervisor_restart_delay_ms(restart_attempt);
            tracing::warn!(attempt = restart_attempt, delay_ms, "child exited unexpectedly, restarting");
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    fn spawn_periodic_tasks(self: &Arc<Self>) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(DIAGNOSTICS_INTERVAL_MS));
            loop {
                interval.tick().await;
                let report = this.diagnostic_engine.run_diagnostics();
                *this.last_diagnostic.lock() = Some(report);
            }
        });

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(PROBE_INTERVAL_MS));
            loop {
                interval.tick().await;
                let report = this.prober.run_probes().await;
                *this.last_probe_healthy.lock() = Some(report.all_passed());
            }
        });

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(ADAPTATION_INTERVAL_MS));
            let mut adaptive = AdaptiveConfig::default();
            loop {
                interval.tick().await;
                for result in this.failure_store.apply_adaptations(&mut adaptive) {
                    if result.adapted {
                        this.observer.on_adaptation(&format!("{:?}", result.adaptation), &result.description);
                    }
                }
            }
        });

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(DLQ_REVIEW_POLL_INTERVAL_MS));
            loop {
                interval.tick().await;
                let _ = this.dead_letters.maybe_run_weekly_review();
            }
        });

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(MEMORY_SAMPLE_INTERVAL_MS));
            loop {
                interval.tick().await;
                this.diagnostic_engine.sample_memory(current_rss_bytes());
            }
        });

        let this = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(PROMPT_EVAL_INTERVAL_MS));
            loop {
                interval.tick().await;
                this.evaluate_prompt_effectiveness();
            }
        });
    }

    /// Feed the last tick's tool-call and decision-outcome ratios, plus the
    /// research task queue's failure count, into the prompt store (§4.12).
    fn evaluate_prompt_effectiveness(&self) {
        let (tool_success, tool_failure) = self.diagnostic_inputs.tool_call_counts();
        let tool_total = tool_success + tool_failure;
        let tool_call_success_rate = if tool_total == 0 { 1.0 } else { tool_success as f64 / tool_total as f64 };

        let (wins, losses) = self.diagnostic_inputs.decision_outcomes();
        let decisions = wins + losses;
        let win_rate = if decisions == 0 { 1.0 } else { wins as f64 / decisions as f64 };

        let failed_research_cycles = self.task_queue.failed_count_by_type(TaskType::Research) as u32;

        self.prompt_store.analyze_prompt_effectiveness(PromptMetrics {
            tool_call_success_rate,
            failed_research_cycles,
            win_rate,
        });
    }

    pub async fn run(self: Arc<Self>) {
        self.task_queue.apply_recovery_policy(RecoveryPolicy::ResetToPending);
        self.task_queue.recover_tasks();
        self.spawn_periodic_tasks();
        self.supervise_child().await;
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
