// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog (component N, §4.14): a process independent of the supervisor,
//! checking the child's heartbeat file and the supervisor's own recorded
//! PID on a timer. An unhandled child crash never crashes the supervisor
//! (the supervisor owns that recovery itself, §4.15) -- the watchdog is the
//! last-resort backstop for the supervisor process itself going unhealthy
//! or disappearing.

use crate::config::Config;
use crate::crash_log::CrashLog;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use vigil_adapters::{heartbeat_age, is_alive, terminate, ChildAdapter, ChildAdapterError, ChildSpawnConfig, TokioChildAdapter};
use vigil_core::{restart_backoff_ms, Clock, CrashReason, SystemClock};

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 60_000;
pub const HEARTBEAT_STALE_MS: u64 = 10 * 60 * 1000;
const CRASH_WINDOW_MS: u64 = 5 * 60 * 1000;
const ALERT_THRESHOLD: usize = 4;
const WATCHDOG_TERM_WAIT: Duration = Duration::from_secs(1);
const WATCHDOG_KILL_WAIT: Duration = Duration::from_secs(0);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WatchdogState {
    pub supervisor_pid: Option<u32>,
    pub consecutive_restarts: u32,
    pub checks_total: u64,
    pub interventions_total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Health {
    Healthy,
    Unhealthy(CrashReason),
}

fn assess(agent_dir: &std::path::Path, supervisor_pid: Option<u32>) -> Health {
    let stale = match heartbeat_age(agent_dir) {
        Some(age) => age.as_millis() as u64 > HEARTBEAT_STALE_MS,
        None => true,
    };
    if stale {
        return Health::Unhealthy(CrashReason::HeartbeatStale);
    }
    match supervisor_pid {
        Some(pid) if is_alive(pid) => Health::Healthy,
        _ => Health::Unhealthy(CrashReason::ProcessDead),
    }
}

pub struct Watchdog<C: Clock = SystemClock> {
    config: Config,
    state_path: PathBuf,
    crash_log: CrashLog<C>,
    adapter: Box<dyn ChildAdapter>,
    check_interval_ms: u64,
}

impl Watchdog<SystemClock> {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> Watchdog<C> {
    pub fn with_clock(config: Config, clock: C) -> Self {
        let state_path = config.watchdog_state_path();
        let crash_log_path = config.agent_dir.join("watchdog-crash-log.json");
        Self {
            crash_log: CrashLog::with_clock(crash_log_path, clock),
            adapter: Box::new(TokioChildAdapter),
            state_path,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            config,
        }
    }

    #[cfg(test)]
    fn with_adapter(config: Config, clock: C, adapter: Box<dyn ChildAdapter>) -> Self {
        let mut watchdog = Self::with_clock(config, clock);
        watchdog.adapter = adapter;
        watchdog
    }

    fn load_state(&self) -> WatchdogState {
        vigil_storage::load_or_default(&self.state_path)
    }

    fn save_state(&self, state: &WatchdogState) {
        if let Err(e) = vigil_storage::save(&self.state_path, state) {
            tracing::warn!(error = %e, "failed to persist watchdog state");
        }
    }

    async fn spawn_supervisor(&self) -> Result<u32, ChildAdapterError> {
        let spawn_config = ChildSpawnConfig {
            command: self.config.supervisor_binary.clone(),
            args: Vec::new(),
            working_dir: self.config.bot_root.clone(),
            env: vec![("VIGIL_BOT_ROOT".to_string(), self.config.bot_root.to_string_lossy().into_owned())],
        };
        let handle = self.adapter.spawn(spawn_config).await?;
        Ok(handle.pid)
    }

    /// One check-and-respond cycle (§4.14 steps 1-5): assess health, and on
    /// an unhealthy verdict terminate the recorded PID, log the crash, wait
    /// out the restart backoff, and respawn.
    pub async fn tick(&self) -> WatchdogState {
        let mut state = self.load_state();
        state.checks_total += 1;

        match assess(&self.config.agent_dir, state.supervisor_pid) {
            Health::Healthy => {
                state.consecutive_restarts = 0;
            }
            Health::Unhealthy(reason) => {
                if let Some(pid) = state.supervisor_pid {
                    let _ = terminate(pid, WATCHDOG_TERM_WAIT, WATCHDOG_KILL_WAIT).await;
                }
                self.crash_log.record(reason, state.supervisor_pid, None);
                state.interventions_total += 1;

                let crashes_in_window = self.crash_log.count_within(CRASH_WINDOW_MS);
                if crashes_in_window >= ALERT_THRESHOLD {
                    eprintln!(
                        "watchdog ALERT: supervisor has crashed {crashes_in_window} times in the last 5 minutes (reason={reason:?})"
                    );
                }

                let attempt = (state.consecutive_restarts + 1) as f64;
                let delay_ms = restart_backoff_ms(attempt);
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }

                match self.spawn_supervisor().await {
                    Ok(new_pid) => {
                        state.supervisor_pid = Some(new_pid);
                        state.consecutive_restarts += 1;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "watchdog failed to respawn supervisor");
                    }
                }
            }
        }

        self.save_state(&state);
        state
    }

    /// Poll forever at `check_interval_ms` (§4.14: default 60s). Runs as
    /// its own independent periodic task (§5).
    pub async fn run(&self) -> ! {
        loop {
            self.tick().await;
            tokio::time::sleep(Duration::from_millis(self.check_interval_ms)).await;
        }
    }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
