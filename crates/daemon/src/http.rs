// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor HTTP surface (§5): `/health` and `/metrics`. Handlers take
//! value-copy snapshots of every subsystem they report on; none hold a lock
//! or a live reference across an `.await`.

use crate::health::{mask_wallet, HealthAgent, HealthConfig, HealthResponse, HealthStatus};
use crate::metrics::{AgentMetrics, DiagnosticsMetrics, MetricsResponse, TaskMetrics, WatchdogMetrics};
use crate::watchdog::WatchdogState;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vigil_core::{Clock, DiagnosticReport, SupervisorState, SystemClock};
use vigil_engine::{DeadLetterQueue, TaskQueue};
use vigil_resilience::ServiceGuard;

#[derive(Clone)]
pub struct AppState<C: Clock = SystemClock> {
    pub supervisor_state: Arc<Mutex<SupervisorState>>,
    pub guard: Arc<ServiceGuard>,
    pub task_queue: Arc<TaskQueue<C>>,
    pub dead_letters: Arc<DeadLetterQueue<C>>,
    pub watchdog_state_path: PathBuf,
    pub last_diagnostic: Arc<Mutex<Option<DiagnosticReport>>>,
    pub wallet_address: Option<String>,
    /// Set while the supervisor is between killing a dead child and its
    /// replacement reporting ready, so `/health` can report `restarting`
    /// instead of `unhealthy` during an expected gap.
    pub restarting: Arc<AtomicBool>,
    pub clock: C,
}

fn build_health<C: Clock>(state: &AppState<C>) -> HealthResponse {
    let supervisor_state = state.supervisor_state.lock().clone();
    let pid = supervisor_state.agent_pid;
    let alive = pid.is_some_and(vigil_adapters::is_alive);

    let status = if state.restarting.load(Ordering::SeqCst) {
        HealthStatus::Restarting
    } else if alive {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };

    let uptime_ms = state.clock.now_ms().saturating_sub(supervisor_state.start_time_ms);

    HealthResponse {
        status,
        agent: HealthAgent {
            pid,
            uptime_ms,
            restart_count: supervisor_state.restart_count,
            last_restart_at: supervisor_state.last_restart_at,
        },
        config: HealthConfig {
            wallet_address: state.wallet_address.as_deref().map(mask_wallet),
        },
    }
}

fn build_metrics<C: Clock>(state: &AppState<C>) -> MetricsResponse {
    let supervisor_state = state.supervisor_state.lock().clone();
    let uptime_ms = state.clock.now_ms().saturating_sub(supervisor_state.start_time_ms);
    let task_counts = state.task_queue.counts();
    let watchdog_state: WatchdogState = vigil_storage::load_or_default(&state.watchdog_state_path);
    let last_diagnostic = state.last_diagnostic.lock().clone();

    MetricsResponse {
        agent: AgentMetrics {
            uptime_ms,
            restart_count: supervisor_state.restart_count,
            context_clear_count: supervisor_state.context_clear_count,
            cumulative_bets_matched: supervisor_state.cumulative_bets_matched,
            cumulative_pnl_hundredths: supervisor_state.cumulative_pnl_hundredths,
        },
        tasks: TaskMetrics {
            pending: task_counts.pending,
            in_progress: task_counts.in_progress,
            completed_total: task_counts.completed,
            failed_total: task_counts.failed,
            dead_lettered_total: state.dead_letters.len() as u64,
        },
        circuit_breakers: state
            .guard
            .get_circuit_breaker_states()
            .into_iter()
            .map(|(name, snapshot)| (name.to_string(), snapshot))
            .collect(),
        watchdog: WatchdogMetrics {
            checks_total: watchdog_state.checks_total,
            interventions_total: watchdog_state.interventions_total,
        },
        diagnostics: DiagnosticsMetrics {
            last_overall_status: last_diagnostic.as_ref().map(|r| r.overall_status),
            last_check_fail_count: last_diagnostic
                .as_ref()
                .map(|r| r.checks.iter().filter(|c| c.status == vigil_core::CheckStatus::Fail).count() as u64)
                .unwrap_or(0),
        },
    }
}

async fn health_handler<C: Clock>(State(state): State<AppState<C>>) -> Json<HealthResponse> {
    Json(build_health(&state))
}

async fn metrics_handler<C: Clock>(State(state): State<AppState<C>>, Query(params): Query<HashMap<String, String>>) -> Response {
    let metrics = build_metrics(&state);
    if params.get("format").map(String::as_str) == Some("prometheus") {
        ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], metrics.to_prometheus()).into_response()
    } else {
        Json(metrics).into_response()
    }
}

pub fn router<C: Clock>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health_handler::<C>))
        .route("/metrics", get(metrics_handler::<C>))
        .with_state(state)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
