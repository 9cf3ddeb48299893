// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /metrics` response shape (§5), with a Prometheus text-exposition
//! rendering for `?format=prometheus`.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use vigil_core::OverallStatus;
use vigil_resilience::BreakerSnapshot;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub uptime_ms: u64,
    pub restart_count: u32,
    pub context_clear_count: u32,
    pub cumulative_bets_matched: u64,
    pub cumulative_pnl_hundredths: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMetrics {
    pub pending: u64,
    pub in_progress: u64,
    pub completed_total: u64,
    pub failed_total: u64,
    pub dead_lettered_total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchdogMetrics {
    pub checks_total: u64,
    pub interventions_total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsMetrics {
    pub last_overall_status: Option<OverallStatus>,
    pub last_check_fail_count: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub agent: AgentMetrics,
    pub tasks: TaskMetrics,
    pub circuit_breakers: HashMap<String, BreakerSnapshot>,
    pub watchdog: WatchdogMetrics,
    pub diagnostics: DiagnosticsMetrics,
}

impl MetricsResponse {
    /// Flatten into Prometheus text exposition format. Kept deliberately
    /// simple: gauges and counters, no histograms.
    pub fn to_prometheus(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# TYPE agent_uptime_ms gauge");
        let _ = writeln!(out, "agent_uptime_ms {}", self.agent.uptime_ms);
        let _ = writeln!(out, "# TYPE agent_restart_count_total counter");
        let _ = writeln!(out, "agent_restart_count_total {}", self.agent.restart_count);
        let _ = writeln!(out, "# TYPE agent_context_clear_count_total counter");
        let _ = writeln!(out, "agent_context_clear_count_total {}", self.agent.context_clear_count);
        let _ = writeln!(out, "# TYPE agent_cumulative_bets_matched_total counter");
        let _ = writeln!(out, "agent_cumulative_bets_matched_total {}", self.agent.cumulative_bets_matched);
        let _ = writeln!(out, "# TYPE agent_cumulative_pnl_hundredths gauge");
        let _ = writeln!(out, "agent_cumulative_pnl_hundredths {}", self.agent.cumulative_pnl_hundredths);

        let _ = writeln!(out, "# TYPE tasks_pending gauge");
        let _ = writeln!(out, "tasks_pending {}", self.tasks.pending);
        let _ = writeln!(out, "# TYPE tasks_in_progress gauge");
        let _ = writeln!(out, "tasks_in_progress {}", self.tasks.in_progress);
        let _ = writeln!(out, "# TYPE tasks_completed_total counter");
        let _ = writeln!(out, "tasks_completed_total {}", self.tasks.completed_total);
        let _ = writeln!(out, "# TYPE tasks_failed_total counter");
        let _ = writeln!(out, "tasks_failed_total {}", self.tasks.failed_total);
        let _ = writeln!(out, "# TYPE tasks_dead_lettered_total counter");
        let _ = writeln!(out, "tasks_dead_lettered_total {}", self.tasks.dead_lettered_total);

        let _ = writeln!(out, "# TYPE circuit_breaker_state gauge");
        for (name, snapshot) in &self.circuit_breakers {
            let state_value = match snapshot.state {
                vigil_resilience::BreakerState::Closed => 0,
                vigil_resilience::BreakerState::HalfOpen => 1,
                vigil_resilience::BreakerState::Open => 2,
            };
            let _ = writeln!(out, "circuit_breaker_state{{service=\"{name}\"}} {state_value}");
        }

        let _ = writeln!(out, "# TYPE watchdog_checks_total counter");
        let _ = writeln!(out, "watchdog_checks_total {}", self.watchdog.checks_total);
        let _ = writeln!(out, "# TYPE watchdog_interventions_total counter");
        let _ = writeln!(out, "watchdog_interventions_total {}", self.watchdog.interventions_total);

        let _ = writeln!(out, "# TYPE diagnostics_last_check_fail_count gauge");
        let _ = writeln!(out, "diagnostics_last_check_fail_count {}", self.diagnostics.last_check_fail_count);

        out
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
