// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> MetricsResponse {
    MetricsResponse {
        agent: AgentMetrics {
            uptime_ms: 1_000,
            restart_count: 2,
            context_clear_count: 1,
            cumulative_bets_matched: 10,
            cumulative_pnl_hundredths: -500,
        },
        tasks: TaskMetrics {
            pending: 1,
            in_progress: 2,
            completed_total: 3,
            failed_total: 4,
            dead_lettered_total: 4,
        },
        circuit_breakers: HashMap::new(),
        watchdog: WatchdogMetrics {
            checks_total: 5,
            interventions_total: 0,
        },
        diagnostics: DiagnosticsMetrics {
            last_overall_status: Some(OverallStatus::Healthy),
            last_check_fail_count: 0,
        },
    }
}

#[test]
fn prometheus_rendering_includes_every_metric_name() {
    let text = sample().to_prometheus();
    for name in [
        "agent_uptime_ms",
        "agent_restart_count_total",
        "tasks_pending",
        "tasks_completed_total",
        "watchdog_checks_total",
        "diagnostics_last_check_fail_count",
    ] {
        assert!(text.contains(name), "missing metric {name} in:\n{text}");
    }
}
