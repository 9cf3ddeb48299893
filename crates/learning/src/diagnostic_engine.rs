// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-diagnostic engine (§4.10): five periodic health checks, one report
//! per run, in-process remediation for the checks that FAIL.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vigil_core::{
    BoundedHistory, CheckName, CheckStatus, Clock, DiagnosticCheck, DiagnosticReport, OverallStatus, RemediationAction,
    SupervisorObserver, SystemClock,
};

const MEMORY_SAMPLE_WINDOW_MS: u64 = 60 * 60 * 1000;
const REPORT_RETENTION_MS: u64 = 7 * 24 * 60 * 60 * 1000;
const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MemorySample {
    pub timestamp_ms: u64,
    pub heap_used_bytes: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticThresholds {
    pub memory_trend_warn: f64,
    pub memory_trend_fail: f64,
    pub tool_call_pass: f64,
    pub tool_call_warn: f64,
    pub decision_quality_pass: f64,
    pub decision_quality_warn: f64,
    pub disk_pass_mib: u64,
    pub disk_warn_mib: u64,
}

impl Default for DiagnosticThresholds {
    fn default() -> Self {
        Self {
            memory_trend_warn: 1.2,
            memory_trend_fail: 1.5,
            tool_call_pass: 0.6,
            tool_call_warn: 0.5,
            decision_quality_pass: 0.5,
            decision_quality_warn: 0.4,
            disk_pass_mib: 2000,
            disk_warn_mib: 1000,
        }
    }
}

/// Raw signals the engine reasons over; the supervisor supplies a concrete
/// implementation backed by the child's log, agent state, and the synthetic
/// prober's last result.
pub trait DiagnosticInputs: Send + Sync {
    /// (successes, failures) parsed from the agent log's tool-call pattern matches.
    fn tool_call_counts(&self) -> (u64, u64);
    /// (wins, losses) over resolved bets in agent state.
    fn decision_outcomes(&self) -> (u64, u64);
    /// `None` when no probe has run yet ("n/a" -> WARN).
    fn external_services_healthy(&self) -> Option<bool>;
    fn agent_directory(&self) -> &Path;
}

pub struct DiagnosticEngine<C: Clock = SystemClock> {
    memory_samples: Mutex<BoundedHistory<MemorySample>>,
    thresholds: DiagnosticThresholds,
    inputs: Arc<dyn DiagnosticInputs>,
    observer: Arc<dyn SupervisorObserver>,
    reports_dir: PathBuf,
    clock: C,
}

impl DiagnosticEngine<SystemClock> {
    pub fn new(reports_dir: impl Into<PathBuf>, inputs: Arc<dyn DiagnosticInputs>, observer: Arc<dyn SupervisorObserver>) -> Self {
        Self::with_clock(reports_dir, inputs, observer, DiagnosticThresholds::default(), SystemClock)
    }
}

impl<C: Clock> DiagnosticEngine<C> {
    pub fn with_clock(
        reports_dir: impl Into<PathBuf>,
        inputs: Arc<dyn DiagnosticInputs>,
        observer: Arc<dyn SupervisorObserver>,
        thresholds: DiagnosticThresholds,
        clock: C,
    ) -> Self {
        Self {
            memory_samples: Mutex::new(BoundedHistory::new(12)), // 1h at a 5-min tick
            thresholds,
            inputs,
            observer,
            reports_dir: reports_dir.into(),
            clock,
        }
    }

    /// Called by the 5-minute memory-sampling ticker.
    pub fn sample_memory(&self, heap_used_bytes: u64) {
        let now_ms = self.clock.now_ms();
        let mut samples = self.memory_samples.lock();
        samples.push(MemorySample {
            timestamp_ms: now_ms,
            heap_used_bytes,
        });
        let window_start = now_ms.saturating_sub(MEMORY_SAMPLE_WINDOW_MS);
        samples.retain(|s| s.timestamp_ms >= window_start);
    }

    fn check_memory_trend(&self) -> DiagnosticCheck {
        let samples = self.memory_samples.lock();
        let ratio = match (samples.as_slice().first(), samples.as_slice().last()) {
            (Some(first), Some(last)) if first.heap_used_bytes > 0 => last.heap_used_bytes as f64 / first.heap_used_bytes as f64,
            _ => 1.0,
        };
        let (status, action) = if ratio > self.thresholds.memory_trend_fail {
            (CheckStatus::Fail, RemediationAction::RestartAgent)
        } else if ratio > self.thresholds.memory_trend_warn {
            (CheckStatus::Warn, RemediationAction::None)
        } else {
            (CheckStatus::Pass, RemediationAction::None)
        };
        DiagnosticCheck {
            name: CheckName::MemoryTrend,
            status,
            detail: format!("heap growth ratio {ratio:.2} over last {} samples", samples.len()),
            action,
        }
    }

    fn check_tool_call_efficiency(&self) -> DiagnosticCheck {
        let (success, failure) = self.inputs.tool_call_counts();
        let total = success + failure;
        let ratio = if total == 0 { 1.0 } else { success as f64 / total as f64 };
        let (status, action) = if ratio >= self.thresholds.tool_call_pass {
            (CheckStatus::Pass, RemediationAction::None)
        } else if ratio >= self.thresholds.tool_call_warn {
            (CheckStatus::Warn, RemediationAction::None)
        } else {
            (CheckStatus::Fail, RemediationAction::ReviewPrompt)
        };
        DiagnosticCheck {
            name: CheckName::ToolCallEfficiency,
            status,
            detail: format!("{success}/{total} tool calls succeeded"),
            action,
        }
    }

    fn check_decision_quality(&self) -> DiagnosticCheck {
        let (wins, losses) = self.inputs.decision_outcomes();
        let total = wins + losses;
        let ratio = if total == 0 { 1.0 } else { wins as f64 / total as f64 };
        let (status, action) = if ratio >= self.thresholds.decision_quality_pass {
            (CheckStatus::Pass, RemediationAction::None)
        } else if ratio >= self.thresholds.decision_quality_warn {
            (CheckStatus::Warn, RemediationAction::None)
        } else {
            (CheckStatus::Fail, RemediationAction::AdjustStrategy)
        };
        DiagnosticCheck {
            name: CheckName::DecisionQuality,
            status,
            detail: format!("{wins}/{total} resolved bets won"),
            action,
        }
    }

    fn check_external_services(&self) -> DiagnosticCheck {
        let (status, detail, action) = match self.inputs.external_services_healthy() {
            Some(true) => (CheckStatus::Pass, "market API, RPC, and backend all up".to_string(), RemediationAction::None),
            Some(false) => (CheckStatus::Fail, "at least one dependency probe failed".to_string(), RemediationAction::EnableFallbacks),
            None => (CheckStatus::Warn, "no probe has run yet".to_string(), RemediationAction::None),
        };
        DiagnosticCheck {
            name: CheckName::ExternalServices,
            status,
            detail,
            action,
        }
    }

    fn check_disk_space(&self) -> DiagnosticCheck {
        let free_mib = fs2::free_space(self.inputs.agent_directory()).map(|bytes| bytes / MIB).unwrap_or(0);
        let (status, action) = if free_mib >= self.thresholds.disk_pass_mib {
            (CheckStatus::Pass, RemediationAction::None)
        } else if free_mib >= self.thresholds.disk_warn_mib {
            (CheckStatus::Warn, RemediationAction::None)
        } else {
            (CheckStatus::Fail, RemediationAction::CleanupOldData)
        };
        DiagnosticCheck {
            name: CheckName::DiskSpace,
            status,
            detail: format!("{free_mib} MiB free"),
            action,
        }
    }

    /// Run all five checks, execute FAIL remediations in-process, persist
    /// the report, and prune reports older than 7 days.
    pub fn run_diagnostics(&self) -> DiagnosticReport {
        let checks = vec![
            self.check_memory_trend(),
            self.check_tool_call_efficiency(),
            self.check_decision_quality(),
            self.check_external_services(),
            self.check_disk_space(),
        ];
        let overall_status = OverallStatus::from_checks(&checks);

        let mut actions_executed = Vec::new();
        for check in &checks {
            if check.status != CheckStatus::Fail || check.action == RemediationAction::None {
                continue;
            }
            match check.action {
                RemediationAction::CleanupOldData => self.cleanup_old_data(),
                other => self.observer.on_remediation(&format!("{other:?}"), &check.detail),
            }
            actions_executed.push(check.action);
        }

        let report = DiagnosticReport {
            timestamp_ms: self.clock.now_ms(),
            checks,
            overall_status,
            actions_executed,
        };
        self.persist_report(&report);
        self.prune_old_reports();
        report
    }

    fn cleanup_old_data(&self) {
        let now_ms = self.clock.now_ms();
        let cutoff = now_ms.saturating_sub(REPORT_RETENTION_MS);
        let research_dir = self.inputs.agent_directory().join("research");
        remove_older_than(&research_dir, cutoff);
        remove_older_than(&self.reports_dir, cutoff);
    }

    fn persist_report(&self, report: &DiagnosticReport) {
        let path = self.reports_dir.join(format!("report-{}.json", report.timestamp_ms));
        if let Err(e) = vigil_storage::save(&path, report) {
            tracing::warn!(error = %e, "failed to persist diagnostic report");
        }
    }

    fn prune_old_reports(&self) {
        let now_ms = self.clock.now_ms();
        let cutoff = now_ms.saturating_sub(REPORT_RETENTION_MS);
        remove_older_than(&self.reports_dir, cutoff);
    }
}

fn remove_older_than(dir: &Path, cutoff_ms: u64) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        let age_ms = modified.duration_since(std::time::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(u64::MAX);
        if age_ms < cutoff_ms {
            let path = entry.path();
            let result = if metadata.is_dir() { fs::remove_dir_all(&path) } else { fs::remove_file(&path) };
            if let Err(e) = result {
                tracing::warn!(path = %path.display(), error = %e, "failed to prune old diagnostic data");
            }
        }
    }
}

#[cfg(test)]
#[path = "diagnostic_engine_tests.rs"]
mod tests;
