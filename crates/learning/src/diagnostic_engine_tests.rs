// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Mutex as StdMutex;
use tempfile::tempdir;
use vigil_core::{FakeClock, NoopObserver};

struct FixedInputs {
    tool_calls: (u64, u64),
    decisions: (u64, u64),
    external: Option<bool>,
    dir: PathBuf,
}

impl DiagnosticInputs for FixedInputs {
    fn tool_call_counts(&self) -> (u64, u64) {
        self.tool_calls
    }
    fn decision_outcomes(&self) -> (u64, u64) {
        self.decisions
    }
    fn external_services_healthy(&self) -> Option<bool> {
        self.external
    }
    fn agent_directory(&self) -> &Path {
        &self.dir
    }
}

struct RemediationRecorder {
    actions: StdMutex<Vec<String>>,
}

impl SupervisorObserver for RemediationRecorder {
    fn on_remediation(&self, action: &str, _detail: &str) {
        self.actions.lock().unwrap().push(action.to_string());
    }
}

fn healthy_inputs(dir: &Path) -> Arc<FixedInputs> {
    Arc::new(FixedInputs {
        tool_calls: (9, 1),
        decisions: (6, 4),
        external: Some(true),
        dir: dir.to_path_buf(),
    })
}

#[test]
fn all_pass_is_healthy_with_no_actions() {
    let dir = tempdir().unwrap();
    let inputs = healthy_inputs(dir.path());
    let engine = DiagnosticEngine::with_clock(
        dir.path().join("diagnostics"),
        inputs,
        Arc::new(NoopObserver),
        DiagnosticThresholds::default(),
        FakeClock::new(1_000),
    );

    let report = engine.run_diagnostics();
    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert!(report.actions_executed.is_empty());
}

#[test]
fn low_tool_call_success_rate_fails_and_requests_prompt_review() {
    let dir = tempdir().unwrap();
    let inputs = Arc::new(FixedInputs {
        tool_calls: (2, 8),
        decisions: (6, 4),
        external: Some(true),
        dir: dir.path().to_path_buf(),
    });
    let recorder = Arc::new(RemediationRecorder { actions: StdMutex::new(Vec::new()) });
    let engine = DiagnosticEngine::with_clock(
        dir.path().join("diagnostics"),
        inputs,
        recorder.clone(),
        DiagnosticThresholds::default(),
        FakeClock::new(1_000),
    );

    let report = engine.run_diagnostics();
    let check = report.checks.iter().find(|c| c.name == CheckName::ToolCallEfficiency).unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.action, RemediationAction::ReviewPrompt);
    assert_eq!(recorder.actions.lock().unwrap().as_slice(), ["ReviewPrompt"]);
}

#[test]
fn memory_growth_past_threshold_fails_and_requests_restart() {
    let dir = tempdir().unwrap();
    let inputs = healthy_inputs(dir.path());
    let engine = DiagnosticEngine::with_clock(
        dir.path().join("diagnostics"),
        inputs,
        Arc::new(NoopObserver),
        DiagnosticThresholds::default(),
        FakeClock::new(0),
    );

    engine.sample_memory(100);
    engine.sample_memory(200);

    let report = engine.run_diagnostics();
    let check = report.checks.iter().find(|c| c.name == CheckName::MemoryTrend).unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.action, RemediationAction::RestartAgent);
}

#[test]
fn external_services_down_enables_fallbacks() {
    let dir = tempdir().unwrap();
    let inputs = Arc::new(FixedInputs {
        tool_calls: (9, 1),
        decisions: (6, 4),
        external: Some(false),
        dir: dir.path().to_path_buf(),
    });
    let engine = DiagnosticEngine::with_clock(
        dir.path().join("diagnostics"),
        inputs,
        Arc::new(NoopObserver),
        DiagnosticThresholds::default(),
        FakeClock::new(0),
    );

    let report = engine.run_diagnostics();
    let check = report.checks.iter().find(|c| c.name == CheckName::ExternalServices).unwrap();
    assert_eq!(check.status, CheckStatus::Fail);
    assert_eq!(check.action, RemediationAction::EnableFallbacks);
}

#[test]
fn report_is_persisted_under_reports_dir() {
    let dir = tempdir().unwrap();
    let inputs = healthy_inputs(dir.path());
    let reports_dir = dir.path().join("diagnostics");
    let engine = DiagnosticEngine::with_clock(reports_dir.clone(), inputs, Arc::new(NoopObserver), DiagnosticThresholds::default(), FakeClock::new(42));

    let report = engine.run_diagnostics();
    let expected = reports_dir.join(format!("report-{}.json", report.timestamp_ms));
    assert!(expected.exists());
}
