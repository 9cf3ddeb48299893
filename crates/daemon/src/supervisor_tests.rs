// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::fs;
use tempfile::tempdir;
use vigil_core::{FakeClock, NoopObserver};

fn config(bot_root: &std::path::Path) -> Config {
    Config {
        bot_root: bot_root.to_path_buf(),
        agent_dir: bot_root.join("agent"),
        logs_dir: bot_root.join("logs"),
        diagnostics_dir: bot_root.join("agent").join("diagnostics"),
        http_port: 3333,
        child_command: "true".to_string(),
        child_args: Vec::new(),
        child_env: vec![("WALLET_ADDRESS".to_string(), "0xabc123".to_string())],
        market_url: "https://example.invalid/markets".to_string(),
        rpc_url: "https://example.invalid/rpc".to_string(),
        supervisor_binary: "true".to_string(),
    }
}

fn supervisor(dir: &std::path::Path) -> Supervisor<FakeClock> {
    Supervisor::with_clock(config(dir), Arc::new(NoopObserver), FakeClock::new(0))
}

#[test]
fn http_state_wires_wallet_address_from_child_env() {
    let dir = tempdir().unwrap();
    let sup = supervisor(dir.path());
    let state = sup.http_state();
    assert_eq!(state.wallet_address.as_deref(), Some("0xabc123"));
}

#[test]
fn sweep_research_terminals_removes_matching_dirs_only() {
    let dir = tempdir().unwrap();
    let sup = supervisor(dir.path());
    fs::create_dir_all(sup.config.agent_dir.join("research-terminal-1")).unwrap();
    fs::create_dir_all(sup.config.agent_dir.join("research-terminal-2")).unwrap();
    fs::create_dir_all(sup.config.agent_dir.join("diagnostics")).unwrap();

    sup.sweep_research_terminals();

    assert!(!sup.config.agent_dir.join("research-terminal-1").exists());
    assert!(!sup.config.agent_dir.join("research-terminal-2").exists());
    assert!(sup.config.agent_dir.join("diagnostics").exists());
}

#[test]
fn apply_matched_bet_accumulates_cumulative_state() {
    let dir = tempdir().unwrap();
    let sup = supervisor(dir.path());
    fs::create_dir_all(&sup.config.agent_dir).unwrap();
    fs::write(
        sup.config.agent_dir.join("MATCHED_BET"),
        "betId: bet-1\npnl: 12.345\ntimestamp: 2026-07-30T00:00:00Z\n",
    )
    .unwrap();

    sup.apply_matched_bet();

    let state = sup.supervisor_state.lock().clone();
    assert_eq!(state.cumulative_bets_matched, 1);
    assert_eq!(state.cumulative_pnl_hundredths, 1235);
    assert_eq!(sup.agent_state.lock().matched_bets.len(), 1);
    assert!(!sup.config.agent_dir.join("MATCHED_BET").exists());
}

#[test]
fn apply_matched_bet_is_a_noop_without_a_signal_file() {
    let dir = tempdir().unwrap();
    let sup = supervisor(dir.path());
    fs::create_dir_all(&sup.config.agent_dir).unwrap();

    sup.apply_matched_bet();

    assert_eq!(sup.supervisor_state.lock().cumulative_bets_matched, 0);
}

#[test]
fn current_rss_bytes_does_not_panic() {
    let _ = current_rss_bytes();
}

#[test]
fn evaluate_prompt_effectiveness_appends_hints_once_thresholds_are_crossed() {
    use vigil_core::{TaskPayload, TaskType};

    let dir = tempdir().unwrap();
    let sup = supervisor(dir.path());
    fs::create_dir_all(&sup.config.agent_dir).unwrap();
    fs::write(
        sup.config.agent_log_path(),
        "[TOOL] ok\n[TOOL_ERROR] boom\n[TOOL_ERROR] boom\n[TOOL_ERROR] boom\n",
    )
    .unwrap();

    for i in 0..6 {
        let id = sup.task_queue.enqueue(
            vigil_core::TaskId::new(format!("research-{i}")),
            TaskType::Research,
            TaskPayload::Research { job_id: format!("j-{i}"), extra: Default::default() },
            1,
        );
        sup.task_queue.claim(&id).unwrap();
        sup.task_queue.fail(&id, "no signal".into()).unwrap();
    }

    let before = sup.prompt_store.current_version();
    sup.evaluate_prompt_effectiveness();
    assert!(sup.prompt_store.current_version() > before);
    assert!(sup.prompt_store.current_content().contains("Adaptive Decision Hints"));
}
