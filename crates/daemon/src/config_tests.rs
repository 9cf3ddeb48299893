// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for key in [
        "VIGIL_BOT_ROOT",
        "VIGIL_HTTP_PORT",
        "VIGIL_CHILD_COMMAND",
        "VIGIL_PROMPT_FILE",
        "VIGIL_MARKET_URL",
        "VIGIL_RPC_URL",
        "VIGIL_WALLET_ADDRESS",
        "VIGIL_CAPITAL",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn load_falls_back_to_defaults_when_unset() {
    clear_env();
    std::env::set_var("VIGIL_BOT_ROOT", "/tmp/vigil-test-root");

    let config = Config::load().unwrap();

    assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
    assert_eq!(config.child_command, DEFAULT_CHILD_COMMAND);
    assert_eq!(config.agent_dir, PathBuf::from("/tmp/vigil-test-root/agent"));
    assert_eq!(config.logs_dir, PathBuf::from("/tmp/vigil-test-root/logs"));
    assert!(config.child_env.is_empty());
    clear_env();
}

#[test]
#[serial]
fn load_forwards_whitelisted_child_env() {
    clear_env();
    std::env::set_var("VIGIL_BOT_ROOT", "/tmp/vigil-test-root");
    std::env::set_var("VIGIL_WALLET_ADDRESS", "0xabc");
    std::env::set_var("VIGIL_CAPITAL", "1000");

    let config = Config::load().unwrap();

    assert!(config.child_env.contains(&("WALLET_ADDRESS".to_string(), "0xabc".to_string())));
    assert!(config.child_env.contains(&("TOTAL_CAPITAL".to_string(), "1000".to_string())));
    clear_env();
}

#[test]
#[serial]
fn load_rejects_non_integer_http_port() {
    clear_env();
    std::env::set_var("VIGIL_BOT_ROOT", "/tmp/vigil-test-root");
    std::env::set_var("VIGIL_HTTP_PORT", "not-a-number");

    assert!(matches!(Config::load(), Err(ConfigError::InvalidInt("VIGIL_HTTP_PORT"))));
    clear_env();
}

#[test]
fn path_helpers_are_rooted_under_agent_dir() {
    let config = Config {
        bot_root: PathBuf::from("/bot"),
        agent_dir: PathBuf::from("/bot/agent"),
        logs_dir: PathBuf::from("/bot/logs"),
        diagnostics_dir: PathBuf::from("/bot/agent/diagnostics"),
        http_port: DEFAULT_HTTP_PORT,
        child_command: DEFAULT_CHILD_COMMAND.to_string(),
        child_args: Vec::new(),
        child_env: Vec::new(),
        market_url: DEFAULT_MARKET_URL.to_string(),
        rpc_url: DEFAULT_RPC_URL.to_string(),
        supervisor_binary: DEFAULT_SUPERVISOR_BINARY.to_string(),
    };

    assert_eq!(config.task_queue_path(), PathBuf::from("/bot/agent/task-queue.json"));
    assert_eq!(config.crash_log_path(), PathBuf::from("/bot/agent/crash-log.json"));
    assert_eq!(config.agent_log_path(), PathBuf::from("/bot/logs/agent.log"));
}
