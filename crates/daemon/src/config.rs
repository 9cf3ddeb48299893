// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor configuration (§6): paths derived from the bot root, plus
//! everything forwarded to the child's environment. Sourced entirely from
//! environment variables -- config-file formats are out of scope.

use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_HTTP_PORT: u16 = 3333;
const DEFAULT_CHILD_COMMAND: &str = "claude-code";
const DEFAULT_MARKET_URL: &str = "https://clob.polymarket.com/markets";
const DEFAULT_RPC_URL: &str = "https://mainnet.base.org";
const DEFAULT_SUPERVISOR_BINARY: &str = "vigild";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be a valid integer")]
    InvalidInt(&'static str),
}

/// Env vars forwarded into the child's process environment verbatim,
/// paired with the name the child sees them under (§6).
const CHILD_ENV_FORWARDING: &[(&str, &str)] = &[
    ("VIGIL_WALLET_ADDRESS", "WALLET_ADDRESS"),
    ("VIGIL_CAPITAL", "TOTAL_CAPITAL"),
    ("VIGIL_RISK_PROFILE", "RISK_PROFILE"),
    ("VIGIL_RESEARCH_TERMINAL_COUNT", "RESEARCH_TERMINAL_COUNT"),
    ("VIGIL_RESEARCH_INTERVAL_MS", "RESEARCH_INTERVAL_MS"),
    ("VIGIL_SUBSCRIPTION_TIER", "SUBSCRIPTION_TIER"),
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_root: PathBuf,
    pub agent_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
    pub http_port: u16,
    pub child_command: String,
    pub child_args: Vec<String>,
    pub child_env: Vec<(String, String)>,
    pub market_url: String,
    pub rpc_url: String,
    /// The `vigild` binary the watchdog respawns on an unhealthy supervisor.
    /// Resolved from `PATH` by default; only overridden in tests.
    pub supervisor_binary: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let bot_root = std::env::var("VIGIL_BOT_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let agent_dir = bot_root.join("agent");
        let logs_dir = bot_root.join("logs");
        let diagnostics_dir = agent_dir.join("diagnostics");

        let http_port = match std::env::var("VIGIL_HTTP_PORT") {
            Ok(v) => v.parse().map_err(|_| ConfigError::InvalidInt("VIGIL_HTTP_PORT"))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let child_command = std::env::var("VIGIL_CHILD_COMMAND").unwrap_or_else(|_| DEFAULT_CHILD_COMMAND.to_string());
        let mut child_args = vec!["--mode".to_string(), "dontAsk".to_string()];
        if let Ok(prompt_file) = std::env::var("VIGIL_PROMPT_FILE") {
            child_args.push("--prompt-file".to_string());
            child_args.push(prompt_file);
        }

        let child_env = CHILD_ENV_FORWARDING
            .iter()
            .filter_map(|(var_name, env_key)| std::env::var(var_name).ok().map(|v| (env_key.to_string(), v)))
            .collect();

        let market_url = std::env::var("VIGIL_MARKET_URL").unwrap_or_else(|_| DEFAULT_MARKET_URL.to_string());
        let rpc_url = std::env::var("VIGIL_RPC_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let supervisor_binary = std::env::var("VIGIL_SUPERVISOR_BIN").unwrap_or_else(|_| DEFAULT_SUPERVISOR_BINARY.to_string());

        Ok(Self {
            bot_root,
            agent_dir,
            logs_dir,
            diagnostics_dir,
            http_port,
            child_command,
            child_args,
            child_env,
            market_url,
            rpc_url,
            supervisor_binary,
        })
    }

    pub fn supervisor_state_path(&self) -> PathBuf {
        self.agent_dir.join("supervisor-state.json")
    }

    pub fn agent_state_path(&self) -> PathBuf {
        self.agent_dir.join("agent-state.json")
    }

    pub fn watchdog_state_path(&self) -> PathBuf {
        self.agent_dir.join("watchdog-state.json")
    }

    pub fn idempotency_cache_path(&self) -> PathBuf {
        self.agent_dir.join("idempotency-cache.json")
    }

    pub fn dead_letters_path(&self) -> PathBuf {
        self.agent_dir.join("dead-letters.json")
    }

    pub fn failure_history_path(&self) -> PathBuf {
        self.agent_dir.join("failure-history.json")
    }

    pub fn prompt_evolution_path(&self) -> PathBuf {
        self.agent_dir.join("prompt-evolution.json")
    }

    pub fn task_queue_path(&self) -> PathBuf {
        self.agent_dir.join("task-queue.json")
    }

    pub fn crash_log_path(&self) -> PathBuf {
        self.agent_dir.join("crash-log.json")
    }

    pub fn agent_log_path(&self) -> PathBuf {
        self.logs_dir.join("agent.log")
    }

    pub fn daemon_log_path(&self) -> PathBuf {
        self.logs_dir.join("vigild.log")
    }

    pub fn watchdog_log_path(&self) -> PathBuf {
        self.logs_dir.join("watchdog.log")
    }

    pub fn structured_log_path(&self) -> PathBuf {
        self.logs_dir.join("structured.jsonl")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
