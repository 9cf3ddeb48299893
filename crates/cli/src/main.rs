// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vigil - operator CLI for the resilience supervisor.
//!
//! A thin wrapper: `status` queries the running `vigild`'s HTTP surface,
//! `start`/`stop` launch and signal the `vigild`/`vigil-watchdog` processes.
//! Configuration is sourced the same way the daemon itself sources it
//! (`VIGIL_*` env vars); there is no separate CLI config format.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::process::Stdio;
use vigil_daemon::Config;

#[derive(Parser)]
#[command(name = "vigil", version, about = "Operator CLI for the vigil resilience supervisor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the supervisor's /health response
    Status,
    /// Print the supervisor's /metrics response
    Metrics,
    /// Start vigild and vigil-watchdog as detached background processes
    Start,
    /// Stop the running vigild and vigil-watchdog processes
    Stop,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Status => status(&config).await,
        Commands::Metrics => metrics(&config).await,
        Commands::Start => start(&config),
        Commands::Stop => stop(&config),
    }
}

fn base_url(config: &Config) -> String {
    format!("http://127.0.0.1:{}", config.http_port)
}

async fn status(config: &Config) -> Result<()> {
    let url = format!("{}/health", base_url(config));
    let body: serde_json::Value = reqwest::get(&url)
        .await
        .with_context(|| format!("requesting {url} -- is vigild running?"))?
        .json()
        .await
        .context("parsing /health response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

async fn metrics(config: &Config) -> Result<()> {
    let url = format!("{}/metrics", base_url(config));
    let body: serde_json::Value = reqwest::get(&url)
        .await
        .with_context(|| format!("requesting {url} -- is vigild running?"))?
        .json()
        .await
        .context("parsing /metrics response")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn spawn_detached(command: &str, bot_root: &std::path::Path) -> Result<()> {
    std::process::Command::new(command)
        .current_dir(bot_root)
        .env("VIGIL_BOT_ROOT", bot_root)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {command}"))?;
    Ok(())
}

fn start(config: &Config) -> Result<()> {
    spawn_detached(&config.supervisor_binary, &config.bot_root)?;
    spawn_detached("vigil-watchdog", &config.bot_root)?;
    println!("started vigild and vigil-watchdog under {}", config.bot_root.display());
    Ok(())
}

fn stop(config: &Config) -> Result<()> {
    let state: vigil_core::SupervisorState = vigil_storage::load_or_default(&config.supervisor_state_path());
    let watchdog_state: vigil_daemon::WatchdogState = vigil_storage::load_or_default(&config.watchdog_state_path());

    let mut stopped_any = false;
    if let Some(pid) = watchdog_state.supervisor_pid {
        if vigil_adapters::is_alive(pid) {
            signal_pid(pid)?;
            stopped_any = true;
        }
    }
    if let Some(pid) = state.agent_pid {
        if vigil_adapters::is_alive(pid) {
            signal_pid(pid)?;
            stopped_any = true;
        }
    }

    if stopped_any {
        println!("sent SIGTERM to the supervisor process tree");
        Ok(())
    } else {
        bail!("no running vigild process found for {}", config.bot_root.display())
    }
}

fn signal_pid(pid: u32) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).context("sending SIGTERM")?;
    Ok(())
}
