// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child process adapter (§6, §4.15): owns the `claude-code` subprocess --
//! spawning it with piped stdio and escalating a graceful stop to a forced
//! kill. Shared by the supervisor's context-clear sequence (§4.13) and the
//! watchdog's unhealthy-process recovery (§4.14).

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

pub const GRACEFUL_STOP_WAIT: Duration = Duration::from_secs(5);
pub const FORCE_KILL_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ChildAdapterError {
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("signal failed: {0}")]
    SignalFailed(String),
}

/// Everything the supervisor forwards to the child on spawn (§6): working
/// directory plus wallet address, capital, risk profile, research-terminal
/// count, research interval, and subscription tier as environment.
#[derive(Debug, Clone)]
pub struct ChildSpawnConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

/// A spawned child. Owns the piped stdio so the caller can tail stdout and
/// stderr directly into `agent.log` (§4.15, §5).
pub struct ChildHandle {
    pub pid: u32,
    child: Child,
}

impl ChildHandle {
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.child.stderr.take()
    }

    /// Clean exit code 0 is accepted as intentional stop (§6).
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }
}

#[async_trait]
pub trait ChildAdapter: Send + Sync + 'static {
    async fn spawn(&self, config: ChildSpawnConfig) -> Result<ChildHandle, ChildAdapterError>;
}

/// Signal 0 liveness check (§4.14 step 2), independent of any `ChildAdapter`
/// instance so the watchdog can use it on a PID it only knows from disk.
pub fn is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

fn send_signal(pid: u32, sig: Signal) -> Result<(), ChildAdapterError> {
    match signal::kill(Pid::from_raw(pid as i32), sig) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(ChildAdapterError::SignalFailed(e.to_string())),
    }
}

/// Graceful-stop escalation: SIGTERM, wait `term_wait`, SIGKILL if still
/// alive, wait `kill_wait`. Used for both the context-clear sequence
/// (5s/1s, §4.13) and the watchdog's unhealthy-process teardown (1s/none,
/// §4.14).
pub async fn terminate(pid: u32, term_wait: Duration, kill_wait: Duration) -> Result<(), ChildAdapterError> {
    send_signal(pid, Signal::SIGTERM)?;
    tokio::time::sleep(term_wait).await;
    if is_alive(pid) {
        send_signal(pid, Signal::SIGKILL)?;
        tokio::time::sleep(kill_wait).await;
    }
    Ok(())
}

pub struct TokioChildAdapter;

#[async_trait]
impl ChildAdapter for TokioChildAdapter {
    async fn spawn(&self, config: ChildSpawnConfig) -> Result<ChildHandle, ChildAdapterError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .current_dir(&config.working_dir)
            .envs(config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| ChildAdapterError::SpawnFailed(e.to_string()))?;
        let pid = child.id().ok_or_else(|| ChildAdapterError::SpawnFailed("child exited before its pid could be read".to_string()))?;

        Ok(ChildHandle { pid, child })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every spawn request; the wrapped adapter still does the real
    /// spawn (there's no portable no-op `Child` to hand back).
    pub struct FakeChildAdapter {
        inner: TokioChildAdapter,
        pub spawned: Arc<Mutex<Vec<ChildSpawnConfig>>>,
    }

    impl Default for FakeChildAdapter {
        fn default() -> Self {
            Self {
                inner: TokioChildAdapter,
                spawned: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl ChildAdapter for FakeChildAdapter {
        async fn spawn(&self, config: ChildSpawnConfig) -> Result<ChildHandle, ChildAdapterError> {
            self.spawned.lock().push(config.clone());
            self.inner.spawn(config).await
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeChildAdapter;

#[cfg(test)]
#[path = "child_tests.rs"]
mod tests;
