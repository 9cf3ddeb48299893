// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vigil-watchdog: the independent backstop process (component N). Polls
//! the child's heartbeat file and the supervisor's recorded PID, and
//! respawns `vigild` when both point to an unhealthy system.

use tracing::info;
use vigil_daemon::watchdog::Watchdog;
use vigil_daemon::{logging, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("vigil-watchdog {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("vigil-watchdog {}", env!("CARGO_PKG_VERSION"));
                println!("Independent backstop that respawns vigild on an unhealthy supervisor.");
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let _log_guard = logging::init(&config.watchdog_log_path())?;

    info!(bot_root = %config.bot_root.display(), "starting vigil-watchdog");

    let watchdog = Watchdog::new(config);
    watchdog.run().await;
}
