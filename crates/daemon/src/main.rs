// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! vigild: the supervisor process (component O). Owns the trading agent
//! child's whole lifecycle and serves `/health` and `/metrics` on the
//! loopback port.

use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use vigil_daemon::supervisor::{Supervisor, TracingObserver};
use vigil_daemon::{logging, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("vigild {}", env!("CARGO_PKG_VERSION"));
                println!("Resilience supervisor for the trading agent child process.");
                println!("Configured entirely via VIGIL_* environment variables (see README).");
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    let _log_guard = logging::init(&config.daemon_log_path())?;

    info!(bot_root = %config.bot_root.display(), "starting vigild");

    let supervisor = Arc::new(Supervisor::new(config.clone(), Arc::new(TracingObserver)));

    let http_state = supervisor.http_state();
    let router = vigil_daemon::http::router(http_state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.http_port)).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "http server exited");
        }
    });

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let run_handle = tokio::spawn(supervisor.clone().run());

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    supervisor.request_shutdown();
    let _ = run_handle.await;
    info!("vigild stopped");
    Ok(())
}
