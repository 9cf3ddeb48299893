// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synthetic prober (§4.11): four independent, 5-second-timeout probes run
//! every 10 minutes, feeding the service guard's fallback switch.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use vigil_core::{evaluate_trade, TradeMethod};
use vigil_resilience::{ServiceGuard, BASE_RPC, POLYMARKET_API};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const SYNTHETIC_MARKET_COUNT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub status: ProbeStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub market_fetch: ProbeOutcome,
    pub score_calculation: ProbeOutcome,
    pub state_persistence: ProbeOutcome,
    pub rpc_health: ProbeOutcome,
}

impl ProbeReport {
    pub fn all_passed(&self) -> bool {
        [&self.market_fetch, &self.score_calculation, &self.state_persistence, &self.rpc_health]
            .into_iter()
            .all(|o| o.status == ProbeStatus::Pass)
    }
}

fn outcome(result: Result<Result<(), String>, tokio::time::error::Elapsed>) -> ProbeOutcome {
    match result {
        Ok(Ok(())) => ProbeOutcome {
            status: ProbeStatus::Pass,
            detail: "ok".to_string(),
        },
        Ok(Err(e)) => ProbeOutcome {
            status: ProbeStatus::Fail,
            detail: e,
        },
        Err(_) => ProbeOutcome {
            status: ProbeStatus::Fail,
            detail: "timed out after 5s".to_string(),
        },
    }
}

pub struct SyntheticProber {
    guard: Arc<ServiceGuard>,
    http: reqwest::Client,
    market_url: String,
    rpc_url: String,
    scratch_dir: PathBuf,
}

impl SyntheticProber {
    pub fn new(guard: Arc<ServiceGuard>, market_url: impl Into<String>, rpc_url: impl Into<String>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            guard,
            http: reqwest::Client::new(),
            market_url: market_url.into(),
            rpc_url: rpc_url.into(),
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Run all four probes in parallel and enable fallbacks for any
    /// dependency whose probe failed.
    pub async fn run_probes(&self) -> ProbeReport {
        let (market, score, state, rpc) = tokio::join!(
            tokio::time::timeout(PROBE_TIMEOUT, self.probe_market_fetch()),
            tokio::time::timeout(PROBE_TIMEOUT, self.probe_score_calculation()),
            tokio::time::timeout(PROBE_TIMEOUT, self.probe_state_persistence()),
            tokio::time::timeout(PROBE_TIMEOUT, self.probe_rpc_health()),
        );

        let report = ProbeReport {
            market_fetch: outcome(market),
            score_calculation: outcome(score),
            state_persistence: outcome(state),
            rpc_health: outcome(rpc),
        };

        let mut degraded = Vec::new();
        if report.market_fetch.status == ProbeStatus::Fail {
            degraded.push(POLYMARKET_API);
        }
        if report.rpc_health.status == ProbeStatus::Fail {
            degraded.push(BASE_RPC);
        }
        if !degraded.is_empty() {
            self.guard.enable_fallbacks(&degraded);
        }

        report
    }

    async fn probe_market_fetch(&self) -> Result<(), String> {
        let response = self.http.get(&self.market_url).send().await.map_err(|e| e.to_string())?;
        let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        if body.is_array() {
            Ok(())
        } else {
            Err("market endpoint did not return a JSON array".to_string())
        }
    }

    /// Exercises `evaluate_trade` (§8 property 9) over synthetic inputs as a
    /// stand-in for the real scoring kernel, which is out of scope here.
    async fn probe_score_calculation(&self) -> Result<(), String> {
        let mut rng = rand::thread_rng();
        for _ in 0..SYNTHETIC_MARKET_COUNT {
            let entry: i128 = rng.gen_range(1..1_000_000);
            let exit: i128 = rng.gen_range(1..1_000_000);
            let _ = evaluate_trade(entry, Some(exit), TradeMethod::Up(5));
        }
        Ok(())
    }

    async fn probe_state_persistence(&self) -> Result<(), String> {
        let mut rng = rand::thread_rng();
        let path = self.scratch_dir.join(format!("probe-{:x}.tmp", rng.gen::<u64>()));
        let blob: Vec<u8> = (0..256).map(|_| rng.gen()).collect();

        tokio::fs::create_dir_all(&self.scratch_dir).await.map_err(|e| e.to_string())?;
        tokio::fs::write(&path, &blob).await.map_err(|e| e.to_string())?;
        let read_back = tokio::fs::read(&path).await.map_err(|e| e.to_string())?;
        let _ = tokio::fs::remove_file(&path).await;

        if read_back == blob {
            Ok(())
        } else {
            Err("round-tripped blob did not match what was written".to_string())
        }
    }

    async fn probe_rpc_health(&self) -> Result<(), String> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": ["0x0000000000000000000000000000000000000000", "latest"],
        });
        let response = self.http.post(&self.rpc_url).json(&body).send().await.map_err(|e| e.to_string())?;
        let json: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        match json.get("result").and_then(|r| r.as_str()) {
            Some(hex) if hex.starts_with("0x") => Ok(()),
            _ => Err("RPC response missing a 0x-prefixed result".to_string()),
        }
    }
}

#[cfg(test)]
#[path = "prober_tests.rs"]
mod tests;
