// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /health` response shape (§5).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Restarting,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAgent {
    pub pid: Option<u32>,
    pub uptime_ms: u64,
    pub restart_count: u32,
    pub last_restart_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthConfig {
    pub wallet_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub agent: HealthAgent,
    pub config: HealthConfig,
}

/// Shows only the last 4 characters, e.g. `0x...abcd`. A wallet address
/// shorter than that is masked entirely rather than echoed back whole.
pub fn mask_wallet(address: &str) -> String {
    if address.len() <= 4 {
        "...".to_string()
    } else {
        format!("...{}", &address[address.len() - 4..])
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
