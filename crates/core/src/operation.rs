// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic operation fingerprinting for the idempotency cache (§3, §4.5).
//!
//! `operation_id` is `{action}-{sha256(canonical_json(params))[:16]}` where
//! canonical JSON sorts map keys recursively so the fingerprint is stable
//! regardless of field insertion order.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    pub operation_id: String,
    pub result: Value,
    pub stored_at_ms: u64,
}

/// Recursively sort object keys so two semantically-equal JSON values with
/// different field order hash identically.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

pub fn canonical_json(value: &Value) -> String {
    serde_json::to_string(&canonicalize(value)).unwrap_or_default()
}

/// Compute the deterministic operation id for an action + parameter set.
pub fn operation_id(action: &str, params: &Value) -> String {
    let canonical = canonical_json(params);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    format!("{action}-{}", &hex[..16])
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
