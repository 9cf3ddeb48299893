// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn log_level_serializes_uppercase() {
    assert_eq!(serde_json::to_string(&LogLevel::Warn).unwrap(), "\"WARN\"");
}

#[test]
fn log_line_omits_data_when_none() {
    let line = LogLine {
        correlation_id: Some("op-1".into()),
        timestamp: "2026-01-01T00:00:00Z".into(),
        level: LogLevel::Info,
        message: "hello".into(),
        data: None,
    };
    let json = serde_json::to_string(&line).unwrap();
    assert!(!json.contains("\"data\""));
}

#[test]
fn log_line_includes_data_when_present() {
    let line = LogLine {
        correlation_id: None,
        timestamp: "2026-01-01T00:00:00Z".into(),
        level: LogLevel::Error,
        message: "boom".into(),
        data: Some(serde_json::json!({"taskId": "t-1"})),
    };
    let json = serde_json::to_string(&line).unwrap();
    assert!(json.contains("\"taskId\":\"t-1\""));
}
