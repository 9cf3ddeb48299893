// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;
use vigil_core::LogLevel;

fn line(message: &str) -> LogLine {
    LogLine {
        correlation_id: None,
        timestamp: "2026-01-01T00:00:00Z".into(),
        level: LogLevel::Info,
        message: message.into(),
        data: None,
    }
}

#[test]
fn append_writes_one_json_object_per_line() {
    let dir = tempdir().unwrap();
    let logger = JsonlLogger::open(dir.path().join("structured.jsonl")).unwrap();
    logger.append(&line("first")).unwrap();
    logger.append(&line("second")).unwrap();

    let contents = std::fs::read_to_string(logger.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("first"));
    assert!(lines[1].contains("second"));
}

#[test]
fn rotation_keeps_at_most_max_files_and_caps_live_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("structured.jsonl");
    // tiny limit so a handful of lines force several rotations
    let logger = JsonlLogger::with_limits(&path, 64, 3).unwrap();

    for i in 0..200 {
        logger.append(&line(&format!("line-{i}"))).unwrap();
    }

    assert!(path.exists());
    for n in 1..=3u32 {
        let rotated = dir.path().join(format!("structured.jsonl.{n}"));
        assert!(rotated.exists(), "expected rotated file .{n} to exist");
    }
    assert!(!dir.path().join("structured.jsonl.4").exists());
}

#[test]
fn rotation_failure_does_not_fail_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("structured.jsonl");
    let logger = JsonlLogger::with_limits(&path, 1, 5).unwrap();
    // First append always succeeds even though the file is already "oversized"
    // relative to the tiny limit on the next call.
    assert!(logger.append(&line("a")).is_ok());
    assert!(logger.append(&line("b")).is_ok());
}
