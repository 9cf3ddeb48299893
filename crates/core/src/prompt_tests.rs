// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_changes_reports_empty() {
    assert!(PromptChanges::default().is_empty());
}

#[test]
fn non_empty_changes_reports_not_empty() {
    let mut changes = PromptChanges::default();
    changes.additions.push("hint".into());
    assert!(!changes.is_empty());
}

#[test]
fn prompt_version_round_trips() {
    let version = PromptVersion {
        version: 2,
        timestamp_ms: 10,
        changes: PromptChanges {
            additions: vec!["avoid peak hours".into()],
            simplifications: vec![],
            removals: vec![],
        },
        reason: "pattern detected".into(),
        content: "base prompt".into(),
    };
    let json = serde_json::to_string(&version).unwrap();
    let back: PromptVersion = serde_json::from_str(&json).unwrap();
    assert_eq!(version, back);
}
