// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn classifies_timeout() {
    assert_eq!(ErrorCategory::classify("request timeout after 5s"), ErrorCategory::Timeout);
}

#[test]
fn classifies_connection_refused() {
    assert_eq!(
        ErrorCategory::classify("dial tcp: connection refused"),
        ErrorCategory::ConnectionRefused
    );
}

#[test]
fn classifies_insufficient_funds() {
    assert_eq!(
        ErrorCategory::classify("INSUFFICIENT_FUNDS: balance too low"),
        ErrorCategory::InsufficientFunds
    );
}

#[test]
fn classifies_contract_revert() {
    assert_eq!(ErrorCategory::classify("execution reverted"), ErrorCategory::ContractRevert);
}

#[test]
fn classifies_rate_limited() {
    assert_eq!(ErrorCategory::classify("got 429 rate limited"), ErrorCategory::RateLimited);
}

#[test]
fn falls_back_to_unknown() {
    assert_eq!(ErrorCategory::classify("something weird happened"), ErrorCategory::Unknown);
}
