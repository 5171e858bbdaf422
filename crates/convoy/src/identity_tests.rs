// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn static_gate_accepts_matching_token() {
    let gate = StaticTokenGate::new("secret", "u1");
    assert_eq!(gate.verify("secret").await, Ok("u1".to_owned()));
}

#[tokio::test]
async fn static_gate_rejects_mismatched_token() {
    let gate = StaticTokenGate::new("secret", "u1");
    assert_eq!(gate.verify("wrong").await, Err(ConvoyError::Unauthenticated));
}

#[tokio::test]
async fn static_gate_rejects_different_length_token() {
    let gate = StaticTokenGate::new("secret", "u1");
    assert_eq!(gate.verify("longer-than-secret").await, Err(ConvoyError::Unauthenticated));
}

#[test]
fn constant_time_eq_matches_equal_strings() {
    assert!(constant_time_eq("abc", "abc"));
    assert!(!constant_time_eq("abc", "abd"));
    assert!(!constant_time_eq("abc", "ab"));
}
