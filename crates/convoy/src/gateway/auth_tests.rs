// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::body::Body;
use axum::http::Request;

use super::*;

fn request_with_auth(header: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/journeys");
    if let Some(header) = header {
        builder = builder.header("authorization", header);
    }
    builder.body(Body::empty()).unwrap()
}

#[test]
fn bearer_token_extracts_suffix() {
    let req = request_with_auth(Some("Bearer abc123"));
    assert_eq!(bearer_token(&req).unwrap(), "abc123");
}

#[test]
fn bearer_token_rejects_missing_header() {
    let req = request_with_auth(None);
    assert_eq!(bearer_token(&req).unwrap_err(), ConvoyError::Unauthenticated);
}

#[test]
fn bearer_token_rejects_non_bearer_scheme() {
    let req = request_with_auth(Some("Basic abc123"));
    assert_eq!(bearer_token(&req).unwrap_err(), ConvoyError::Unauthenticated);
}
