// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validates a bearer credential on every request or connection and
//! returns a stable user id, or rejects.
//!
//! Credential verification itself is out of scope — this module states the
//! interface and ships two implementations: a shared-secret gate for
//! single-tenant/test deployments, and an HTTP-delegating gate for talking to
//! a real external identity provider.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{ConvoyError, ConvoyResult};

#[async_trait]
pub trait IdentityGate: Send + Sync {
    /// Verify `token` and return the stable user id it identifies.
    async fn verify(&self, token: &str) -> ConvoyResult<String>;
}

/// Constant-time string comparison, to avoid a timing side-channel on token
/// verification.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Verifies a single shared-secret token and maps it to one fixed user id.
///
/// Suitable for single-tenant deployments and for tests; a multi-tenant
/// deployment uses [`HttpIdentityGate`] instead.
pub struct StaticTokenGate {
    expected_token: String,
    user_id: String,
}

impl StaticTokenGate {
    pub fn new(expected_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { expected_token: expected_token.into(), user_id: user_id.into() }
    }
}

#[async_trait]
impl IdentityGate for StaticTokenGate {
    async fn verify(&self, token: &str) -> ConvoyResult<String> {
        if constant_time_eq(token, &self.expected_token) {
            Ok(self.user_id.clone())
        } else {
            Err(ConvoyError::Unauthenticated)
        }
    }
}

/// Delegates verification to an external identity provider over HTTP.
///
/// Expects the provider to expose `GET {base_url}/verify` with
/// `Authorization: Bearer {token}`, returning `{"userId": "..."}` on success
/// and any non-2xx status on rejection.
pub struct HttpIdentityGate {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityGate {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client, base_url: base_url.into().trim_end_matches('/').to_owned() }
    }
}

#[derive(serde::Deserialize)]
struct VerifyResponse {
    #[serde(rename = "userId")]
    user_id: String,
}

#[async_trait]
impl IdentityGate for HttpIdentityGate {
    async fn verify(&self, token: &str) -> ConvoyResult<String> {
        let response = self
            .client
            .get(format!("{}/verify", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "identity gate request failed");
                ConvoyError::UpstreamFailure
            })?;

        if !response.status().is_success() {
            return Err(ConvoyError::Unauthenticated);
        }

        let body: VerifyResponse = response.json().await.map_err(|err| {
            warn!(error = %err, "identity gate returned malformed body");
            ConvoyError::UpstreamFailure
        })?;
        Ok(body.user_id)
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
