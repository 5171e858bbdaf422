// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-credential enforcement for the REST surface.
//!
//! The WebSocket upgrade path verifies its own credential (handshake query
//! param or header) inside [`crate::gateway::ws::ws_handler`] rather than
//! through this middleware, since the upgrade request itself must succeed
//! before a `401` can be framed as a close.

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ConvoyError;
use crate::state::AppState;

/// The verified caller, attached to request extensions by [`auth_layer`] and
/// extracted by handlers via `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Extract the bearer token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &Request<axum::body::Body>) -> Result<&str, ConvoyError> {
    req.headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ConvoyError::Unauthenticated)
}

/// Axum middleware that verifies the bearer credential via the identity gate
/// and attaches the resolved user id to the request.
///
/// Exempt: `/healthz` and WebSocket upgrades (`/ws/*`), which authenticate
/// through their own paths.
pub async fn auth_layer(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/healthz" || path.starts_with("/ws") {
        return next.run(req).await;
    }

    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(code) => return error_response(code),
    };

    match state.identity.verify(token).await {
        Ok(user_id) => {
            req.extensions_mut().insert(AuthUser(user_id));
            next.run(req).await
        }
        Err(code) => error_response(code),
    }
}

fn error_response(code: ConvoyError) -> Response {
    code.to_http_response("unauthenticated").into_response()
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
