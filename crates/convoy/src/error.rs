// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error taxonomy shared by the REST surface and the realtime gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvoyError {
    InvalidInput,
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    PreconditionFailed,
    TooManyRequests,
    UpstreamFailure,
    Internal,
}

impl ConvoyError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::PreconditionFailed => 400,
            Self::TooManyRequests => 429,
            Self::UpstreamFailure => 500,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::UpstreamFailure => "UPSTREAM_FAILURE",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into(), details: None }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { success: false, status_code: status.as_u16(), error: self.to_error_body(message) };
        (status, Json(body))
    }

    /// Render as an outbound `error` WebSocket frame payload.
    pub fn to_ws_frame(&self, message: impl Into<String>) -> serde_json::Value {
        serde_json::json!({
            "event": "error",
            "code": self.as_str(),
            "message": message.into(),
        })
    }
}

impl fmt::Display for ConvoyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for ConvoyError {}

/// Lets a handler return `Result<impl IntoResponse, ConvoyError>` and use
/// `?` throughout; renders the generic per-kind message from [`as_str`].
impl IntoResponse for ConvoyError {
    fn into_response(self) -> Response {
        self.to_http_response(self.as_str()).into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub status_code: u16,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

pub type ConvoyResult<T> = Result<T, ConvoyError>;

/// Top-level success response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: T,
}

/// Build a `(StatusCode, Json<SuccessResponse<T>>)` pair for a handler to
/// return directly as its `impl IntoResponse`.
pub fn ok_response<T: Serialize>(
    status: StatusCode,
    message: impl Into<String>,
    data: T,
) -> (StatusCode, Json<SuccessResponse<T>>) {
    let body = SuccessResponse {
        success: true,
        status_code: status.as_u16(),
        message: message.into(),
        data,
    };
    (status, Json(body))
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
