// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("OAuth state mismatch")]
    InvalidState,

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Token exchange rejected with status {status}")]
    AuthExchange { status: u16 },

    #[error("Strava API returned {status}: {body}")]
    UpstreamApi { status: u16, body: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated", None),
            AppError::InvalidState => (StatusCode::BAD_REQUEST, "invalid_state", None),
            AppError::MissingCode => (StatusCode::BAD_REQUEST, "missing_code", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::AuthExchange { status } => {
                tracing::error!(status, "Strava token exchange failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "auth_exchange_failed",
                    None,
                )
            }
            AppError::UpstreamApi { status, body } => {
                tracing::error!(status, body = %body, "Strava API error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    Some(self.to_string()),
                )
            }
            AppError::Session(msg) => {
                tracing::error!(error = %msg, "Session error");
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "server_error",
                    Some(err.to_string()),
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
