// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use route_explorer::error::AppError;
use serde_json::Value;

async fn render(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_not_authenticated() {
    let (status, body) = render(AppError::NotAuthenticated).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "not_authenticated");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_oauth_errors_are_bad_requests() {
    let (status, body) = render(AppError::InvalidState).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_state");

    let (status, body) = render(AppError::MissingCode).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing_code");
}

#[tokio::test]
async fn test_bad_request_carries_message() {
    let (status, body) = render(AppError::BadRequest("after > before".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert_eq!(body["message"], "after > before");
}

#[tokio::test]
async fn test_auth_exchange_hides_details() {
    let (status, body) = render(AppError::AuthExchange { status: 401 }).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "auth_exchange_failed");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_upstream_error_reports_status_and_body() {
    let err = AppError::UpstreamApi {
        status: 429,
        body: "Rate Limit Exceeded".to_string(),
    };
    assert_eq!(err.to_string(), "Strava API returned 429: Rate Limit Exceeded");

    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server_error");
    assert_eq!(
        body["message"],
        "Strava API returned 429: Rate Limit Exceeded"
    );
}

#[tokio::test]
async fn test_session_error_hides_details() {
    let (status, body) = render(AppError::Session("signing failed".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server_error");
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn test_internal_from_anyhow() {
    let err: AppError = anyhow::anyhow!("disk on fire").into();
    let (status, body) = render(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "server_error");
    assert_eq!(body["message"], "disk on fire");
}
