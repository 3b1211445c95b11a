// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test helpers: app construction, session cookies and a local mock
//! of the Strava token and activities endpoints.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use route_explorer::config::Config;
use route_explorer::models::{SessionRecord, TokenRecord};
use route_explorer::routes::create_router;
use route_explorer::AppState;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Encoded path used for every activity that has a route.
#[allow(dead_code)]
pub const ROUTE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC";

/// How the mock Strava server should behave.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Activities available in total (ids 1..=total, newest first)
    pub total_activities: usize,
    /// Page number that answers with HTTP 500
    pub fail_page: Option<u32>,
    /// Status for `authorization_code` grants
    pub exchange_status: u16,
    /// Status for `refresh_token` grants
    pub refresh_status: u16,
    /// Whether refreshes return a new refresh token
    pub rotate_refresh_token: bool,
    /// Delay before answering a refresh
    pub refresh_delay: Duration,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            total_activities: 0,
            fail_page: None,
            exchange_status: 200,
            refresh_status: 200,
            rotate_refresh_token: true,
            refresh_delay: Duration::from_millis(0),
        }
    }
}

/// One recorded `GET /athlete/activities` call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub bearer: String,
}

/// Mock Strava state and call counters.
#[derive(Default)]
pub struct MockStrava {
    pub behavior: MockBehavior,
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub page_requests: Mutex<Vec<PageRequest>>,
}

#[allow(dead_code)]
impl MockStrava {
    pub fn exchanges(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn pages(&self) -> Vec<PageRequest> {
        self.page_requests.lock().unwrap().clone()
    }
}

/// Handle to a running mock server.
pub struct MockServer {
    pub strava: Arc<MockStrava>,
    pub api_url: String,
    pub oauth_url: String,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

async fn token_endpoint(
    State(mock): State<Arc<MockStrava>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => {
            mock.exchange_calls.fetch_add(1, Ordering::SeqCst);
            let status = StatusCode::from_u16(mock.behavior.exchange_status).unwrap();
            if !status.is_success() {
                return (status, Json(json!({ "message": "Bad Request" }))).into_response();
            }
            Json(json!({
                "token_type": "Bearer",
                "access_token": "access-initial",
                "refresh_token": "refresh-initial",
                "expires_at": now() + 21600,
                "expires_in": 21600,
                "athlete": { "id": 42, "firstname": "Ada", "lastname": "Lovelace" }
            }))
            .into_response()
        }
        Some("refresh_token") => {
            let n = mock.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(mock.behavior.refresh_delay).await;

            let status = StatusCode::from_u16(mock.behavior.refresh_status).unwrap();
            if !status.is_success() {
                return (status, Json(json!({ "message": "Bad Request" }))).into_response();
            }

            let mut body = json!({
                "token_type": "Bearer",
                "access_token": format!("access-refreshed-{}", n),
                "expires_at": now() + 21600,
                "expires_in": 21600
            });
            if mock.behavior.rotate_refresh_token {
                body["refresh_token"] = json!(format!("refresh-rotated-{}", n));
            }
            Json(body).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn activities_endpoint(
    State(mock): State<Arc<MockStrava>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let page: u32 = query.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let per_page: u32 = query
        .get("per_page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();

    mock.page_requests.lock().unwrap().push(PageRequest {
        page,
        per_page,
        after: query.get("after").and_then(|v| v.parse().ok()),
        before: query.get("before").and_then(|v| v.parse().ok()),
        bearer,
    });

    if mock.behavior.fail_page == Some(page) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let total = mock.behavior.total_activities;
    let start = ((page - 1) * per_page) as usize;
    let end = (start + per_page as usize).min(total);

    let activities: Vec<serde_json::Value> = (start..end)
        .map(|index| {
            let id = index as u64 + 1;
            // Every odd activity was recorded indoors and has no route
            let polyline = if id % 2 == 0 { ROUTE_POLYLINE } else { "" };
            json!({
                "id": id,
                "name": format!("Activity {}", id),
                "type": "Ride",
                "sport_type": "GravelRide",
                "start_date": "2025-06-01T08:00:00Z",
                "distance": 1000.0 * id as f64,
                "map": { "id": format!("a{}", id), "summary_polyline": polyline }
            })
        })
        .collect();

    Json(activities).into_response()
}

/// Start a mock Strava server on an ephemeral local port.
#[allow(dead_code)]
pub async fn spawn_mock_strava(behavior: MockBehavior) -> MockServer {
    let strava = Arc::new(MockStrava {
        behavior,
        ..Default::default()
    });

    let app = Router::new()
        .route("/oauth/token", post(token_endpoint))
        .route("/api/v3/athlete/activities", get(activities_endpoint))
        .with_state(strava.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock Strava");
    let addr = listener.local_addr().expect("mock Strava address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock Strava server");
    });

    MockServer {
        strava,
        api_url: format!("http://{}/api/v3", addr),
        oauth_url: format!("http://{}/oauth", addr),
    }
}

/// Create a test app with a given config.
#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (create_router(state.clone()), state)
}

/// Create a test app whose Strava calls go nowhere useful.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

/// Create a test app talking to the given mock Strava server.
#[allow(dead_code)]
pub fn create_test_app_with_mock(mock: &MockServer) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.strava_api_url = mock.api_url.clone();
    config.strava_oauth_url = mock.oauth_url.clone();
    create_test_app_with_config(config)
}

/// Token record expiring `expires_in` seconds from now.
#[allow(dead_code)]
pub fn token_record(expires_in: i64) -> TokenRecord {
    TokenRecord {
        access_token: "access-current".to_string(),
        refresh_token: "refresh-current".to_string(),
        expires_at: now() + expires_in,
        athlete: Some(json!({ "id": 42, "firstname": "Ada" })),
    }
}

/// Authenticated session record.
#[allow(dead_code)]
pub fn logged_in_session(expires_in: i64) -> SessionRecord {
    SessionRecord {
        sid: Some("test-session".to_string()),
        token: Some(token_record(expires_in)),
        oauth_state: None,
    }
}

/// `Cookie` header value carrying `record`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, record: &SessionRecord) -> String {
    format!(
        "{}={}",
        route_explorer::session::SESSION_COOKIE,
        state.sessions.encode(record).unwrap()
    )
}

/// All `Set-Cookie` header values of a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Session written by a response, if it set one.
#[allow(dead_code)]
pub fn session_from_response(state: &AppState, response: &Response) -> Option<SessionRecord> {
    let prefix = format!("{}=", route_explorer::session::SESSION_COOKIE);
    set_cookie_headers(response).iter().find_map(|cookie| {
        let value = cookie.strip_prefix(&prefix)?.split(';').next()?;
        state.sessions.decode(value)
    })
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
