// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for activities, decoded routes and heatmaps.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthSession;
use crate::models::{DecodedRoute, GridCell, RouteRecord};
use crate::services::activity::{self, ActivityWindow};
use crate::services::{heatmap, SessionToken};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use validator::{Validate, ValidationError};

/// API routes (require authentication via the session cookie).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(get_activities))
        .route("/api/routes", get(get_routes))
        .route("/api/heatmap", get(get_heatmap))
}

/// API routes that work with or without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

// ─── Session ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    pub athlete: Option<serde_json::Value>,
}

/// Report whether the caller is signed in, with the Strava profile if so.
async fn get_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> Json<SessionResponse> {
    let session = state.sessions.load(&jar);
    let authenticated = session.is_authenticated();
    let athlete = session
        .token
        .filter(|_| authenticated)
        .and_then(|t| t.athlete);

    Json(SessionResponse {
        authenticated,
        athlete,
    })
}

// ─── Time window ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_window"))]
struct WindowQuery {
    /// Only activities starting after this Unix timestamp
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(range(min = 0))]
    after: Option<i64>,
    /// Only activities starting before this Unix timestamp
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(range(min = 0))]
    before: Option<i64>,
}

/// Treat `?after=` (a blank form field) as an absent bound.
fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn validate_window(query: &WindowQuery) -> std::result::Result<(), ValidationError> {
    match (query.after, query.before) {
        (Some(after), Some(before)) if after > before => {
            Err(ValidationError::new("after_exceeds_before"))
        }
        _ => Ok(()),
    }
}

impl WindowQuery {
    /// Unpack the extractor result so malformed queries get the JSON error body.
    fn parse(query: std::result::Result<Query<Self>, QueryRejection>) -> Result<ActivityWindow> {
        let Query(params) =
            query.map_err(|e| AppError::BadRequest(format!("Invalid time window: {}", e)))?;
        params.window()
    }

    fn window(&self) -> Result<ActivityWindow> {
        self.validate()
            .map_err(|e| AppError::BadRequest(format!("Invalid time window: {}", e)))?;
        Ok(ActivityWindow {
            after: self.after,
            before: self.before,
        })
    }
}

/// Fetch and normalize routes for the window.
///
/// A token refreshed along the way is written back to the session cookie
/// whether or not the fetch succeeded.
async fn fetch_routes(
    state: &AppState,
    auth: AuthSession,
    jar: CookieJar,
    window: ActivityWindow,
) -> (CookieJar, Result<(Vec<RouteRecord>, bool)>) {
    let mut token = SessionToken::new(auth.session_key, auth.token);

    let result = state
        .fetcher
        .fetch_range(&mut token, window)
        .await
        .map(|fetched| (activity::normalize(fetched.activities), fetched.truncated));

    if !token.is_refreshed() {
        return (jar, result);
    }

    let mut record = auth.record;
    record.token = Some(token.record().clone());
    match state.sessions.store(jar.clone(), &record) {
        Ok(updated) => (updated, result),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to persist refreshed token");
            (jar, result)
        }
    }
}

// ─── Activities ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct ActivitiesResponse {
    pub activities: Vec<RouteRecord>,
    /// True if the page cap cut the listing short
    pub truncated: bool,
}

/// Get the user's routes as encoded polylines.
async fn get_activities(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    jar: CookieJar,
    params: std::result::Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let window = match WindowQuery::parse(params) {
        Ok(w) => w,
        Err(e) => return e.into_response(),
    };

    let (jar, result) = fetch_routes(&state, auth, jar, window).await;
    let body = result.map(|(activities, truncated)| {
        Json(ActivitiesResponse {
            activities,
            truncated,
        })
    });
    (jar, body).into_response()
}

// ─── Decoded routes ──────────────────────────────────────────

#[derive(Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<DecodedRoute>,
    pub skipped_routes: u32,
    pub truncated: bool,
}

/// Get the user's routes as coordinate lists.
async fn get_routes(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    jar: CookieJar,
    params: std::result::Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let window = match WindowQuery::parse(params) {
        Ok(w) => w,
        Err(e) => return e.into_response(),
    };

    let (jar, result) = fetch_routes(&state, auth, jar, window).await;
    let body = result.map(|(routes, truncated)| {
        let (routes, skipped_routes) = activity::decode_routes(&routes);
        Json(RoutesResponse {
            routes,
            skipped_routes,
            truncated,
        })
    });
    (jar, body).into_response()
}

// ─── Heatmap ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HeatmapResponse {
    pub cells: Vec<GridCell>,
    pub max_weight: u32,
    pub skipped_routes: u32,
    pub truncated: bool,
}

/// Get a density grid over all of the user's routes in the window.
async fn get_heatmap(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthSession>,
    jar: CookieJar,
    params: std::result::Result<Query<WindowQuery>, QueryRejection>,
) -> Response {
    let window = match WindowQuery::parse(params) {
        Ok(w) => w,
        Err(e) => return e.into_response(),
    };

    let (jar, result) = fetch_routes(&state, auth, jar, window).await;
    let body = result.map(|(routes, truncated)| {
        let grid = heatmap::aggregate(&routes);
        Json(HeatmapResponse {
            cells: grid.cells,
            max_weight: grid.max_weight,
            skipped_routes: grid.skipped_routes,
            truncated,
        })
    });
    (jar, body).into_response()
}
