// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{AuthorizationState, SessionRecord};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", get(auth_start))
        .route("/oauth/callback", get(auth_callback))
        .route("/logout", post(logout))
}

/// Start OAuth flow - store a fresh state and redirect to Strava.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let oauth_state = state.tokens.new_authorization_state()?;

    let mut session = state.sessions.load(&jar);
    session.oauth_state = Some(oauth_state.clone());
    let jar = state.sessions.store(jar, &session)?;

    tracing::info!(
        client_id = %state.config.strava_client_id,
        "Starting OAuth flow, redirecting to Strava"
    );

    Ok((jar, Redirect::temporary(&state.tokens.authorize_url(&oauth_state))))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, install a new session.
///
/// The stored state is consumed whether or not the callback succeeds.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let mut session = state.sessions.load(&jar);
    let expected = session.oauth_state.take();

    let result = match complete_login(&state, expected, params).await {
        Ok(logged_in) => {
            if let Some(previous) = session.session_key() {
                state.tokens.forget(&previous);
            }
            session = logged_in;
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e),
    };

    match state.sessions.store(jar, &session) {
        Ok(jar) => (jar, result).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Validate the callback and build the logged-in session.
async fn complete_login(
    state: &AppState,
    expected: Option<AuthorizationState>,
    params: CallbackParams,
) -> Result<SessionRecord> {
    if let Some(error) = &params.error {
        tracing::warn!(error = %error, "OAuth error from Strava");
    }

    let returned = params.state.as_deref().unwrap_or_default();
    let state_ok = expected
        .as_ref()
        .is_some_and(|exp| !returned.is_empty() && exp.matches(returned));
    if !state_ok {
        tracing::warn!(
            has_expected = expected.is_some(),
            "OAuth state mismatch, rejecting callback"
        );
        return Err(AppError::InvalidState);
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or(AppError::MissingCode)?;

    tracing::info!("Exchanging authorization code for tokens");
    let token = state.tokens.exchange(&code).await?;

    Ok(SessionRecord {
        sid: Some(state.tokens.new_session_id()?),
        token: Some(token),
        oauth_state: None,
    })
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let session = state.sessions.load(&jar);
    if let Some(key) = session.session_key() {
        state.tokens.forget(&key);
    }
    tracing::info!(authenticated = session.is_authenticated(), "Logging out");

    (state.sessions.clear(jar), StatusCode::NO_CONTENT)
}
