// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::models::{SessionRecord, TokenRecord};
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated session extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Key used to serialize token refreshes for this session
    pub session_key: String,
    pub token: TokenRecord,
    /// The full record, for writing back after a refresh
    pub record: SessionRecord,
}

impl AuthSession {
    /// Build from a loaded session, if it is authenticated.
    pub fn from_record(record: SessionRecord) -> Option<Self> {
        if !record.is_authenticated() {
            return None;
        }
        let session_key = record.session_key()?;
        let token = record.token.clone()?;
        Some(Self {
            session_key,
            token,
            record,
        })
    }
}

/// Middleware that requires an authenticated session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let record = state.sessions.load(&jar);
    let auth = AuthSession::from_record(record).ok_or(AppError::NotAuthenticated)?;

    request.extensions_mut().insert(auth);
    Ok(next.run(request).await)
}
