// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-held session: the `SessionRecord` signed as an HS256 JWT in a cookie.
//!
//! Loading never fails; a missing, expired or tampered cookie is an empty
//! session. Storing replaces the whole record.

use crate::error::AppError;
use crate::models::SessionRecord;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use crate::time_utils::now_epoch;
use serde::{Deserialize, Serialize};

/// Session cookie name.
pub const SESSION_COOKIE: &str = "route_session";

/// Session lifetime (30 days).
const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// JWT claims: the session record plus standard timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(flatten)]
    record: SessionRecord,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
}

/// Encodes and decodes the session cookie.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    secure: bool,
}

impl SessionCodec {
    pub fn new(secret: &[u8], secure: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            secure,
        }
    }

    /// Load the session from the request cookies.
    pub fn load(&self, jar: &CookieJar) -> SessionRecord {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| self.decode(cookie.value()))
            .unwrap_or_default()
    }

    /// Verify and decode a raw cookie value.
    pub fn decode(&self, raw: &str) -> Option<SessionRecord> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<SessionClaims>(raw, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims.record),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding invalid session cookie");
                None
            }
        }
    }

    /// Sign a session record.
    pub fn encode(&self, record: &SessionRecord) -> Result<String, AppError> {
        let now = now_epoch();

        let claims = SessionClaims {
            record: record.clone(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Session(format!("Session signing failed: {}", e)))
    }

    /// Replace the session cookie with `record`.
    pub fn store(&self, jar: CookieJar, record: &SessionRecord) -> Result<CookieJar, AppError> {
        let value = self.encode(record)?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(SESSION_TTL_SECS));
        Ok(jar.add(cookie))
    }

    /// Remove the session cookie.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(
            Cookie::build(SESSION_COOKIE)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(self.secure),
        )
    }
}
