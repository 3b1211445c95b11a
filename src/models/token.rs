// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token and session records carried in the session cookie.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

/// Strava OAuth tokens for one session.
///
/// Always replaced as a whole: an access token never travels without the
/// expiry it was issued with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token expiry (Unix timestamp)
    pub expires_at: i64,
    /// Athlete profile as returned by Strava, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub athlete: Option<serde_json::Value>,
}

impl TokenRecord {
    /// Seconds until the access token expires (negative once expired).
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.expires_at - now
    }
}

/// Single-use value tying an OAuth callback to the session that started it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationState(String);

impl AuthorizationState {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against the `state` returned by the provider.
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

/// Everything the server keeps in the client-held session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Random session key minted at login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<TokenRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_state: Option<AuthorizationState>,
}

impl SessionRecord {
    /// A session is authenticated iff it holds a non-empty access token.
    pub fn is_authenticated(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|t| !t.access_token.is_empty())
    }

    /// Key used to serialize refreshes for this session.
    ///
    /// Falls back to the refresh token for records minted without a `sid`.
    pub fn session_key(&self) -> Option<String> {
        match (&self.sid, &self.token) {
            (Some(sid), _) => Some(sid.clone()),
            (None, Some(token)) => Some(token.refresh_token.clone()),
            (None, None) => None,
        }
    }
}
