// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Activities requested per Strava list call.
pub const ACTIVITY_PAGE_SIZE: u32 = 200;

/// Hard cap on pages per fetch (4000 activities). Results that hit the cap
/// are reported as truncated.
pub const MAX_ACTIVITY_PAGES: u32 = 20;

/// Refresh-ahead window: tokens expiring within this many seconds are renewed.
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Decimal places kept when binning heatmap points (~11 m cells).
pub const GRID_PRECISION: i32 = 4;

/// Spacing of synthetic points added along long segments, in degrees (~55 m).
pub const DENSIFY_SPACING_DEGREES: f64 = 0.0005;

/// OAuth scopes requested from Strava.
pub const STRAVA_SCOPES: &str = "read,activity:read_all";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Externally visible base URL of this service (used for the OAuth redirect)
    pub base_url: String,
    /// Server port
    pub port: u16,
    /// Key used to sign session cookies (raw bytes)
    pub session_secret: Vec<u8>,
    /// Strava REST API base
    pub strava_api_url: String,
    /// Strava OAuth base (authorize + token endpoints)
    pub strava_oauth_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            base_url: env::var("BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            session_secret: env::var("SESSION_SECRET")
                .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?
                .into_bytes(),
            strava_api_url: env::var("STRAVA_API_URL")
                .unwrap_or_else(|_| "https://www.strava.com/api/v3".to_string()),
            strava_oauth_url: env::var("STRAVA_OAUTH_URL")
                .unwrap_or_else(|_| "https://www.strava.com/oauth".to_string()),
        })
    }

    /// Config for tests; Strava URLs point at the real service and are
    /// normally overridden with a local mock.
    pub fn test_default() -> Self {
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            base_url: "http://localhost:8080".to_string(),
            port: 8080,
            session_secret: b"test_session_key_32_bytes_min!!".to_vec(),
            strava_api_url: "https://www.strava.com/api/v3".to_string(),
            strava_oauth_url: "https://www.strava.com/oauth".to_string(),
        }
    }

    /// OAuth redirect target registered with Strava.
    pub fn redirect_uri(&self) -> String {
        format!("{}/oauth/callback", self.base_url)
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn uses_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
