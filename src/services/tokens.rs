// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth token lifecycle: code exchange, refresh-ahead renewal, and
//! per-session single-flight refresh.
//!
//! Token records are values. Nothing here mutates a session; callers get a
//! new record back and decide whether to persist it.

use crate::config::TOKEN_REFRESH_MARGIN_SECS;
use crate::error::{AppError, Result};
use crate::models::{AuthorizationState, TokenRecord};
use crate::services::strava::StravaClient;
use crate::time_utils::{format_epoch_rfc3339, now_epoch};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Random bytes in an OAuth `state` value or session id.
const RANDOM_TOKEN_BYTES: usize = 32;

/// Outcome of [`TokenManager::ensure_fresh`].
#[derive(Debug, Clone, PartialEq)]
pub enum Freshness {
    /// Outside the refresh-ahead window; unchanged.
    Fresh(TokenRecord),
    /// Replaced by a refresh; the caller must persist it.
    Refreshed(TokenRecord),
    /// Refresh failed; the old record is kept and the next API call may 401.
    Stale(TokenRecord),
}

impl Freshness {
    pub fn record(&self) -> &TokenRecord {
        match self {
            Freshness::Fresh(r) | Freshness::Refreshed(r) | Freshness::Stale(r) => r,
        }
    }

    pub fn into_record(self) -> TokenRecord {
        match self {
            Freshness::Fresh(r) | Freshness::Refreshed(r) | Freshness::Stale(r) => r,
        }
    }

    pub fn is_refreshed(&self) -> bool {
        matches!(self, Freshness::Refreshed(_))
    }
}

/// Last successful refresh for a session.
#[derive(Clone)]
struct RecentRefresh {
    /// Refresh token that was spent to obtain `record`
    consumed_refresh_token: String,
    record: TokenRecord,
}

/// Per-session mutex to serialize refreshes.
pub type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Token lifecycle manager shared by all requests.
#[derive(Clone)]
pub struct TokenManager {
    client: StravaClient,
    refresh_locks: RefreshLocks,
    recent_refreshes: Arc<DashMap<String, RecentRefresh>>,
    rng: SystemRandom,
}

impl TokenManager {
    pub fn new(client: StravaClient) -> Self {
        Self {
            client,
            refresh_locks: Arc::new(DashMap::new()),
            recent_refreshes: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
        }
    }

    // ─── Authorization ───────────────────────────────────────────────────────

    /// Mint a fresh single-use OAuth `state`.
    pub fn new_authorization_state(&self) -> Result<AuthorizationState> {
        Ok(AuthorizationState::new(self.random_token()?))
    }

    /// Mint a random session id.
    pub fn new_session_id(&self) -> Result<String> {
        self.random_token()
    }

    /// Provider URL to redirect the user to.
    pub fn authorize_url(&self, state: &AuthorizationState) -> String {
        self.client.authorize_url(state.as_str())
    }

    /// Exchange an authorization code for a token record.
    pub async fn exchange(&self, code: &str) -> Result<TokenRecord> {
        let response = self.client.exchange_code(code).await?;

        tracing::info!(
            expires_at = %format_epoch_rfc3339(response.expires_at),
            "Authorization code exchanged"
        );

        Ok(TokenRecord {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response.expires_at,
            athlete: response.athlete,
        })
    }

    // ─── Refresh ─────────────────────────────────────────────────────────────

    /// Make sure `record` is usable for at least the refresh-ahead window.
    pub async fn ensure_fresh(&self, session_key: &str, record: TokenRecord) -> Freshness {
        self.ensure_fresh_at(session_key, record, now_epoch()).await
    }

    /// [`ensure_fresh`](Self::ensure_fresh) against an explicit clock.
    ///
    /// Concurrent callers for the same session share one refresh: the first
    /// one through the lock calls Strava, later ones adopt its result.
    pub async fn ensure_fresh_at(
        &self,
        session_key: &str,
        record: TokenRecord,
        now: i64,
    ) -> Freshness {
        if record.seconds_remaining(now) > TOKEN_REFRESH_MARGIN_SECS {
            return Freshness::Fresh(record);
        }

        let lock = self
            .refresh_locks
            .entry(session_key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let outcome = {
            let _guard = lock.lock().await;
            self.refresh_locked(session_key, record, now).await
        };

        // Drop the lock entry unless another request is holding or waiting on it
        drop(lock);
        self.refresh_locks
            .remove_if(session_key, |_, lock| Arc::strong_count(lock) == 1);

        outcome
    }

    /// Refresh with the session's lock held.
    async fn refresh_locked(
        &self,
        session_key: &str,
        record: TokenRecord,
        now: i64,
    ) -> Freshness {
        // Another request may have refreshed this grant while we waited.
        if let Some(recent) = self.recent_refreshes.get(session_key) {
            if recent.consumed_refresh_token == record.refresh_token
                && recent.record.seconds_remaining(now) > TOKEN_REFRESH_MARGIN_SECS
            {
                tracing::debug!("Adopting token refreshed by a concurrent request");
                return Freshness::Refreshed(recent.record.clone());
            }
        }

        tracing::info!(
            expires_at = %format_epoch_rfc3339(record.expires_at),
            "Access token near expiry, refreshing"
        );

        match self.client.refresh_token(&record.refresh_token).await {
            Ok(response) => {
                let refreshed = TokenRecord {
                    access_token: response.access_token,
                    refresh_token: response
                        .refresh_token
                        .unwrap_or_else(|| record.refresh_token.clone()),
                    expires_at: response.expires_at,
                    athlete: response.athlete.or_else(|| record.athlete.clone()),
                };

                self.prune_expired_refreshes(now);
                self.recent_refreshes.insert(
                    session_key.to_string(),
                    RecentRefresh {
                        consumed_refresh_token: record.refresh_token,
                        record: refreshed.clone(),
                    },
                );

                tracing::info!(
                    expires_at = %format_epoch_rfc3339(refreshed.expires_at),
                    "Token refreshed"
                );
                Freshness::Refreshed(refreshed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, continuing with stale token");
                Freshness::Stale(record)
            }
        }
    }

    /// Forget refreshes whose tokens have expired; their sessions are gone
    /// or will refresh from scratch.
    fn prune_expired_refreshes(&self, now: i64) {
        self.recent_refreshes
            .retain(|_, recent| recent.record.expires_at > now);
    }

    /// Drop refresh bookkeeping for a session that ended.
    pub fn forget(&self, session_key: &str) {
        self.recent_refreshes.remove(session_key);
        self.refresh_locks.remove(session_key);
    }

    fn random_token(&self) -> Result<String> {
        let mut bytes = [0u8; RANDOM_TOKEN_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

/// A session's token as it moves through one request.
///
/// Holds the current record and remembers whether it was replaced, so the
/// handler can write the new value back to the session.
#[derive(Debug, Clone)]
pub struct SessionToken {
    session_key: String,
    record: TokenRecord,
    refreshed: bool,
}

impl SessionToken {
    pub fn new(session_key: String, record: TokenRecord) -> Self {
        Self {
            session_key,
            record,
            refreshed: false,
        }
    }

    /// Re-validate freshness and return an access token to use right now.
    pub async fn access_token(&mut self, tokens: &TokenManager) -> &str {
        let outcome = tokens
            .ensure_fresh(&self.session_key, self.record.clone())
            .await;
        self.refreshed |= outcome.is_refreshed();
        self.record = outcome.into_record();
        &self.record.access_token
    }

    pub fn record(&self) -> &TokenRecord {
        &self.record
    }

    /// Whether the record changed since this value was created.
    pub fn is_refreshed(&self) -> bool {
        self.refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn manager() -> TokenManager {
        TokenManager::new(StravaClient::new(&Config::test_default()))
    }

    fn record(expires_at: i64) -> TokenRecord {
        TokenRecord {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at,
            athlete: None,
        }
    }

    #[tokio::test]
    async fn test_fresh_token_skips_network() {
        // Strava URLs are real here; reaching the network would not return Fresh
        let now = 1_700_000_000;
        let outcome = manager()
            .ensure_fresh_at("sid", record(now + 301), now)
            .await;
        assert_eq!(outcome, Freshness::Fresh(record(now + 301)));
    }

    fn recent(expires_at: i64) -> RecentRefresh {
        RecentRefresh {
            consumed_refresh_token: "spent".to_string(),
            record: record(expires_at),
        }
    }

    #[test]
    fn test_expired_refreshes_are_pruned() {
        let m = manager();
        let now = 1_700_000_000;
        m.recent_refreshes.insert("gone".to_string(), recent(now - 1));
        m.recent_refreshes.insert("ending".to_string(), recent(now));
        m.recent_refreshes.insert("live".to_string(), recent(now + 3600));

        m.prune_expired_refreshes(now);

        assert_eq!(m.recent_refreshes.len(), 1);
        assert!(m.recent_refreshes.contains_key("live"));
    }

    #[tokio::test]
    async fn test_refresh_lock_released_after_use() {
        // Nothing listens on the discard port, so every refresh fails fast
        let mut config = Config::test_default();
        config.strava_oauth_url = "http://127.0.0.1:9/oauth".to_string();
        let m = TokenManager::new(StravaClient::new(&config));
        let now = 1_700_000_000;

        for i in 0..50 {
            let outcome = m
                .ensure_fresh_at(&format!("sid-{}", i), record(now + 10), now)
                .await;
            assert_eq!(outcome, Freshness::Stale(record(now + 10)));
        }

        assert!(m.refresh_locks.is_empty());
    }

    #[test]
    fn test_random_tokens_are_unique_and_url_safe() {
        let m = manager();
        let a = m.new_authorization_state().unwrap();
        let b = m.new_authorization_state().unwrap();

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_freshness_accessors() {
        let refreshed = Freshness::Refreshed(record(5));
        assert!(refreshed.is_refreshed());
        assert_eq!(refreshed.record().expires_at, 5);
        assert!(!Freshness::Stale(record(5)).is_refreshed());
        assert!(!Freshness::Fresh(record(5)).is_refreshed());
    }
}
