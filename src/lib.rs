// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Route Explorer: browse and heatmap your Strava routes
//!
//! This crate provides the backend API that signs users in with Strava,
//! pages through their activities for a time window, and serves the routes
//! as encoded polylines, decoded coordinates or a density grid.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use services::{ActivityFetcher, StravaClient, TokenManager};
use session::SessionCodec;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionCodec,
    pub tokens: TokenManager,
    pub fetcher: ActivityFetcher,
}

impl AppState {
    /// Wire up services from configuration.
    pub fn new(config: Config) -> Self {
        let client = StravaClient::new(&config);
        let tokens = TokenManager::new(client.clone());
        let fetcher = ActivityFetcher::new(client, tokens.clone());
        let sessions = SessionCodec::new(&config.session_secret, config.uses_https());

        Self {
            config,
            sessions,
            tokens,
            fetcher,
        }
    }
}
