// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Service layer for business logic.

pub mod activity;
pub mod heatmap;
pub mod polyline;
pub mod strava;
pub mod tokens;

pub use activity::{ActivityFetcher, ActivityWindow, FetchedActivities};
pub use strava::StravaClient;
pub use tokens::{Freshness, SessionToken, TokenManager};
