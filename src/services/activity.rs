// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity retrieval and normalization.
//!
//! Handles the core workflow:
//! 1. Page through the athlete's activities for a time window
//! 2. Re-validate the token before every page
//! 3. Keep only activities with a route and project them to `RouteRecord`s

use crate::config::{ACTIVITY_PAGE_SIZE, MAX_ACTIVITY_PAGES};
use crate::error::Result;
use crate::models::{DecodedRoute, RawActivity, RouteRecord};
use crate::services::polyline::{self, STRAVA_PRECISION};
use crate::services::strava::StravaClient;
use crate::services::tokens::{SessionToken, TokenManager};

/// Optional epoch-second bounds on activity start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityWindow {
    pub after: Option<i64>,
    pub before: Option<i64>,
}

/// Activities collected across pages.
#[derive(Debug, Clone)]
pub struct FetchedActivities {
    /// Activities in the order Strava returned them
    pub activities: Vec<RawActivity>,
    /// Pages requested
    pub pages: u32,
    /// True if the page cap was hit while pages were still full
    pub truncated: bool,
}

/// Bounded paginated fetch of an athlete's activities.
#[derive(Clone)]
pub struct ActivityFetcher {
    client: StravaClient,
    tokens: TokenManager,
}

impl ActivityFetcher {
    pub fn new(client: StravaClient, tokens: TokenManager) -> Self {
        Self { client, tokens }
    }

    /// Fetch every activity in `window`, up to the page cap.
    ///
    /// Pages are fetched strictly in order. Any failed page aborts the whole
    /// fetch; a refreshed token is still recorded in `token` either way.
    pub async fn fetch_range(
        &self,
        token: &mut SessionToken,
        window: ActivityWindow,
    ) -> Result<FetchedActivities> {
        let mut activities = Vec::new();
        let mut pages = 0;
        let mut truncated = false;

        for page in 1..=MAX_ACTIVITY_PAGES {
            let access_token = token.access_token(&self.tokens).await;
            let batch = self
                .client
                .list_activities(access_token, window, page, ACTIVITY_PAGE_SIZE)
                .await?;

            pages = page;
            let full_page = batch.len() >= ACTIVITY_PAGE_SIZE as usize;
            activities.extend(batch);

            if !full_page {
                break;
            }
            if page == MAX_ACTIVITY_PAGES {
                truncated = true;
                tracing::warn!(
                    pages,
                    count = activities.len(),
                    "Activity page cap reached, results truncated"
                );
            }
        }

        tracing::info!(
            pages,
            count = activities.len(),
            after = ?window.after,
            before = ?window.before,
            "Fetched activities"
        );

        Ok(FetchedActivities {
            activities,
            pages,
            truncated,
        })
    }
}

/// Keep activities that carry a route and project them to route records.
pub fn normalize(activities: Vec<RawActivity>) -> Vec<RouteRecord> {
    activities
        .into_iter()
        .filter_map(|activity| {
            let polyline = activity.polyline()?.to_string();
            let sport_type = activity.sport().map(str::to_string);
            Some(RouteRecord {
                id: activity.id,
                name: activity.name,
                sport_type,
                start_date: activity.start_date,
                distance: activity.distance,
                polyline,
            })
        })
        .collect()
}

/// Decode each route's polyline. Routes that fail to decode are left out and
/// counted.
pub fn decode_routes(routes: &[RouteRecord]) -> (Vec<DecodedRoute>, u32) {
    let mut decoded = Vec::with_capacity(routes.len());
    let mut skipped = 0;

    for route in routes {
        match polyline::decode(&route.polyline, STRAVA_PRECISION) {
            Ok(coordinates) => decoded.push(DecodedRoute {
                id: route.id,
                name: route.name.clone(),
                sport_type: route.sport_type.clone(),
                start_date: route.start_date.clone(),
                coordinates,
            }),
            Err(e) => {
                tracing::warn!(activity_id = route.id, error = %e, "Skipping undecodable route");
                skipped += 1;
            }
        }
    }

    (decoded, skipped)
}
