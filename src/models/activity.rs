// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Strava activity payloads and the normalized route record served to clients.

use serde::{Deserialize, Serialize};

/// Summary activity as returned by `GET /athlete/activities`.
///
/// Only the fields this service reads are declared; everything else in the
/// Strava payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActivity {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Specific sport (e.g. "MountainBikeRide")
    #[serde(default)]
    pub sport_type: Option<String>,
    /// Legacy general type (e.g. "Ride")
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub map: Option<ActivityMap>,
}

impl RawActivity {
    /// Get the detailed polyline, falling back to summary if not available.
    /// Empty strings count as missing.
    pub fn polyline(&self) -> Option<&str> {
        let map = self.map.as_ref()?;
        map.polyline
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| map.summary_polyline.as_deref().filter(|p| !p.is_empty()))
    }

    /// Sport type, preferring the specific field over the legacy one.
    pub fn sport(&self) -> Option<&str> {
        self.sport_type
            .as_deref()
            .or(self.activity_type.as_deref())
    }
}

/// Activity map data with polylines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityMap {
    #[serde(default)]
    pub polyline: Option<String>,
    #[serde(default)]
    pub summary_polyline: Option<String>,
}

/// Minimal route record returned by `/api/activities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub id: u64,
    pub name: String,
    pub sport_type: Option<String>,
    pub start_date: String,
    /// Distance in meters
    pub distance: f64,
    /// Encoded polyline (precision 5)
    pub polyline: String,
}
