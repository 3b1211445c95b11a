// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Coordinates, decoded routes and heatmap cells.

use serde::{Deserialize, Serialize};

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo::Coord {
            x: c.longitude,
            y: c.latitude,
        }
    }
}

impl From<geo::Coord<f64>> for Coordinate {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.y, c.x)
    }
}

/// A route with its polyline already decoded.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedRoute {
    pub id: u64,
    pub name: String,
    pub sport_type: Option<String>,
    pub start_date: String,
    pub coordinates: Vec<Coordinate>,
}

/// One non-empty heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    /// Cell latitude (rounded to the grid precision)
    pub latitude: f64,
    /// Cell longitude (rounded to the grid precision)
    pub longitude: f64,
    /// Real plus interpolated points that fell into this cell
    pub weight: u32,
}

/// Result of aggregating a set of routes into a density grid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Heatmap {
    /// Non-empty cells only, sorted by (latitude, longitude)
    pub cells: Vec<GridCell>,
    /// Largest cell weight, for color scaling
    pub max_weight: u32,
    /// Routes left out because their polyline failed to decode
    pub skipped_routes: u32,
}
