// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Heatmap aggregation.
//!
//! Routes are decoded, densified so sparse segments still cover the cells they
//! cross, and binned into a sparse grid keyed by coordinates rounded to
//! [`GRID_PRECISION`] decimal places.

use crate::config::{DENSIFY_SPACING_DEGREES, GRID_PRECISION};
use crate::models::{GridCell, Heatmap, RouteRecord};
use crate::services::polyline::{self, STRAVA_PRECISION};
use geo::{Coord, LineString};
use std::collections::HashMap;

/// Grid key: latitude and longitude scaled by 10^GRID_PRECISION and rounded.
type CellKey = (i64, i64);

/// Sparse density grid built up during one aggregation.
struct DensityGrid {
    scale: f64,
    cells: HashMap<CellKey, u32>,
}

impl DensityGrid {
    fn new() -> Self {
        Self {
            scale: 10f64.powi(GRID_PRECISION),
            cells: HashMap::new(),
        }
    }

    fn deposit(&mut self, point: Coord<f64>) {
        let key = (
            (point.y * self.scale).round() as i64,
            (point.x * self.scale).round() as i64,
        );
        *self.cells.entry(key).or_insert(0) += 1;
    }

    /// Deposit every vertex once, plus evenly spaced points along each segment.
    fn deposit_path(&mut self, line: &LineString<f64>) {
        let Some(first) = line.0.first() else {
            return;
        };
        self.deposit(*first);

        for segment in line.lines() {
            let distance = segment.dx().hypot(segment.dy());
            let steps = (distance / DENSIFY_SPACING_DEGREES).floor() as usize;
            let divisions = (steps + 1) as f64;

            for i in 1..=steps {
                let t = i as f64 / divisions;
                self.deposit(Coord {
                    x: segment.start.x + segment.dx() * t,
                    y: segment.start.y + segment.dy() * t,
                });
            }
            self.deposit(segment.end);
        }
    }

    fn build(self, skipped_routes: u32) -> Heatmap {
        let mut keyed: Vec<(CellKey, u32)> = self.cells.into_iter().collect();
        keyed.sort_unstable_by_key(|(key, _)| *key);

        let max_weight = keyed.iter().map(|(_, w)| *w).max().unwrap_or(0);
        let cells = keyed
            .into_iter()
            .map(|((lat, lng), weight)| GridCell {
                latitude: lat as f64 / self.scale,
                longitude: lng as f64 / self.scale,
                weight,
            })
            .collect();

        Heatmap {
            cells,
            max_weight,
            skipped_routes,
        }
    }
}

/// Aggregate routes into a density grid.
///
/// A route whose polyline fails to decode is skipped and counted; it never
/// affects the other routes.
pub fn aggregate(routes: &[RouteRecord]) -> Heatmap {
    let mut grid = DensityGrid::new();
    let mut skipped = 0u32;

    for route in routes {
        match polyline::decode_line_string(&route.polyline, STRAVA_PRECISION) {
            Ok(line) => grid.deposit_path(&line),
            Err(e) => {
                tracing::warn!(activity_id = route.id, error = %e, "Skipping undecodable route");
                skipped += 1;
            }
        }
    }

    let heatmap = grid.build(skipped);
    tracing::debug!(
        routes = routes.len(),
        cells = heatmap.cells.len(),
        skipped,
        "Heatmap aggregated"
    );
    heatmap
}
