// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod route;
pub mod token;

pub use activity::{ActivityMap, RawActivity, RouteRecord};
pub use route::{Coordinate, DecodedRoute, GridCell, Heatmap};
pub use token::{AuthorizationState, SessionRecord, TokenRecord};
