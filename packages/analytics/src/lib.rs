#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Demographic analysis over discovered golf courses.
//!
//! Turns a scan session's courses into the population-weighted
//! cumulative-by-distance table, the weighted mean distance, a threshold
//! split, a percentage histogram, and a category breakdown, and bundles them
//! into a [`golf_map_analytics_models::Report`] for chart rendering.

pub mod aggregate;
pub mod category;
pub mod histogram;
pub mod report;

use thiserror::Error;

/// Errors from writing analysis output.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rounds `value` to `precision` decimal places.
#[must_use]
pub fn round_to(value: f64, precision: u8) -> f64 {
    let factor = 10f64.powi(i32::from(precision));
    (value * factor).round() / factor
}
