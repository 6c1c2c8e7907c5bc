#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incremental golf course discovery around a search origin.
//!
//! A scan repeatedly asks a [`provider::DiscoveryProvider`] for courses
//! within growing radii of an origin, merges the results into a
//! [`session::ScanSession`] keyed by the provider's stable identifier, and
//! asks a [`provider::DemographicProvider`] for the enclosing tract's
//! population statistics once per newly discovered course.
//!
//! The session remembers which radii were fully scanned for its origin so a
//! rerun against the same origin skips them. Sessions are persisted as JSON
//! by [`store`] and exported for downstream analysis by [`export`].

pub mod distance;
pub mod export;
pub mod progress;
pub mod provider;
pub mod scanner;
pub mod session;
pub mod store;

pub use golf_map_scan_models as models;

use thiserror::Error;

/// Errors from reading or writing session and export files.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
