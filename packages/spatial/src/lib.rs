#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! File-backed providers for golf course scans.
//!
//! Loads a course catalog and census tract polygons from `GeoJSON`, builds
//! R-tree spatial indexes over them, and serves the scan's discovery and
//! demographic lookups locally:
//!
//! - [`catalog::CourseCatalog`] answers "which courses are within this
//!   radius" with an envelope prefilter and an exact great-circle check.
//! - [`tracts::TractIndex`] answers "which tract contains this point" with
//!   an envelope prefilter and a point-in-polygon test.

pub mod catalog;
pub mod tracts;

use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson};
use thiserror::Error;

/// Errors from loading spatial data files.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("Invalid GeoJSON: {0}")]
    GeoJson(#[from] Box<geojson::Error>),

    /// The `GeoJSON` is valid but not shaped as expected.
    #[error("Invalid data: {message}")]
    InvalidData {
        /// What was wrong.
        message: String,
    },
}

/// Reads a `GeoJSON` file and returns its features.
fn read_features(path: &Path) -> Result<Vec<Feature>, SpatialError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SpatialError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_features(&contents)
}

/// Parses `GeoJSON` text into features. Accepts a `FeatureCollection` or a
/// single `Feature`.
fn parse_features(geojson_str: &str) -> Result<Vec<Feature>, SpatialError> {
    let geojson = geojson_str.parse::<GeoJson>().map_err(Box::new)?;

    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(feature) => Ok(vec![feature]),
        GeoJson::Geometry(_) => Err(SpatialError::InvalidData {
            message: "expected a Feature or FeatureCollection, found a bare Geometry".to_string(),
        }),
    }
}

/// First of `keys` present on the feature as a non-empty string (numbers
/// are stringified).
fn string_property(feature: &Feature, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match feature.property(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First of `keys` present on the feature as a number or numeric string.
///
/// Census API responses encode counts as strings, so both are accepted.
fn number_property(feature: &Feature, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match feature.property(key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Like [`number_property`], for non-negative integer counts.
fn count_property(feature: &Feature, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match feature.property(key)? {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
