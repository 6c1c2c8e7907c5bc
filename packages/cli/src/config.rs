//! Layered TOML configuration.
//!
//! The defaults in `config/default.toml` are embedded at compile time. A
//! user file passed with `--config` is merged over them table by table, so
//! it only needs the keys it changes.

use std::path::{Path, PathBuf};

use golf_map_analytics::aggregate::AggregateOptions;
use golf_map_analytics::report::ReportOptions;
use golf_map_scan::session::EntityRetention;
use golf_map_scan_models::{GeoPoint, Radius};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A config layer is not valid TOML or does not match the schema.
    #[error("Invalid config {origin}: {source}")]
    Parse {
        /// Which layer failed (`built-in defaults` or a file path).
        origin: String,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A required setting is absent.
    #[error("Missing required setting `{0}`")]
    Missing(&'static str),

    /// A setting is present but unusable.
    #[error("Invalid setting `{field}`: {message}")]
    Invalid {
        /// Dotted key of the offending setting.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Complete configuration after layering.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Search origin.
    pub origin: GeoPoint,
    /// Scan settings.
    pub scan: ScanConfig,
    /// Input and output locations.
    pub data: DataConfig,
    /// Aggregation and report settings.
    pub report: ReportConfig,
}

/// `[scan]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Radii to scan, in miles, in order.
    pub radii_miles: Vec<f64>,
    /// Keep courses from a session recorded for a different origin.
    #[serde(default)]
    pub keep_entities_on_origin_change: bool,
}

/// `[data]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// `GeoJSON` course catalog used for discovery.
    pub catalog_path: Option<PathBuf>,
    /// `GeoJSON` census tracts used for demographic lookups.
    pub tracts_path: Option<PathBuf>,
    /// Persisted scan session.
    pub session_path: PathBuf,
    /// Directory for reports and exports.
    pub output_dir: PathBuf,
}

/// `[report]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Percentage threshold for the binary split.
    pub threshold: f64,
    /// Decimal places for the weighted mean distance.
    pub precision: u8,
    /// Number of histogram bins over `[0, 100]`.
    pub histogram_bins: usize,
}

impl Config {
    /// Loads the built-in defaults, layered with `path` if given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or the merged
    /// result does not match the schema.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let user = path.map(read_layer).transpose()?;

        Self::from_layers(
            user.as_ref()
                .map(|(origin, contents)| (origin.as_str(), contents.as_str())),
        )
    }

    fn from_layers(user: Option<(&str, &str)>) -> Result<Self, ConfigError> {
        let mut merged = parse_table("built-in defaults", DEFAULT_CONFIG)?;

        if let Some((origin, contents)) = user {
            merge_tables(&mut merged, parse_table(origin, contents)?);
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|source| ConfigError::Parse {
                origin: user.map_or_else(
                    || "built-in defaults".to_string(),
                    |(origin, _)| origin.to_string(),
                ),
                source,
            })
    }

    /// Replaces the origin and radii with command-line values where given.
    pub fn apply_overrides(&mut self, origin: Option<GeoPoint>, radii: Option<Vec<f64>>) {
        if let Some(origin) = origin {
            self.origin = origin;
        }
        if let Some(radii) = radii {
            self.scan.radii_miles = radii;
        }
    }

    /// Checks the settings every command relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an out-of-range origin,
    /// threshold, or bin count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.origin.is_valid() {
            return Err(ConfigError::Invalid {
                field: "origin",
                message: format!("{} is not a valid coordinate", self.origin),
            });
        }
        if !self.report.threshold.is_finite() {
            return Err(ConfigError::Invalid {
                field: "report.threshold",
                message: "must be a finite number".to_string(),
            });
        }
        if self.report.histogram_bins == 0 {
            return Err(ConfigError::Invalid {
                field: "report.histogram_bins",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Checks everything a scan needs before any provider is built.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a provider data path is missing or the
    /// radius list is empty or contains a non-positive radius.
    pub fn validate_for_scan(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if self.data.catalog_path.is_none() {
            return Err(ConfigError::Missing("data.catalog_path"));
        }
        if self.data.tracts_path.is_none() {
            return Err(ConfigError::Missing("data.tracts_path"));
        }
        if self.scan.radii_miles.is_empty() {
            return Err(ConfigError::Missing("scan.radii_miles"));
        }
        if let Some(bad) = self
            .scan
            .radii_miles
            .iter()
            .find(|r| !r.is_finite() || **r <= 0.0)
        {
            return Err(ConfigError::Invalid {
                field: "scan.radii_miles",
                message: format!("{bad} is not a positive distance"),
            });
        }
        Ok(())
    }

    /// Configured radii, in scan order.
    #[must_use]
    pub fn radii(&self) -> Vec<Radius> {
        let miles = &self.scan.radii_miles;
        miles.iter().copied().map(Radius::miles).collect()
    }

    /// How to treat courses from a session recorded for another origin.
    #[must_use]
    pub const fn retention(&self) -> EntityRetention {
        if self.scan.keep_entities_on_origin_change {
            EntityRetention::Keep
        } else {
            EntityRetention::Discard
        }
    }

    /// Report options built from the `[report]` table.
    #[must_use]
    pub const fn report_options(&self) -> ReportOptions {
        ReportOptions {
            aggregate: AggregateOptions {
                threshold: self.report.threshold,
                precision: self.report.precision,
            },
            histogram_bins: self.report.histogram_bins,
        }
    }
}

/// Reads a user config file, returning its display name and contents.
fn read_layer(path: &Path) -> Result<(String, String), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Using config {}", path.display());
    Ok((path.display().to_string(), contents))
}

fn parse_table(origin: &str, contents: &str) -> Result<toml::Table, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Recursively merges `overlay` into `base`. Nested tables are merged key by
/// key; any other value in `overlay` replaces the one in `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
