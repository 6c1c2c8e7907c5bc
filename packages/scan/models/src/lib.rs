#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Course, session, and demographic types.
//!
//! These types describe what a scan discovers (golf courses with a stable
//! external identifier), what the demographic lookup attaches to each
//! course (the enclosing tract's population statistics), and the on-disk
//! shape of a persisted scan session.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Two origins closer than this (in degrees, on both axes) are the same
/// search origin.
pub const ORIGIN_TOLERANCE_DEG: f64 = 1e-6;

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1609.34;

/// Whether `pct` is a usable population share: finite and within
/// `[0, 100]`.
#[must_use]
pub fn is_valid_pct(pct: f64) -> bool {
    pct.is_finite() && (0.0..=100.0).contains(&pct)
}

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates of `other` are within
    /// [`ORIGIN_TOLERANCE_DEG`] of this point.
    #[must_use]
    pub fn approx_eq(&self, other: &Self) -> bool {
        (self.lat - other.lat).abs() <= ORIGIN_TOLERANCE_DEG
            && (self.lng - other.lng).abs() <= ORIGIN_TOLERANCE_DEG
    }

    /// Whether the coordinates are finite and inside the WGS84 range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

/// A scan radius in statute miles.
///
/// Ordered and compared with [`f64::total_cmp`] so radii can live in
/// ordered sets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radius(f64);

impl Radius {
    /// Creates a radius from a distance in miles.
    #[must_use]
    pub const fn miles(miles: f64) -> Self {
        Self(miles)
    }

    /// The radius in miles.
    #[must_use]
    pub const fn as_miles(self) -> f64 {
        self.0
    }

    /// The radius in whole meters, truncated the way search APIs expect it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_meters(self) -> u64 {
        (self.0 * METERS_PER_MILE).max(0.0) as u64
    }
}

impl PartialEq for Radius {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Radius {}

impl PartialOrd for Radius {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Radius {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mi", self.0)
    }
}

/// A course returned by a discovery provider, before any demographic
/// lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable external identifier (e.g. a places API `place_id`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Course location.
    pub location: GeoPoint,
}

/// Population statistics for the region enclosing a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Share of the region's population in the tracked group, 0-100.
    pub pct_attribute: f64,
    /// Total population of the region.
    pub total_pop: u64,
    /// Region identifier (e.g. an 11-digit census tract GEOID).
    pub region_id: Option<String>,
}

impl Demographics {
    /// Builds demographics from a group count and a total count.
    ///
    /// The percentage is rounded to two decimals and is `0` for an empty
    /// region.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_counts(group_pop: u64, total_pop: u64, region_id: Option<String>) -> Self {
        let pct_attribute = if total_pop > 0 {
            ((group_pop as f64 / total_pop as f64) * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            pct_attribute,
            total_pop,
            region_id,
        }
    }
}

/// A discovered course with its optional demographic annotation.
///
/// Deserialization also accepts the field names written by the original
/// collection scripts (`place_id`, `geometry.location`, `pct_black`,
/// `census_geoid`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EntityRecord")]
pub struct Entity {
    /// Stable external identifier; the deduplication key.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Course location.
    pub location: GeoPoint,
    /// Share of the enclosing region's population in the tracked group.
    pub pct_attribute: Option<f64>,
    /// Total population of the enclosing region.
    pub total_pop: Option<u64>,
    /// Enclosing region identifier, kept for traceability.
    pub region_id: Option<String>,
}

impl Entity {
    /// Builds an entity from a discovery result and an optional lookup
    /// result.
    #[must_use]
    pub fn from_candidate(candidate: Candidate, demographics: Option<Demographics>) -> Self {
        let Candidate { id, name, location } = candidate;

        match demographics {
            Some(d) => Self {
                id,
                name,
                location,
                pct_attribute: Some(d.pct_attribute),
                total_pop: Some(d.total_pop),
                region_id: d.region_id,
            },
            None => Self {
                id,
                name,
                location,
                pct_attribute: None,
                total_pop: None,
                region_id: None,
            },
        }
    }

    /// Whether both the percentage and the population are present.
    #[must_use]
    pub const fn has_demographics(&self) -> bool {
        self.pct_attribute.is_some() && self.total_pop.is_some()
    }
}

/// Wire shape accepted when deserializing an [`Entity`].
#[derive(Deserialize)]
struct EntityRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    location: Option<GeoPoint>,
    #[serde(default)]
    geometry: Option<LegacyGeometry>,
    #[serde(default)]
    pct_attribute: Option<f64>,
    #[serde(default)]
    pct_black: Option<f64>,
    #[serde(default)]
    total_pop: Option<u64>,
    #[serde(default)]
    region_id: Option<String>,
    #[serde(default)]
    census_geoid: Option<String>,
}

#[derive(Deserialize)]
struct LegacyGeometry {
    location: GeoPoint,
}

/// An entity record that lacks an identifier or a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntityError {
    /// The missing field.
    pub missing: &'static str,
}

impl fmt::Display for InvalidEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid entity record: missing {}", self.missing)
    }
}

impl std::error::Error for InvalidEntityError {}

impl TryFrom<EntityRecord> for Entity {
    type Error = InvalidEntityError;

    fn try_from(record: EntityRecord) -> Result<Self, Self::Error> {
        let id = record
            .place_id
            .or(record.id)
            .ok_or(InvalidEntityError { missing: "id" })?;
        let location = record
            .location
            .or_else(|| record.geometry.map(|g| g.location))
            .ok_or(InvalidEntityError {
                missing: "location",
            })?;

        let mut pct_attribute = record.pct_attribute.or(record.pct_black);
        let mut total_pop = record.total_pop;
        if let Some(pct) = pct_attribute.filter(|pct| !is_valid_pct(*pct)) {
            log::warn!("Ignoring out-of-range percentage {pct} on course {id}");
            pct_attribute = None;
            total_pop = None;
        }

        Ok(Self {
            id,
            name: record.name.unwrap_or_default(),
            location,
            pct_attribute,
            total_pop,
            region_id: record.region_id.or(record.census_geoid),
        })
    }
}

/// Metadata block of a persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Search origin the radius history applies to. Absent for legacy
    /// files.
    #[serde(default)]
    pub origin: Option<GeoPoint>,
    /// Radii already fully scanned around `origin`.
    #[serde(default)]
    pub radii_completed: Vec<Radius>,
    /// When the session was last written.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Number of entities in the file.
    #[serde(default)]
    pub total_count: usize,
}

/// A scan session as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    /// Origin and radius history.
    pub metadata: SessionMetadata,
    /// Entities in discovery order.
    pub entities: Vec<Entity>,
}

/// Any session file shape the loader understands.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionFile {
    /// `{ "metadata": {...}, "entities": [...] }`
    Current(PersistedSession),
    /// A bare array of entities with no metadata wrapper.
    Legacy(Vec<Entity>),
}

impl From<SessionFile> for PersistedSession {
    fn from(file: SessionFile) -> Self {
        match file {
            SessionFile::Current(session) => session,
            SessionFile::Legacy(entities) => Self {
                metadata: SessionMetadata {
                    origin: None,
                    radii_completed: Vec::new(),
                    last_updated: None,
                    total_count: entities.len(),
                },
                entities,
            },
        }
    }
}
