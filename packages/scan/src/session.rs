//! Deduplicated course collection with per-origin radius history.
//!
//! A [`ScanSession`] is the accumulated state of one scan campaign around a
//! fixed origin. Courses are keyed by their stable external identifier and
//! kept in discovery order. The first time an identifier is seen wins: a
//! course rediscovered at a larger radius keeps whatever demographic data it
//! received when it was first found.
//!
//! Radius history is only meaningful for the origin it was recorded
//! against. A session resumed from a file written for a different origin
//! treats every radius as unscanned, and the first radius completed for the
//! new origin replaces the stale history.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use golf_map_scan_models::{Entity, GeoPoint, PersistedSession, Radius, SessionMetadata};

/// What to do with previously discovered courses when a persisted session
/// was recorded for a different origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntityRetention {
    /// Drop courses found around the old origin.
    #[default]
    Discard,
    /// Keep courses found around the old origin.
    Keep,
}

/// Courses discovered around one origin, plus the radii already scanned.
#[derive(Debug, Clone)]
pub struct ScanSession {
    origin: GeoPoint,
    /// Origin that `radii_completed` was recorded against.
    history_origin: Option<GeoPoint>,
    radii_completed: BTreeSet<Radius>,
    entities: Vec<Entity>,
    /// id -> position in `entities`
    index: BTreeMap<String, usize>,
}

impl ScanSession {
    /// Creates an empty session around `origin`.
    #[must_use]
    pub const fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            history_origin: Some(origin),
            radii_completed: BTreeSet::new(),
            entities: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Resumes a persisted session for a scan around `origin`.
    ///
    /// Radius history is carried over as recorded; it only suppresses
    /// rescans if the persisted origin matches `origin`. Persisted courses
    /// are kept when the origin matches or is unrecorded (legacy files),
    /// and kept across an origin change only when `retention` is
    /// [`EntityRetention::Keep`].
    #[must_use]
    pub fn resume(
        origin: GeoPoint,
        persisted: PersistedSession,
        retention: EntityRetention,
    ) -> Self {
        let PersistedSession { metadata, entities } = persisted;

        let same_origin = metadata.origin.is_some_and(|o| o.approx_eq(&origin));

        let mut session = Self {
            origin,
            history_origin: metadata.origin,
            radii_completed: metadata.radii_completed.into_iter().collect(),
            entities: Vec::new(),
            index: BTreeMap::new(),
        };

        if same_origin || metadata.origin.is_none() || retention == EntityRetention::Keep {
            for entity in entities {
                session.add_if_new(entity);
            }
        } else {
            log::info!(
                "Persisted session was recorded for a different origin; discarding {} courses",
                entities.len()
            );
        }

        if !same_origin && !session.radii_completed.is_empty() {
            log::info!(
                "Radius history for {} does not apply to {origin}; all radii will be rescanned",
                session
                    .history_origin
                    .map_or_else(|| "an unknown origin".to_string(), |o| o.to_string()),
            );
        }

        session
    }

    /// The session's search origin.
    #[must_use]
    pub const fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Inserts `entity` if its id has not been seen before.
    ///
    /// Returns `true` if the entity was inserted. An existing entity with
    /// the same id is left untouched.
    pub fn add_if_new(&mut self, entity: Entity) -> bool {
        if self.index.contains_key(&entity.id) {
            return false;
        }

        self.index.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
        true
    }

    /// Whether a course with this id has already been discovered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Looks up a discovered course by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Discovered courses in discovery order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of discovered courses.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no courses have been discovered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn history_matches_origin(&self) -> bool {
        self.history_origin
            .is_some_and(|o| o.approx_eq(&self.origin))
    }

    /// Radii fully scanned around the session's origin.
    ///
    /// Empty when the recorded history belongs to a different origin.
    #[must_use]
    pub fn radii_completed(&self) -> BTreeSet<Radius> {
        if self.history_matches_origin() {
            self.radii_completed.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Whether a scan at `radius` still has to run.
    ///
    /// `false` only if `radius` was completed for an origin matching this
    /// session's origin.
    #[must_use]
    pub fn is_radius_needed(&self, radius: Radius) -> bool {
        !(self.history_matches_origin() && self.radii_completed.contains(&radius))
    }

    /// Records a full, successful scan at `radius` around the session's
    /// origin.
    ///
    /// If the recorded history belonged to another origin it is discarded
    /// first.
    pub fn mark_radius_complete(&mut self, radius: Radius) {
        let same_origin = self.history_matches_origin();
        self.radii_completed = self.merge_radius_history(&BTreeSet::from([radius]), same_origin);
        self.history_origin = Some(self.origin);
    }

    /// Combines the recorded radius history with `other_radii`.
    ///
    /// Returns the union when `same_origin` is true, otherwise
    /// `other_radii` unchanged.
    #[must_use]
    pub fn merge_radius_history(
        &self,
        other_radii: &BTreeSet<Radius>,
        same_origin: bool,
    ) -> BTreeSet<Radius> {
        if same_origin {
            self.radii_completed.union(other_radii).copied().collect()
        } else {
            other_radii.clone()
        }
    }

    /// Snapshot of the session in its on-disk shape.
    #[must_use]
    pub fn to_persisted(&self, last_updated: DateTime<Utc>) -> PersistedSession {
        PersistedSession {
            metadata: SessionMetadata {
                origin: Some(self.origin),
                radii_completed: self.radii_completed().into_iter().collect(),
                last_updated: Some(last_updated),
                total_count: self.entities.len(),
            },
            entities: self.entities.clone(),
        }
    }
}
