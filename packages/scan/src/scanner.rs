//! Runs discovery and demographic lookups into a [`ScanSession`].
//!
//! For each requested radius the scanner:
//!
//! 1. skips the radius if the session already completed it for this origin;
//! 2. asks the discovery provider for every course within the radius;
//! 3. for each course not already in the session, asks the demographic
//!    provider once and records the course with whatever came back;
//! 4. marks the radius complete.
//!
//! Provider failures never abort the scan. A failed search leaves the radius
//! unmarked so the next run retries it. A failed or empty lookup records the
//! course without demographics; it is not looked up again on later radii or
//! later runs. A region found without statistics still contributes its
//! identifier.

use golf_map_scan_models::{Candidate, Entity, Radius};

use crate::progress::ProgressCallback;
use crate::provider::{DemographicProvider, DiscoveryProvider, ProviderError};
use crate::session::ScanSession;

/// Counts describing what a scan did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Radii searched and marked complete.
    pub radii_scanned: Vec<Radius>,
    /// Radii skipped because they were already complete.
    pub radii_skipped: Vec<Radius>,
    /// Radii whose search failed.
    pub radii_failed: Vec<Radius>,
    /// Courses added to the session.
    pub new_entities: usize,
    /// Lookups that returned an error, including regions found without
    /// statistics.
    pub lookups_failed: usize,
    /// Lookups that found no enclosing region.
    pub lookups_missing: usize,
}

/// Drives a scan against a pair of providers.
pub struct Scanner<D, M> {
    discovery: D,
    demographics: M,
}

impl<D: DiscoveryProvider, M: DemographicProvider> Scanner<D, M> {
    /// Creates a scanner over the given providers.
    #[must_use]
    pub const fn new(discovery: D, demographics: M) -> Self {
        Self {
            discovery,
            demographics,
        }
    }

    /// Scans `radii` in order around the session's origin.
    pub fn scan(
        &self,
        session: &mut ScanSession,
        radii: &[Radius],
        progress: &dyn ProgressCallback,
    ) -> ScanReport {
        let mut report = ScanReport::default();

        for &radius in radii {
            if !session.is_radius_needed(radius) {
                log::info!(
                    "Radius {radius} already scanned around {}, skipping",
                    session.origin()
                );
                report.radii_skipped.push(radius);
                continue;
            }

            progress.set_message(format!("Scanning {radius}"));

            match self.scan_radius(session, radius, progress, &mut report) {
                Ok(()) => {
                    session.mark_radius_complete(radius);
                    report.radii_scanned.push(radius);
                }
                Err(e) => {
                    log::error!("Search at {radius} around {} failed: {e}", session.origin());
                    report.radii_failed.push(radius);
                }
            }
        }

        progress.finish(format!(
            "{} new courses, {} total",
            report.new_entities,
            session.len()
        ));

        log::info!(
            "Scan complete: {} radii scanned, {} skipped, {} failed; {} new courses \
             ({} lookups failed, {} outside known regions)",
            report.radii_scanned.len(),
            report.radii_skipped.len(),
            report.radii_failed.len(),
            report.new_entities,
            report.lookups_failed,
            report.lookups_missing,
        );

        report
    }

    fn scan_radius(
        &self,
        session: &mut ScanSession,
        radius: Radius,
        progress: &dyn ProgressCallback,
        report: &mut ScanReport,
    ) -> Result<(), ProviderError> {
        log::debug!(
            "Searching {} m around {}",
            radius.to_meters(),
            session.origin()
        );

        let candidates = self.discovery.search(session.origin(), radius)?;
        log::info!("Found {} courses within {radius}", candidates.len());

        progress.set_total(candidates.len() as u64);

        for candidate in candidates {
            if !session.contains(&candidate.id) {
                let entity = self.annotate(candidate, report);
                if session.add_if_new(entity) {
                    report.new_entities += 1;
                }
            }
            progress.inc(1);
        }

        Ok(())
    }

    fn annotate(&self, candidate: Candidate, report: &mut ScanReport) -> Entity {
        let (demographics, region_id) = match self.demographics.lookup(candidate.location) {
            Ok(Some(d)) => (Some(d), None),
            Ok(None) => {
                log::warn!(
                    "No region found for {} at {}",
                    candidate.name,
                    candidate.location
                );
                report.lookups_missing += 1;
                (None, None)
            }
            Err(ProviderError::Incomplete { region_id, message }) => {
                log::warn!(
                    "No statistics for {} in region {region_id}: {message}",
                    candidate.name
                );
                report.lookups_failed += 1;
                (None, Some(region_id))
            }
            Err(e) => {
                log::warn!("Demographic lookup failed for {}: {e}", candidate.name);
                report.lookups_failed += 1;
                (None, None)
            }
        };

        let mut entity = Entity::from_candidate(candidate, demographics);
        if entity.region_id.is_none() {
            entity.region_id = region_id;
        }
        entity
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    use golf_map_scan_models::{Demographics, GeoPoint, PersistedSession, SessionMetadata};

    use super::*;
    use crate::progress::NullProgress;
    use crate::session::EntityRetention;

    const ORIGIN: GeoPoint = GeoPoint::new(38.938_3, -76.820_2);

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: format!("Course {id}"),
            location: GeoPoint::new(38.9, -76.8),
        }
    }

    /// Returns a fixed candidate list per radius; radii without an entry
    /// fail.
    struct ScriptedDiscovery {
        results: BTreeMap<Radius, Vec<Candidate>>,
        calls: Cell<usize>,
    }

    impl ScriptedDiscovery {
        fn new(results: &[(f64, &[&str])]) -> Self {
            Self {
                results: results
                    .iter()
                    .map(|(r, ids)| {
                        (Radius::miles(*r), ids.iter().map(|id| candidate(id)).collect())
                    })
                    .collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl DiscoveryProvider for ScriptedDiscovery {
        fn search(
            &self,
            _origin: GeoPoint,
            radius: Radius,
        ) -> Result<Vec<Candidate>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            self.results
                .get(&radius)
                .cloned()
                .ok_or_else(|| ProviderError::Unavailable {
                    provider: "scripted".to_string(),
                    message: format!("no results for {radius}"),
                })
        }
    }

    /// Answers lookups from a queue, counting calls.
    struct QueuedDemographics {
        answers: RefCell<Vec<Result<Option<Demographics>, ProviderError>>>,
        calls: Cell<usize>,
    }

    impl QueuedDemographics {
        fn new(mut answers: Vec<Result<Option<Demographics>, ProviderError>>) -> Self {
            answers.reverse();
            Self {
                answers: RefCell::new(answers),
                calls: Cell::new(0),
            }
        }

        fn always(pct: f64, pop: u64) -> Self {
            Self::new((0..32).map(|_| Ok(Some(demo(pct, pop)))).collect())
        }
    }

    impl DemographicProvider for QueuedDemographics {
        fn lookup(&self, _location: GeoPoint) -> Result<Option<Demographics>, ProviderError> {
            self.calls.set(self.calls.get() + 1);
            self.answers.borrow_mut().pop().unwrap_or(Ok(None))
        }
    }

    fn demo(pct: f64, pop: u64) -> Demographics {
        Demographics {
            pct_attribute: pct,
            total_pop: pop,
            region_id: Some("11001000100".to_string()),
        }
    }

    fn timeout() -> ProviderError {
        ProviderError::Unavailable {
            provider: "census".to_string(),
            message: "timed out".to_string(),
        }
    }

    #[test]
    fn deduplicates_across_radii() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a", "b"]), (20.0, &["a", "b", "c"])]),
            QueuedDemographics::always(40.0, 100),
        );
        let mut session = ScanSession::new(ORIGIN);

        let report = scanner.scan(
            &mut session,
            &[Radius::miles(10.0), Radius::miles(20.0)],
            &NullProgress,
        );

        assert_eq!(session.len(), 3);
        assert_eq!(report.new_entities, 3);
        assert_eq!(scanner.demographics.calls.get(), 3);
        assert_eq!(
            report.radii_scanned,
            vec![Radius::miles(10.0), Radius::miles(20.0)]
        );
    }

    #[test]
    fn skips_completed_radii_without_calling_discovery() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a"])]),
            QueuedDemographics::always(40.0, 100),
        );
        let mut session = ScanSession::new(ORIGIN);
        session.mark_radius_complete(Radius::miles(10.0));

        let report = scanner.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        assert_eq!(scanner.discovery.calls.get(), 0);
        assert_eq!(report.radii_skipped, vec![Radius::miles(10.0)]);
        assert!(session.is_empty());
    }

    #[test]
    fn rerun_after_resume_makes_no_provider_calls() {
        let first = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a", "b"])]),
            QueuedDemographics::always(40.0, 100),
        );
        let mut session = ScanSession::new(ORIGIN);
        first.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        let persisted = session.to_persisted(chrono::Utc::now());
        let mut resumed = ScanSession::resume(ORIGIN, persisted, EntityRetention::Discard);

        let second = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a", "b"])]),
            QueuedDemographics::always(40.0, 100),
        );
        second.scan(&mut resumed, &[Radius::miles(10.0)], &NullProgress);

        assert_eq!(second.discovery.calls.get(), 0);
        assert_eq!(second.demographics.calls.get(), 0);
        assert_eq!(resumed.len(), 2);
    }

    #[test]
    fn failed_lookup_keeps_entity_without_demographics() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a", "b"])]),
            QueuedDemographics::new(vec![Err(timeout()), Ok(Some(demo(60.0, 1000)))]),
        );
        let mut session = ScanSession::new(ORIGIN);

        let report = scanner.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        assert_eq!(session.len(), 2);
        assert!(!session.get("a").unwrap().has_demographics());
        assert_eq!(session.get("b").unwrap().pct_attribute, Some(60.0));
        assert_eq!(report.lookups_failed, 1);
        assert_eq!(report.radii_scanned, vec![Radius::miles(10.0)]);
    }

    #[test]
    fn failed_lookup_is_not_retried_on_larger_radius() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a"]), (20.0, &["a"])]),
            QueuedDemographics::new(vec![Err(timeout()), Ok(Some(demo(60.0, 1000)))]),
        );
        let mut session = ScanSession::new(ORIGIN);

        scanner.scan(
            &mut session,
            &[Radius::miles(10.0), Radius::miles(20.0)],
            &NullProgress,
        );

        assert_eq!(scanner.demographics.calls.get(), 1);
        assert!(!session.get("a").unwrap().has_demographics());
    }

    #[test]
    fn region_without_statistics_keeps_region_id() {
        let incomplete = ProviderError::Incomplete {
            region_id: "24033980000".to_string(),
            message: "total_pop missing".to_string(),
        };
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a"])]),
            QueuedDemographics::new(vec![Err(incomplete)]),
        );
        let mut session = ScanSession::new(ORIGIN);

        let report = scanner.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        let entity = session.get("a").unwrap();
        assert!(!entity.has_demographics());
        assert_eq!(entity.region_id.as_deref(), Some("24033980000"));
        assert_eq!(report.lookups_failed, 1);
        assert_eq!(report.lookups_missing, 0);
    }

    #[test]
    fn missing_region_is_counted_separately() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a"])]),
            QueuedDemographics::new(vec![Ok(None)]),
        );
        let mut session = ScanSession::new(ORIGIN);

        let report = scanner.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        assert_eq!(report.lookups_missing, 1);
        assert_eq!(report.lookups_failed, 0);
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn failed_search_leaves_radius_incomplete() {
        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(20.0, &["a"])]),
            QueuedDemographics::always(40.0, 100),
        );
        let mut session = ScanSession::new(ORIGIN);

        let report = scanner.scan(
            &mut session,
            &[Radius::miles(10.0), Radius::miles(20.0)],
            &NullProgress,
        );

        assert_eq!(report.radii_failed, vec![Radius::miles(10.0)]);
        assert_eq!(report.radii_scanned, vec![Radius::miles(20.0)]);
        assert!(session.is_radius_needed(Radius::miles(10.0)));
        assert!(!session.is_radius_needed(Radius::miles(20.0)));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn origin_change_rescans_with_retained_entities() {
        let elsewhere = GeoPoint::new(41.878_1, -87.629_8);
        let persisted = PersistedSession {
            metadata: SessionMetadata {
                origin: Some(ORIGIN),
                radii_completed: vec![Radius::miles(10.0)],
                last_updated: None,
                total_count: 1,
            },
            entities: vec![Entity::from_candidate(candidate("a"), Some(demo(10.0, 50)))],
        };
        let mut session = ScanSession::resume(elsewhere, persisted, EntityRetention::Keep);

        let scanner = Scanner::new(
            ScriptedDiscovery::new(&[(10.0, &["a", "z"])]),
            QueuedDemographics::always(90.0, 10),
        );
        let report = scanner.scan(&mut session, &[Radius::miles(10.0)], &NullProgress);

        assert_eq!(scanner.discovery.calls.get(), 1);
        assert_eq!(scanner.demographics.calls.get(), 1);
        assert_eq!(report.new_entities, 1);
        assert_eq!(session.get("a").unwrap().pct_attribute, Some(10.0));
    }
}
