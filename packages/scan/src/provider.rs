//! Interfaces to the external data sources a scan depends on.
//!
//! Both providers are plain synchronous traits so callers can inject
//! file-backed implementations, HTTP clients, or test doubles.

use golf_map_scan_models::{Candidate, Demographics, GeoPoint, Radius};
use thiserror::Error;

/// A provider call that failed for reasons outside the caller's control.
///
/// Scans treat these as transient: the affected radius or lookup is
/// skipped and the scan continues.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing service or data source could not be reached.
    #[error("{provider} unavailable: {message}")]
    Unavailable {
        /// Provider name, for logs.
        provider: String,
        /// What went wrong.
        message: String,
    },

    /// The point lies in a known region whose statistics are missing or
    /// unusable.
    #[error("Region {region_id} has no usable statistics: {message}")]
    Incomplete {
        /// Identifier of the enclosing region.
        region_id: String,
        /// What is wrong with the region's statistics.
        message: String,
    },

    /// The provider answered with data that could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// Finds courses near a point.
pub trait DiscoveryProvider {
    /// Returns every course within `radius` of `origin`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the search could not be completed.
    fn search(&self, origin: GeoPoint, radius: Radius) -> Result<Vec<Candidate>, ProviderError>;
}

/// Resolves the demographics of the region enclosing a point.
pub trait DemographicProvider {
    /// Returns the enclosing region's statistics, or `None` if the point
    /// falls outside every known region.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the lookup could not be completed.
    fn lookup(&self, location: GeoPoint) -> Result<Option<Demographics>, ProviderError>;
}
