//! Progress reporting for scans.
//!
//! The scanner reports through [`ProgressCallback`] so the library does not
//! depend on a terminal renderer. The CLI supplies an `indicatif` bar;
//! tests use [`NullProgress`].

/// Receives progress updates while a scan runs.
pub trait ProgressCallback {
    /// Sets the number of candidates in the current radius.
    fn set_total(&self, total: u64);

    /// Advances by `delta` candidates.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the scan as done.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
