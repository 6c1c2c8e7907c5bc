//! Fixed-width histogram of course percentages over `[0, 100]`.

use golf_map_analytics_models::HistogramBin;
use golf_map_scan_models::Entity;

/// Default number of histogram bins.
pub const DEFAULT_BINS: usize = 20;

/// Bins every course percentage into `bins` equal-width bins spanning
/// `[0, 100]`.
///
/// Courses without a percentage are dropped. Values outside the range are
/// clamped into the first or last bin, and exactly `100` falls in the last
/// bin. Returns no bins when `bins` is zero.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn histogram(entities: &[Entity], bins: usize) -> Vec<HistogramBin> {
    if bins == 0 {
        return Vec::new();
    }

    let width = 100.0 / bins as f64;
    let mut counts = vec![0usize; bins];

    for pct in entities.iter().filter_map(|e| e.pct_attribute) {
        if pct.is_nan() {
            continue;
        }
        let idx = ((pct.clamp(0.0, 100.0) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count,
        })
        .collect()
}
