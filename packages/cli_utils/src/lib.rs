#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the golf map CLI.
//!
//! [`init_logger`] installs `pretty_env_logger` behind
//! `indicatif-log-bridge` so log lines and progress bars share the
//! terminal. [`IndicatifProgress`] renders scan progress through the
//! [`ProgressCallback`] trait.

use std::time::Duration;

use golf_map_scan::progress::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";
const RADIUS_TEMPLATE: &str = "  {msg} [{bar:40.green/dim}] {pos}/{len} courses ({elapsed})";

/// Scan progress rendered as an `indicatif` bar.
///
/// Spins while a radius search is in flight, then counts candidates once
/// the scanner reports how many the radius returned. Each radius resets
/// the count.
pub struct IndicatifProgress {
    bar: ProgressBar,
    radius_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Adds a scan bar labelled `message` to `multi`.
    #[must_use]
    pub fn scan_bar(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            radius_style: radius_style(),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn radius_style() -> ProgressStyle {
    let style = ProgressStyle::with_template(RADIUS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    style.progress_chars("=> ")
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_style(self.radius_style.clone());
        self.bar.set_length(total);
        self.bar.reset();
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs the global logger and returns the [`MultiProgress`] every
/// progress bar must be added to.
///
/// Log output is routed through the bars so a redraw never tears a log
/// line. The level defaults to `info` and can be narrowed or widened with
/// `RUST_LOG`.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let logger = builder.build();
    let max_level = logger.filter();

    if indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already installed");
    }
    log::set_max_level(max_level);

    multi
}
