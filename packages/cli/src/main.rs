#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the golf course demographics toolchain.
//!
//! `scan` grows a persisted session of courses around an origin using the
//! local course catalog and census tracts. `report`, `export`, and `info`
//! work from the saved session without touching the providers.
//!
//! Uses `indicatif-log-bridge` (via [`golf_map_cli_utils::init_logger`])
//! so log lines and the scan progress bar never fight for the terminal.

mod config;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use golf_map_analytics::report::{build_report, log_summary, write_report};
use golf_map_cli_utils::{IndicatifProgress, MultiProgress};
use golf_map_scan::scanner::Scanner;
use golf_map_scan::session::ScanSession;
use golf_map_scan::{export, store};
use golf_map_scan_models::{GeoPoint, PersistedSession, SessionMetadata};
use golf_map_spatial::catalog::CourseCatalog;
use golf_map_spatial::tracts::TractIndex;

use crate::config::{Config, ConfigError};

#[derive(Parser)]
#[command(
    name = "golf_map",
    about = "Golf course discovery and demographic analysis"
)]
struct Cli {
    /// TOML file layered over the built-in defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover courses around the origin and look up their census tracts.
    /// Radii already scanned for the same origin are skipped.
    Scan {
        /// Origin latitude (overrides `origin.lat`)
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Origin longitude (overrides `origin.lng`)
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Comma-separated radii in miles (e.g., "10,20")
        #[arg(long, value_delimiter = ',')]
        radii: Option<Vec<f64>>,
        /// Keep courses from a session recorded for a different origin
        #[arg(long)]
        keep_entities: bool,
    },
    /// Aggregate the saved session and write `report.json`
    Report {
        /// Percentage threshold for the binary split (overrides `report.threshold`)
        #[arg(long)]
        threshold: Option<f64>,
        /// Decimal places for the weighted mean distance (overrides `report.precision`)
        #[arg(long)]
        precision: Option<u8>,
        /// Report path (defaults to `<output_dir>/report.json`)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write the saved courses as JSON and CSV
    Export {
        /// Output directory (defaults to `data.output_dir`)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Print the saved session's metadata
    Info,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = golf_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            lat,
            lng,
            radii,
            keep_entities,
        } => {
            let origin = lat.zip(lng).map(|(lat, lng)| GeoPoint::new(lat, lng));
            config.apply_overrides(origin, radii);
            if keep_entities {
                config.scan.keep_entities_on_origin_change = true;
            }
            run_scan(&config, &multi)?;
        }
        Commands::Report {
            threshold,
            precision,
            out,
        } => {
            if let Some(threshold) = threshold {
                config.report.threshold = threshold;
            }
            if let Some(precision) = precision {
                config.report.precision = precision;
            }
            config.validate()?;
            run_report(&config, out)?;
        }
        Commands::Export { out_dir } => {
            config.validate()?;
            run_export(&config, out_dir)?;
        }
        Commands::Info => run_info(&config),
    }

    Ok(())
}

fn run_scan(config: &Config, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    config.validate_for_scan()?;

    let catalog_path = config
        .data
        .catalog_path
        .as_deref()
        .ok_or(ConfigError::Missing("data.catalog_path"))?;
    let tracts_path = config
        .data
        .tracts_path
        .as_deref()
        .ok_or(ConfigError::Missing("data.tracts_path"))?;

    let start = Instant::now();
    let scanner = Scanner::new(
        CourseCatalog::load(catalog_path)?,
        TractIndex::load(tracts_path)?,
    );

    let saved = store::load(&config.data.session_path);
    let mut session = saved.map_or_else(
        || ScanSession::new(config.origin),
        |persisted| ScanSession::resume(config.origin, persisted, config.retention()),
    );

    let progress =
        IndicatifProgress::scan_bar(multi, &format!("Scanning around {}", config.origin));
    let report = scanner.scan(&mut session, &config.radii(), &progress);

    store::save(&config.data.session_path, &session)?;

    if !report.radii_failed.is_empty() {
        log::warn!(
            "{} radii failed and will be retried on the next run",
            report.radii_failed.len()
        );
    }
    log::info!(
        "Session holds {} courses ({:.1}s)",
        session.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Saved session, or an empty one when none exists.
fn load_saved(config: &Config) -> PersistedSession {
    store::load(&config.data.session_path).unwrap_or_else(|| PersistedSession {
        metadata: SessionMetadata {
            origin: None,
            radii_completed: Vec::new(),
            last_updated: None,
            total_count: 0,
        },
        entities: Vec::new(),
    })
}

fn run_report(config: &Config, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let saved = load_saved(config);
    let origin = saved.metadata.origin.unwrap_or(config.origin);

    let report = build_report(&saved.entities, origin, config.report_options());
    log_summary(&report);

    let path = out.unwrap_or_else(|| config.data.output_dir.join("report.json"));
    write_report(&path, &report)?;

    Ok(())
}

fn run_export(config: &Config, out_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let saved = load_saved(config);
    let dir = out_dir.unwrap_or_else(|| config.data.output_dir.clone());

    let json_path = dir.join("golf_courses.json");
    let csv_path = dir.join("golf_courses.csv");
    export::write_json(&json_path, &saved.entities)?;
    export::write_csv(&csv_path, &saved.entities)?;

    log::info!(
        "Exported {} courses to {} and {}",
        saved.entities.len(),
        json_path.display(),
        csv_path.display()
    );
    Ok(())
}

fn run_info(config: &Config) {
    let Some(saved) = store::load(&config.data.session_path) else {
        println!("No session at {}", config.data.session_path.display());
        return;
    };

    let metadata = &saved.metadata;
    let with_demographics = saved
        .entities
        .iter()
        .filter(|e| e.has_demographics())
        .count();

    println!("Session:          {}", config.data.session_path.display());
    println!(
        "Origin:           {}",
        metadata
            .origin
            .map_or_else(|| "unknown".to_string(), |o| o.to_string())
    );
    println!(
        "Radii completed:  {}",
        metadata
            .radii_completed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "Last updated:     {}",
        metadata
            .last_updated
            .map_or_else(|| "unknown".to_string(), |t| t.to_rfc3339())
    );
    println!("Courses:          {}", saved.entities.len());
    println!("With census data: {with_demographics}");
}
