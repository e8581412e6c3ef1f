//! Prometheus metrics for core components.
//!
//! Registered by the server and served at `/metrics`:
//! - Parsing (listings matched, misses)
//! - Items by reconciliation outcome
//! - Sources aborted, run duration

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Parsing
// =============================================================================

/// Listings a title pattern matched, by source.
pub static LISTINGS_PARSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scrapeyard_listings_parsed_total",
            "Listings whose title matched a known pattern",
        ),
        &["source"],
    )
    .unwrap()
});

/// Listings no pattern matched, by source.
pub static PARSE_MISSES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scrapeyard_parse_misses_total",
            "Listings whose title matched no known pattern",
        ),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Items and sources
// =============================================================================

/// Candidates processed, by source and outcome.
pub static ITEMS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrapeyard_items_processed_total", "Candidates processed"),
        &["source", "outcome"], // "created", "updated", "unchanged", "not_found", "failed"
    )
    .unwrap()
});

/// Sources abandoned because their first page could not be fetched.
pub static SOURCE_ABORTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrapeyard_source_aborts_total", "Sources aborted in a run"),
        &["source"],
    )
    .unwrap()
});

// =============================================================================
// Runs
// =============================================================================

pub static RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("scrapeyard_runs_total", "Scrape runs completed").unwrap()
});

/// Duration of a full run in seconds.
pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("scrapeyard_run_duration_seconds", "Duration of a scrape run")
            .buckets(vec![1.0, 10.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(LISTINGS_PARSED.clone()),
        Box::new(PARSE_MISSES.clone()),
        Box::new(ITEMS_PROCESSED.clone()),
        Box::new(SOURCE_ABORTS.clone()),
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
    ]
}
