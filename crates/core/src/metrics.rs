//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Curation (cycles, selections, skips)
//! - Synthesis (productions, narration fallbacks, durations)
//! - Delivery (uploads)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Curation
// =============================================================================

/// Curation cycles run.
pub static CURATION_CYCLES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("clipforge_curation_cycles_total", "Total curation cycles run").unwrap()
});

/// Candidates admitted to the queue, by track.
pub static CURATION_SELECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_curation_selected_total",
            "Total candidates admitted to the production queue",
        ),
        &["track"], // "AGRO", "INFO"
    )
    .unwrap()
});

/// Candidates skipped during curation, by reason.
pub static CURATION_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_curation_skipped_total",
            "Total candidates skipped during curation",
        ),
        &["reason"], // "duplicate", "low_score"
    )
    .unwrap()
});

// =============================================================================
// Synthesis
// =============================================================================

/// Finished productions, by outcome.
pub static PRODUCTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipforge_productions_total", "Total finished productions"),
        &["outcome"], // "done", "failed"
    )
    .unwrap()
});

/// Production duration in seconds.
pub static PRODUCTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipforge_production_duration_seconds",
            "Duration of one production run",
        )
        .buckets(vec![5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Narration degradations, by stage reached.
pub static NARRATION_FALLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_narration_fallbacks_total",
            "Total narration degradations",
        ),
        &["stage"], // "secondary", "placeholder"
    )
    .unwrap()
});

/// Productions currently in flight.
pub static PRODUCTIONS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipforge_productions_in_flight",
        "Productions currently being synthesized",
    )
    .unwrap()
});

// =============================================================================
// Delivery
// =============================================================================

/// Upload attempts, by result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipforge_uploads_total", "Total upload attempts"),
        &["result"], // "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Curation
        Box::new(CURATION_CYCLES.clone()),
        Box::new(CURATION_SELECTED.clone()),
        Box::new(CURATION_SKIPPED.clone()),
        // Synthesis
        Box::new(PRODUCTIONS_TOTAL.clone()),
        Box::new(PRODUCTION_DURATION.clone()),
        Box::new(NARRATION_FALLBACKS.clone()),
        Box::new(PRODUCTIONS_IN_FLIGHT.clone()),
        // Delivery
        Box::new(UPLOADS_TOTAL.clone()),
    ]
}
