//! Prometheus metrics for the matching engine.
//!
//! This module provides metrics for:
//! - Match outcomes (by entity kind and waterfall tier)
//! - Match cache lookups
//! - Catalog calls made through the rate limiter

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// Matching
// =============================================================================

/// Match results by entity kind and method.
pub static MATCH_RESULTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebridge_match_results_total", "Total match results"),
        &["kind", "method"], // method: "unique_id", "exact", "fuzzy", "unmatched"
    )
    .unwrap()
});

/// Confidence of matched results.
pub static MATCH_CONFIDENCE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "tunebridge_match_confidence",
            "Distribution of confidence scores for matched entities",
        )
        .buckets(vec![0.7, 0.75, 0.8, 0.85, 0.9, 0.95, 0.99, 1.0]),
        &["kind"],
    )
    .unwrap()
});

// =============================================================================
// Cache
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebridge_cache_lookups_total", "Total match cache lookups"),
        &["result"], // "hit", "hit_unique_id", "miss", "error"
    )
    .unwrap()
});

// =============================================================================
// Catalog
// =============================================================================

/// Catalog calls by operation and result.
pub static CATALOG_CALLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunebridge_catalog_calls_total", "Total target catalog calls"),
        &["operation", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Operations waiting in the rate limiter queue.
pub static RATE_LIMITER_QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "tunebridge_rate_limiter_queue_depth",
        "Catalog operations waiting for a dispatch slot",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry.register(Box::new(MATCH_RESULTS.clone())).unwrap();
    registry
        .register(Box::new(MATCH_CONFIDENCE.clone()))
        .unwrap();
    registry.register(Box::new(CACHE_LOOKUPS.clone())).unwrap();
    registry.register(Box::new(CATALOG_CALLS.clone())).unwrap();
    registry
        .register(Box::new(RATE_LIMITER_QUEUE_DEPTH.clone()))
        .unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
