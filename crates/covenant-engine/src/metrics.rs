#![allow(dead_code)] // Helpers are part of the embedding surface; not all call sites live in this crate

//! Prometheus metrics for the resolution engine.
//!
//! Tracks match outcomes, fixture selection, synthesis fallbacks, and
//! recording-session flush activity.

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Match outcomes per spec type
    pub static ref MATCH_TOTAL: CounterVec = register_counter_vec!(
        "covenant_match_total",
        "Total number of operation match calls",
        &["spec_type", "outcome"]  // outcome: matched|unmatched
    )
    .unwrap();

    /// Fixture selection outcomes
    pub static ref FIXTURE_SELECTION_TOTAL: CounterVec = register_counter_vec!(
        "covenant_fixture_selection_total",
        "Total number of fixture scoring passes",
        &["outcome"]  // outcome: selected|empty_pool
    )
    .unwrap();

    /// Responses synthesized by a handler (no usable fixture)
    pub static ref SYNTHESIS_TOTAL: CounterVec = register_counter_vec!(
        "covenant_synthesis_total",
        "Total number of handler-generated responses",
        &["spec_type", "result"]  // result: generated|failed
    )
    .unwrap();

    /// Recording session flush attempts
    pub static ref RECORDING_FLUSH_TOTAL: CounterVec = register_counter_vec!(
        "covenant_recording_flush_total",
        "Total number of recording flush attempts",
        &["trigger", "result"]  // trigger: threshold|explicit|close, result: ok|error
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

pub fn record_match(spec_type: &str, matched: bool) {
    let outcome = if matched { "matched" } else { "unmatched" };
    MATCH_TOTAL.with_label_values(&[spec_type, outcome]).inc();
}

pub fn record_fixture_selection(selected: bool) {
    let outcome = if selected { "selected" } else { "empty_pool" };
    FIXTURE_SELECTION_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_synthesis(spec_type: &str, ok: bool) {
    let result = if ok { "generated" } else { "failed" };
    SYNTHESIS_TOTAL.with_label_values(&[spec_type, result]).inc();
}

pub fn record_flush(trigger: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    RECORDING_FLUSH_TOTAL
        .with_label_values(&[trigger, result])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        record_match("openapi", true);
        record_match("graphql", false);
        record_fixture_selection(true);
        record_synthesis("openapi", true);
        record_flush("threshold", true);

        let metrics = collect_metrics();
        assert!(metrics.contains("covenant_match_total"));
        assert!(metrics.contains("covenant_fixture_selection_total"));
        assert!(metrics.contains("covenant_synthesis_total"));
        assert!(metrics.contains("covenant_recording_flush_total"));
    }

    #[test]
    fn test_failure_labels_register() {
        record_synthesis("asyncapi", false);
        record_flush("close", false);

        let metrics = collect_metrics();
        assert!(metrics.contains("covenant_synthesis_total"));
    }
}
