//! Prometheus-tellere for analysekjøringene.
//!
//! Registreres i default-registeret første gang de brukes.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter,
    IntCounterVec, TextEncoder,
};

pub static SESSIONS_ANALYZED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("intervalgraph_sessions_analyzed_total", "Number of sessions analysed")
        .expect("Failed to create sessions_analyzed metric")
});

/// Rå intervaller per skala, før sammenslåing.
pub static RAW_INTERVALS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "intervalgraph_raw_intervals_total",
        "Candidate intervals found by the detector, per scale",
        &["scale"]
    )
    .expect("Failed to create raw_intervals metric")
});

pub static MERGED_AWAY: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "intervalgraph_intervals_merged_away_total",
        "Intervals dropped because a longer overlapping interval won"
    )
    .expect("Failed to create merged_away metric")
});

pub static BLOCKS_EXTRACTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "intervalgraph_blocks_extracted_total",
        "Blocks kept after extraction and filters"
    )
        .expect("Failed to create blocks_extracted metric")
});

/// Blokker som faller ut, per årsak (`duration`, `cardio`, `relative`).
pub static BLOCKS_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "intervalgraph_blocks_dropped_total",
        "Blocks removed, by reason",
        &["reason"]
    )
    .expect("Failed to create blocks_dropped metric")
});

pub static ANALYSIS_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "intervalgraph_analysis_seconds",
        "Wall time for one session analysis",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to create analysis_seconds metric")
});

pub(crate) fn record_dropped(reason: &str, n: usize) {
    if n > 0 {
        BLOCKS_DROPPED.with_label_values(&[reason]).inc_by(n as u64);
    }
}

/// Alle registrerte metrikker i Prometheus' tekstformat.
pub fn gather_text() -> String {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buf) {
        log::warn!("could not encode metrics: {e}");
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
