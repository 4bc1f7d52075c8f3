use std::path::Path;
use std::time::Instant;

use crate::blocks::{extract_blocks, filter_by_cardio, filter_relative};
use crate::clustering::{
    classify_groups, cluster_blocks, dominant_pattern, is_interval_session, BucketRule,
};
use crate::config::AnalysisConfig;
use crate::detection::{detect_intervals, merge_overlaps};
use crate::error::{CoreError, CoreResult};
use crate::metrics;
use crate::models::{SessionMeta, Stream};
use crate::recovery::analyze_recoveries;
use crate::refine::refine_intervals;
use crate::smoothing::condition;
use crate::storage::read_stream_csv;
use crate::strava_api::parse_streams;
use crate::types::{Interval, SessionReport};

#[derive(Clone, Copy)]
pub struct AnalyzeInputs<'a> {
    pub stream: &'a Stream,
    /// Kun med i rapporten.
    pub meta: Option<&'a SessionMeta>,
    pub config: &'a AnalysisConfig,
}

/// Kjører hele kjeden: glatting → deteksjon per skala → sammenslåing →
/// forfining → blokker → filtre → gruppering → pauser → klassifisering.
///
/// Eneste feil er ugyldig oppsett; en økt uten intervaller gir en tom rapport.
pub fn analyze_session(inputs: AnalyzeInputs) -> CoreResult<SessionReport> {
    let cfg = inputs.config;
    cfg.validate()?;
    let started = Instant::now();

    let mut report = SessionReport {
        meta: inputs.meta.cloned().unwrap_or_default(),
        sample_count: inputs.stream.len(),
        ..SessionReport::default()
    };
    if inputs.stream.is_empty() {
        log::info!("empty stream, nothing to analyse");
        return Ok(report);
    }

    // 1️⃣ Glatting per skala
    let stream = condition(inputs.stream, &cfg.scales);

    // 2️⃣ Deteksjon per skala + sammenslåing på tvers
    let mut raw: Vec<Interval> = Vec::new();
    for p in &cfg.scales {
        let found = detect_intervals(&stream, p, cfg.mean_threshold_factor);
        metrics::RAW_INTERVALS
            .with_label_values(&[p.name.as_str()])
            .inc_by(found.len() as u64);
        raw.extend(found);
    }
    let raw_count = raw.len();
    let merged = merge_overlaps(raw, cfg.merge_iou);
    metrics::MERGED_AWAY.inc_by((raw_count - merged.len()) as u64);

    // 3️⃣ Forfining av kantene
    let mut refined = refine_intervals(&stream, &merged, cfg.refine_fraction);
    refined.sort_by(|a, b| a.start_s.total_cmp(&b.start_s));

    // 4️⃣ Blokker + valgfrie filtre
    let mut blocks = extract_blocks(&stream, &refined, cfg.min_block_duration_s);
    metrics::record_dropped("duration", refined.len() - blocks.len());
    if let Some(f) = &cfg.cardio_filter {
        let before = blocks.len();
        blocks = filter_by_cardio(blocks, f);
        metrics::record_dropped("cardio", before - blocks.len());
    }
    if let Some(f) = &cfg.relative_filter {
        let before = blocks.len();
        blocks = filter_relative(blocks, cfg.distance_bucket_m, f);
        metrics::record_dropped("relative", before - blocks.len());
    }
    metrics::BLOCKS_EXTRACTED.inc_by(blocks.len() as u64);

    // 5️⃣ Gruppering og pauser
    let rule = BucketRule::new(cfg.distance_bucket_m, &cfg.scales, cfg.cluster_key);
    let groups = cluster_blocks(&blocks, &rule);
    let recoveries = analyze_recoveries(&stream, &blocks, &rule);

    // 6️⃣ Klassifisering og dom
    report.classified = cfg.classify.then(|| classify_groups(&groups, &cfg.classification));
    report.is_interval_session = is_interval_session(&groups, cfg.interval_session_pace);
    report.pattern = cfg.pattern.as_ref().and_then(|p| dominant_pattern(&blocks, p));

    log::info!(
        "analysed {} samples: raw={} merged={} blocks={} groups={} recoveries={}",
        stream.len(),
        raw_count,
        merged.len(),
        blocks.len(),
        groups.len(),
        recoveries.len()
    );

    report.intervals = refined;
    report.blocks = blocks;
    report.groups = groups;
    report.recoveries = recoveries;

    metrics::SESSIONS_ANALYZED.inc();
    metrics::ANALYSIS_SECONDS.observe(started.elapsed().as_secs_f64());
    Ok(report)
}

/// Snarvei: analyse av en strøm med gitt oppsett, uten metadata.
pub fn analyze_stream(stream: &Stream, config: &AnalysisConfig) -> CoreResult<SessionReport> {
    analyze_session(AnalyzeInputs { stream, meta: None, config })
}

fn config_or_default(config_json: Option<&str>) -> CoreResult<AnalysisConfig> {
    config_json.map_or_else(|| Ok(AnalysisConfig::default()), AnalysisConfig::from_json_str)
}

fn report_to_json(report: &SessionReport) -> CoreResult<String> {
    serde_json::to_string(report).map_err(|e| CoreError::Json(e.to_string()))
}

/// CSV inn, rapport ut som JSON. Brukt av Python-bindingen.
pub fn analyze_csv_json<P: AsRef<Path>>(path: P, config_json: Option<&str>) -> CoreResult<String> {
    let cfg = config_or_default(config_json)?;
    report_to_json(&analyze_stream(&read_stream_csv(path)?, &cfg)?)
}

/// Strava-strømmer (key_by_type-JSON) inn, rapport ut som JSON.
pub fn analyze_streams_json(streams_json: &str, config_json: Option<&str>) -> CoreResult<String> {
    let cfg = config_or_default(config_json)?;
    report_to_json(&analyze_stream(&parse_streams(streams_json)?, &cfg)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;

    fn session(segments: &[(usize, f64)]) -> Stream {
        let mut samples = Vec::new();
        let mut t = 0usize;
        for &(len, speed) in segments {
            for _ in 0..len {
                let bpm = if speed > 10.0 { 150.0 + (t % 90) as f64 * 0.2 } else { 125.0 };
                samples.push(Sample::new(t as f64, speed, bpm));
                t += 1;
            }
        }
        Stream::new(samples).unwrap()
    }

    #[test]
    fn empty_stream_gives_empty_report() {
        let cfg = AnalysisConfig::default();
        let r = analyze_stream(&Stream::default(), &cfg).unwrap();
        assert!(r.is_empty());
        assert!(r.groups.is_empty() && r.recoveries.is_empty());
        assert!(!r.is_interval_session);
    }

    #[test]
    fn invalid_config_is_fatal() {
        let mut cfg = AnalysisConfig::default();
        cfg.scales.clear();
        assert!(analyze_stream(&session(&[(60, 8.0)]), &cfg).is_err());
    }

    #[test]
    fn steady_run_has_no_blocks() {
        let r = analyze_stream(&session(&[(600, 10.0)]), &AnalysisConfig::default()).unwrap();
        assert!(r.is_empty());
        assert!(r.pattern.is_none());
    }

    #[test]
    fn streams_json_round_trip_to_report() {
        let out = analyze_streams_json(r#"{ "time": { "data": [0, 1, 2] } }"#, Some("{}")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["sample_count"], 3);
        assert_eq!(v["blocks"].as_array().map(Vec::len), Some(0));
        assert!(analyze_streams_json("{}", None).is_err());
    }

    #[test]
    fn classification_only_when_enabled() {
        let s = session(&[(120, 6.0), (90, 14.0), (120, 6.0), (90, 14.0), (120, 6.0)]);
        let mut cfg = AnalysisConfig::default();
        assert!(analyze_stream(&s, &cfg).unwrap().classified.is_none());
        cfg.classify = true;
        assert!(analyze_stream(&s, &cfg).unwrap().classified.is_some());
    }
}
