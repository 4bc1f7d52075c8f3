use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::{ClassificationConfig, KeyMode, PatternConfig};
use crate::profiles::ScaleProfile;
use crate::types::{
    Block, ClassifiedGroup, ClusterGroup, ClusterKey, GroupSummary, PatternHint, RepeatClass,
};
use crate::units::{mean, round_to_step, Pace, RoundTo};

/// Varighetsbøtte for skalaer som ikke finnes i profiltabellen.
const FALLBACK_DURATION_BUCKET_S: f64 = 10.0;

/// Regler for avrunding: fast distansebøtte, varighetsbøtte per skala.
/// `mode` bestemmer hvilke deler som inngår i nøkkelen.
#[derive(Debug, Clone)]
pub struct BucketRule {
    distance_bucket_m: f64,
    duration_buckets: HashMap<String, f64>,
    mode: KeyMode,
}

impl BucketRule {
    pub fn new(distance_bucket_m: f64, profiles: &[ScaleProfile], mode: KeyMode) -> Self {
        Self {
            distance_bucket_m,
            duration_buckets: profiles
                .iter()
                .map(|p| (p.name.clone(), p.duration_bucket_s))
                .collect(),
            mode,
        }
    }

    pub fn key(&self, block: &Block) -> ClusterKey {
        let distance = || round_to_step(block.distance_m, self.distance_bucket_m);
        let duration = || {
            let step = self
                .duration_buckets
                .get(&block.scale)
                .copied()
                .unwrap_or(FALLBACK_DURATION_BUCKET_S);
            round_to_step(block.duration_s, step)
        };
        match self.mode {
            KeyMode::Distance => ClusterKey { distance_m: Some(distance()), duration_s: None },
            KeyMode::Duration => ClusterKey { distance_m: None, duration_s: Some(duration()) },
            KeyMode::Both => {
                ClusterKey { distance_m: Some(distance()), duration_s: Some(duration()) }
            }
        }
    }
}

/// Grupperer blokker med identisk nøkkel.
/// Gruppene kommer sortert på nøkkel, blokkene i hver gruppe på start.
pub fn cluster_blocks(blocks: &[Block], rule: &BucketRule) -> Vec<ClusterGroup> {
    let mut groups: BTreeMap<ClusterKey, Vec<Block>> = BTreeMap::new();
    for b in blocks {
        groups.entry(rule.key(b)).or_default().push(b.clone());
    }
    groups
        .into_iter()
        .map(|(key, mut members)| {
            members.sort_by(|a, b| a.start_s.total_cmp(&b.start_s));
            let summary = summarize(&key, &members);
            ClusterGroup { key, blocks: members, summary }
        })
        .collect()
}

/// Sammendrag for én gruppe.
pub fn summarize(key: &ClusterKey, blocks: &[Block]) -> GroupSummary {
    let speeds: Vec<f64> = blocks.iter().map(|b| b.mean_speed_kmh).collect();
    let mean_speed_kmh = mean(&speeds).unwrap_or(0.0);
    let pace = Pace::from_speed_kmh(mean_speed_kmh);
    let bpms: Vec<f64> = blocks.iter().filter_map(|b| b.mean_bpm).collect();
    let drifts: Vec<f64> = blocks.iter().filter_map(|b| b.cardiac_drift).collect();
    let durations: Vec<f64> = blocks.iter().map(|b| b.duration_s).collect();
    let distances: Vec<f64> = blocks.iter().map(|b| b.distance_m).collect();
    let scales: BTreeSet<String> = blocks.iter().map(|b| b.scale.clone()).collect();

    GroupSummary {
        repetitions: blocks.len(),
        label: key.label(blocks.len()),
        pace,
        pace_display: pace.map(|p| p.to_string()).unwrap_or_else(|| "N/A".into()),
        mean_speed_kmh,
        mean_duration_s: mean(&durations).unwrap_or(0.0).round_to(1),
        mean_distance_m: mean(&distances).unwrap_or(0.0).round_to(1),
        mean_bpm: mean(&bpms).map(|v| v.round_to(1)),
        mean_cardiac_drift: mean(&drifts).map(|v| v.round_to(1)),
        scales: scales.into_iter().collect(),
    }
}

/// Klassifiserer grupper i korte drag / lange drag / andre.
///
/// * korte: `short_min <= d <= short_max`, minst `min_short_reps` reps og
///   tempo raskere enn `short_max_pace`
/// * lange: `d > short_max` og tempo raskere enn `long_max_pace`
/// * andre: `d > short_min` og tempo raskere enn `long_max_pace`
///
/// Resten (for få reps, for tregt) utelates uten feil.
pub fn classify_groups(
    groups: &[ClusterGroup],
    cfg: &ClassificationConfig,
) -> Vec<ClassifiedGroup> {
    groups
        .iter()
        .filter_map(|g| {
            let class = classify(g, cfg);
            if class.is_none() {
                log::debug!("group '{}' left unclassified", g.summary.label);
            }
            class.map(|class| ClassifiedGroup { class, group: g.clone() })
        })
        .collect()
}

fn classify(group: &ClusterGroup, cfg: &ClassificationConfig) -> Option<RepeatClass> {
    let pace = group.summary.pace?;
    // uten distanse i nøkkelen brukes gruppens snittdistanse
    let d = group
        .key
        .distance_m
        .map_or(group.summary.mean_distance_m, |d| d as f64);
    let reps = group.summary.repetitions;

    if d >= cfg.short_min_distance_m
        && d <= cfg.short_max_distance_m
        && reps >= cfg.min_short_reps
        && pace.is_faster_than(cfg.short_max_pace)
    {
        Some(RepeatClass::ShortRepeats)
    } else if d > cfg.short_max_distance_m && pace.is_faster_than(cfg.long_max_pace) {
        Some(RepeatClass::LongRepeats)
    } else if d > cfg.short_min_distance_m && pace.is_faster_than(cfg.long_max_pace) {
        Some(RepeatClass::Other)
    } else {
        None
    }
}

/// Økten regnes som intervalltrening når raskeste gruppe holder `threshold`
/// eller raskere.
pub fn is_interval_session(groups: &[ClusterGroup], threshold: Pace) -> bool {
    groups
        .iter()
        .filter_map(|g| g.summary.pace)
        .min()
        .is_some_and(|fastest| fastest.is_at_or_faster_than(threshold))
}

/// Etterbehandling: hyppigste avrundede varighet blant blokkene fra
/// `cfg.scale`. Rapporteres når den gjentas minst `min_reps` ganger.
/// Ved likt antall vinner korteste varighet.
pub fn dominant_pattern(blocks: &[Block], cfg: &PatternConfig) -> Option<PatternHint> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for b in blocks.iter().filter(|b| b.scale == cfg.scale) {
        *counts.entry(round_to_step(b.duration_s, cfg.duration_bucket_s)).or_default() += 1;
    }
    // max_by_key gir siste ved likhet, så vi går baklengs for å få korteste
    let (&duration, &reps) = counts.iter().rev().max_by_key(|&(_, n)| *n)?;
    if reps < cfg.min_reps {
        return None;
    }
    let secs = duration as f64;
    let four_by_four = secs >= cfg.four_by_four_min_s && secs <= cfg.four_by_four_max_s;
    let mut label = format!("{reps} × ~{duration}s");
    if four_by_four {
        label.push_str(" (≈ 4′)");
    }
    Some(PatternHint {
        scale: cfg.scale.clone(),
        repetitions: reps,
        rounded_duration_s: duration,
        four_by_four,
        label,
    })
}
