use std::collections::BTreeMap;

use crate::config::{CardioFilter, RelativeFilter};
use crate::smoothing::ConditionedStream;
use crate::types::{Block, Interval};
use crate::units::{mean, median, round_to_step};

/// Gjør et (forfinet) intervall om til en blokk med metrikker.
///
/// Distanse = Σ fart/3.6 × dt over vinduet, med skalaens glattede fart.
/// Snitt og cardiac drift bruker skalaens kanaler, ellers rå-kolonnene.
/// `None` hvis vinduet er tomt eller kortere enn `min_duration_s`.
pub fn extract_block(
    stream: &ConditionedStream,
    iv: &Interval,
    min_duration_s: f64,
) -> Option<Block> {
    let idx = stream.window(iv.start_s, iv.end_s);
    if idx.is_empty() {
        return None;
    }
    let t = &stream.time_s[idx.clone()];
    let speed = &stream.speed_for(&iv.scale)[idx.clone()];

    let start_s = t[0];
    let end_s = t[t.len() - 1];
    let duration_s = end_s - start_s;
    if duration_s < min_duration_s || duration_s <= 0.0 {
        return None;
    }

    // dt for første punkt er 0
    let distance_m: f64 = t
        .windows(2)
        .zip(&speed[1..])
        .map(|(w, v)| v.max(0.0) / 3.6 * (w[1] - w[0]))
        .sum();

    let (mean_bpm, cardiac_drift) = if stream.has_heart_rate {
        let bpm = &stream.bpm_for(&iv.scale)[idx];
        (mean(bpm), Some(bpm[bpm.len() - 1] - bpm[0]).filter(|d| d.is_finite()))
    } else {
        (None, None)
    };

    Some(Block {
        start_s,
        end_s,
        duration_s,
        distance_m,
        mean_speed_kmh: mean(speed).unwrap_or(0.0),
        mean_bpm,
        cardiac_drift,
        scale: iv.scale.clone(),
    })
}

pub fn extract_blocks(
    stream: &ConditionedStream,
    intervals: &[Interval],
    min_duration_s: f64,
) -> Vec<Block> {
    intervals
        .iter()
        .filter_map(|iv| {
            let b = extract_block(stream, iv, min_duration_s);
            if b.is_none() {
                log::debug!(
                    "dropping {:.0}-{:.0}s ({}): below duration floor",
                    iv.start_s,
                    iv.end_s,
                    iv.scale
                );
            }
            b
        })
        .collect()
}

/// Pulsfilter. Blokker uten puls faller alltid ut.
pub fn filter_by_cardio(blocks: Vec<Block>, filter: &CardioFilter) -> Vec<Block> {
    blocks
        .into_iter()
        .filter(|b| passes_cardio(b, filter))
        .collect()
}

pub fn passes_cardio(block: &Block, filter: &CardioFilter) -> bool {
    matches!(
        (block.cardiac_drift, block.mean_bpm),
        (Some(d), Some(h)) if d >= filter.min_cardiac_drift && h >= filter.min_mean_bpm
    )
}

/// Fjerner "unormale" blokker: per avrundet distanse kreves minst
/// `min_reps` blokker, og bare de innen ±tolerance av gruppens medianfart
/// beholdes. Rekkefølgen (start) bevares.
pub fn filter_relative(
    blocks: Vec<Block>,
    distance_bucket_m: f64,
    filter: &RelativeFilter,
) -> Vec<Block> {
    let mut by_distance: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for b in &blocks {
        by_distance
            .entry(round_to_step(b.distance_m, distance_bucket_m))
            .or_default()
            .push(b.mean_speed_kmh);
    }

    let bounds: BTreeMap<i64, (f64, f64)> = by_distance
        .into_iter()
        .filter(|(_, speeds)| speeds.len() >= filter.min_reps)
        .filter_map(|(d, speeds)| {
            let m = median(&speeds)?;
            Some((d, (m * (1.0 - filter.tolerance), m * (1.0 + filter.tolerance))))
        })
        .collect();

    blocks
        .into_iter()
        .filter(|b| {
            bounds
                .get(&round_to_step(b.distance_m, distance_bucket_m))
                .is_some_and(|&(lo, hi)| b.mean_speed_kmh >= lo && b.mean_speed_kmh <= hi)
        })
        .collect()
}
