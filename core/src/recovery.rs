use std::collections::HashMap;

use crate::clustering::BucketRule;
use crate::smoothing::ConditionedStream;
use crate::types::{Block, RecoverySegment};
use crate::units::{mean, Pace, RoundTo};

/// Pausene mellom direkte etterfølgende blokker med samme gruppenøkkel.
///
/// Blokkene sorteres på start. Ligger en blokk fra en annen gruppe imellom,
/// beregnes ingen pause. Tomme pausevinduer hoppes over.
pub fn analyze_recoveries(
    stream: &ConditionedStream,
    blocks: &[Block],
    rule: &BucketRule,
) -> Vec<RecoverySegment> {
    let mut ordered: Vec<&Block> = blocks.iter().collect();
    ordered.sort_by(|a, b| a.start_s.total_cmp(&b.start_s));
    let mut counts: HashMap<_, usize> = HashMap::new();
    for b in &ordered {
        *counts.entry(rule.key(b)).or_default() += 1;
    }

    ordered
        .windows(2)
        .filter_map(|pair| {
            let (cur, next) = (pair[0], pair[1]);
            let key = rule.key(cur);
            if key != rule.key(next) {
                return None;
            }
            let idx = stream.window(cur.end_s, next.start_s);
            if idx.is_empty() {
                return None;
            }
            let t = &stream.time_s[idx.clone()];
            let speeds = &stream.speed_for(&cur.scale)[idx.clone()];
            let mean_speed_kmh = mean(speeds).unwrap_or(0.0);
            let mean_bpm = if stream.has_heart_rate {
                mean(&stream.bpm_for(&cur.scale)[idx]).map(|v| v.round_to(1))
            } else {
                None
            };
            let pace = Pace::from_speed_kmh(mean_speed_kmh);
            let reps = counts.get(&key).copied().unwrap_or_default();
            Some(RecoverySegment {
                key,
                group_label: key.label(reps),
                after_block_start_s: cur.start_s,
                start_s: t[0],
                end_s: t[t.len() - 1],
                duration_s: t[t.len() - 1] - t[0],
                mean_speed_kmh,
                pace,
                pace_display: pace.map(|p| p.to_string()).unwrap_or_else(|| "N/A".into()),
                mean_bpm,
            })
        })
        .collect()
}
