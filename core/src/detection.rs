use ordered_float::OrderedFloat;

use crate::profiles::ScaleProfile;
use crate::smoothing::ConditionedStream;
use crate::types::Interval;

/// Standardfaktor for snitt-terskelen (`1.15 × mean`).
pub const MEAN_THRESHOLD_FACTOR: f64 = 1.15;
/// Standard IoU-grense for sammenslåing.
pub const MERGE_IOU: f64 = 0.5;

/// Effektiv terskel = den strengeste av maks-relativ og snitt-relativ terskel.
/// `None` for tom kanal eller stillstand (terskel <= 0).
pub fn effective_threshold(channel: &[f64], fraction: f64, mean_factor: f64) -> Option<f64> {
    if channel.is_empty() {
        return None;
    }
    let max = channel.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = channel.iter().sum::<f64>() / channel.len() as f64;
    let thr = (fraction * max).max(mean_factor * mean);
    (thr.is_finite() && thr > 0.0).then_some(thr)
}

/// Tilstandsmaskin over én glattet kanal.
///
/// * Utenfor → innenfor når `speed >= threshold` (start = nåværende tid).
/// * Innenfor: samples under terskel teller opp `below`, alt annet nullstiller.
///   Når `below > max_pause` lukkes intervallet på nåværende tid.
/// * Slutter strømmen innenfor, lukkes det på siste tidsstempel.
///
/// Intervaller kortere enn `min_duration_s` forkastes.
pub fn find_efforts(
    time_s: &[f64],
    speed: &[f64],
    threshold: f64,
    min_duration_s: f64,
    max_pause: usize,
) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    let mut start: Option<f64> = None;
    let mut below = 0usize;

    for (&t, &v) in time_s.iter().zip(speed) {
        match start {
            None => {
                if v >= threshold {
                    start = Some(t);
                    below = 0;
                }
            }
            Some(st) => {
                if v < threshold {
                    below += 1;
                    if below > max_pause {
                        if t - st >= min_duration_s {
                            out.push((st, t));
                        }
                        start = None;
                    }
                } else {
                    below = 0;
                }
            }
        }
    }

    // slutter "inne" i et drag
    if let (Some(st), Some(&last)) = (start, time_s.last()) {
        if last - st >= min_duration_s {
            out.push((st, last));
        }
    }
    out
}

/// Rå intervaller for én skala, på skalaens egen glattede fartskanal.
pub fn detect_intervals(
    stream: &ConditionedStream,
    profile: &ScaleProfile,
    mean_factor: f64,
) -> Vec<Interval> {
    let speed = stream.speed_for(&profile.name);
    let Some(threshold) = effective_threshold(speed, profile.threshold_fraction, mean_factor) else {
        return Vec::new();
    };
    let found = find_efforts(
        &stream.time_s,
        speed,
        threshold,
        profile.min_duration_s,
        profile.max_pause,
    );
    log::debug!(
        "scale={} threshold={:.2} km/h intervals={}",
        profile.name,
        threshold,
        found.len()
    );
    found
        .into_iter()
        .map(|(s, e)| Interval::new(s, e, profile.name.as_str()))
        .collect()
}

/// Union av rå intervaller over alle skalaer (ikke slått sammen).
pub fn detect_multiscale(
    stream: &ConditionedStream,
    profiles: &[ScaleProfile],
    mean_factor: f64,
) -> Vec<Interval> {
    profiles
        .iter()
        .flat_map(|p| detect_intervals(stream, p, mean_factor))
        .collect()
}

/// Tidsmessig IoU: snitt / union av de to tidsspennene.
pub fn temporal_iou(a: &Interval, b: &Interval) -> f64 {
    let inter = (a.end_s.min(b.end_s) - a.start_s.max(b.start_s)).max(0.0);
    let union = a.duration_s() + b.duration_s() - inter;
    if union > 0.0 { inter / union } else { 0.0 }
}

/// Slår sammen intervaller med IoU >= `iou_threshold` og beholder det lengste.
///
/// Sorteres på (start, end) og flettes grådig inn i et beholdt-sett, så
/// resultatet er uavhengig av rekkefølgen i input. Ved lik lengde beholdes
/// det som allerede ligger i settet.
pub fn merge_overlaps(mut intervals: Vec<Interval>, iou_threshold: f64) -> Vec<Interval> {
    intervals.sort_by_key(|iv| (OrderedFloat(iv.start_s), OrderedFloat(iv.end_s)));

    let mut kept: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match kept.iter().position(|k| temporal_iou(&iv, k) >= iou_threshold) {
            Some(j) => {
                if iv.duration_s() > kept[j].duration_s() {
                    kept[j] = iv;
                }
            }
            None => kept.push(iv),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn threshold_is_stricter_of_max_and_mean() {
        // maks-relativ vinner
        let ch = vec![6.0, 6.0, 6.0, 14.0];
        let thr = effective_threshold(&ch, 0.8, 1.15).unwrap();
        assert!((thr - 11.2).abs() < 1e-12);
        // snitt-relativ vinner ved lav varians
        let flat = vec![10.0, 10.2, 10.1, 10.0];
        let thr = effective_threshold(&flat, 0.8, 1.15).unwrap();
        assert!((thr - 1.15 * 10.075).abs() < 1e-9);
        assert!(effective_threshold(&[], 0.8, 1.15).is_none());
        assert!(effective_threshold(&[0.0; 50], 0.8, 1.15).is_none());
    }

    #[test]
    fn entry_is_inclusive_at_threshold() {
        let t = times(40);
        let at = vec![10.0; 40];
        assert_eq!(find_efforts(&t, &at, 10.0, 5.0, 3), vec![(0.0, 39.0)]);

        let below = vec![10.0 - 1e-9; 40];
        assert!(find_efforts(&t, &below, 10.0, 5.0, 3).is_empty());
    }

    #[test]
    fn pause_must_exceed_tolerance_to_close() {
        // 10 over, 3 under, 10 over, 5 under
        let mut v = vec![12.0; 10];
        v.extend([5.0; 3]);
        v.extend([12.0; 10]);
        v.extend([5.0; 5]);
        let t = times(v.len());

        // max_pause = 3: pausen på 3 tåles, lukker på 4. sample under terskel
        assert_eq!(find_efforts(&t, &v, 10.0, 5.0, 3), vec![(0.0, 26.0)]);
        // max_pause = 2: pausen på 3 bryter drag nr. 1 ved 3. sample under terskel
        assert_eq!(find_efforts(&t, &v, 10.0, 5.0, 2), vec![(0.0, 12.0), (13.0, 25.0)]);
    }

    #[test]
    fn short_efforts_are_dropped() {
        let mut v = vec![5.0; 10];
        v.extend([12.0; 4]);
        v.extend([5.0; 10]);
        let t = times(v.len());
        assert!(find_efforts(&t, &v, 10.0, 10.0, 2).is_empty());
    }

    #[test]
    fn open_effort_closes_at_last_timestamp() {
        let mut v = vec![5.0; 10];
        v.extend([12.0; 30]);
        let t = times(v.len());
        assert_eq!(find_efforts(&t, &v, 10.0, 20.0, 2), vec![(10.0, 39.0)]);
        assert!(find_efforts(&t, &v, 10.0, 30.0, 2).is_empty());
    }

    #[test]
    fn iou_of_disjoint_and_nested() {
        let a = Interval::new(0.0, 10.0, "short");
        let b = Interval::new(20.0, 30.0, "short");
        assert_eq!(temporal_iou(&a, &b), 0.0);
        let c = Interval::new(0.0, 20.0, "medium");
        assert!((temporal_iou(&a, &c) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn merge_keeps_longer_with_own_scale() {
        let short = Interval::new(100.0, 190.0, "short");
        let medium = Interval::new(102.0, 200.0, "medium");
        let merged = merge_overlaps(vec![medium.clone(), short.clone()], MERGE_IOU);
        assert_eq!(merged, vec![medium.clone()]);
        // rekkefølge i input spiller ingen rolle
        assert_eq!(merge_overlaps(vec![short, medium.clone()], MERGE_IOU), vec![medium]);
    }

    #[test]
    fn merge_leaves_weak_overlaps_alone() {
        let a = Interval::new(0.0, 100.0, "short");
        let b = Interval::new(80.0, 200.0, "long");
        let merged = merge_overlaps(vec![a.clone(), b.clone()], MERGE_IOU);
        assert_eq!(merged, vec![a, b]);
    }
}
