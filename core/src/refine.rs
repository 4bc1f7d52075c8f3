use crate::smoothing::ConditionedStream;
use crate::types::Interval;

/// Andel av blokkens snittfart som fortsatt regnes som "i draget".
pub const REFINE_FRACTION: f64 = 0.9;

/// Strammer inn slutten på et intervall: ny slutt = siste tidspunkt i vinduet
/// der skalaens glattede fart fortsatt er >= `fraction × snitt`.
/// Finnes ingen slike punkter beholdes original slutt. `None` hvis vinduet
/// ikke inneholder samples.
pub fn refine_interval(
    stream: &ConditionedStream,
    iv: &Interval,
    fraction: f64,
) -> Option<Interval> {
    let idx = stream.window(iv.start_s, iv.end_s);
    if idx.is_empty() {
        return None;
    }
    let speed = &stream.speed_for(&iv.scale)[idx.clone()];
    let mean = speed.iter().sum::<f64>() / speed.len() as f64;
    let cut = fraction * mean;

    let end_s = speed
        .iter()
        .rposition(|&v| v >= cut)
        .map(|k| stream.time_s[idx.start + k])
        .unwrap_or(iv.end_s);

    Some(Interval::new(iv.start_s, end_s, iv.scale.as_str()))
}

pub fn refine_intervals(
    stream: &ConditionedStream,
    intervals: &[Interval],
    fraction: f64,
) -> Vec<Interval> {
    intervals
        .iter()
        .filter_map(|iv| refine_interval(stream, iv, fraction))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sample, Stream};
    use crate::profiles::ScaleProfile;
    use crate::smoothing::condition;

    fn stream_from(speeds: &[f64]) -> ConditionedStream {
        let samples = speeds
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(i as f64, v, 140.0))
            .collect();
        // uten profiler: speed_for faller tilbake til rå fart
        condition(&Stream::new(samples).unwrap(), &[])
    }

    #[test]
    fn trims_decay_tail() {
        // 10 s på 15 km/t, så en hale som faller av
        let mut v = vec![15.0; 10];
        v.extend([12.0, 10.0, 8.0, 6.0]);
        let s = stream_from(&v);
        let iv = Interval::new(0.0, 13.0, "short");
        // snitt = 186/14 = 13.29, 90 % = 11.96 => siste punkt >= er t=10 (12 km/t)
        let r = refine_interval(&s, &iv, REFINE_FRACTION).unwrap();
        assert_eq!(r.end_s, 10.0);
        assert_eq!(r.start_s, 0.0);
        assert_eq!(r.scale, "short");
    }

    #[test]
    fn uses_own_scale_channel() {
        let samples: Vec<Sample> = (0..40).map(|i| Sample::new(i as f64, 12.0, 140.0)).collect();
        let s = condition(&Stream::new(samples).unwrap(), &[ScaleProfile::short()]);
        let r = refine_interval(&s, &Interval::new(5.0, 30.0, "short"), REFINE_FRACTION).unwrap();
        assert_eq!(r.end_s, 30.0);
    }

    #[test]
    fn empty_window_is_dropped() {
        let s = stream_from(&[10.0, 10.0, 10.0]);
        let out = refine_intervals(&s, &[Interval::new(10.0, 20.0, "short")], REFINE_FRACTION);
        assert!(out.is_empty());
    }
}
