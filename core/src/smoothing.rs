use std::collections::BTreeMap;
use std::ops::Range;

use crate::models::Stream;
use crate::profiles::{clamp_window, ScaleProfile};

/// Strømmen etter imputering + glatting. Alle kanaler har samme lengde og
/// indeks som rå-kolonnene.
#[derive(Debug, Clone, Default)]
pub struct ConditionedStream {
    pub time_s: Vec<f64>,
    pub speed_kmh: Vec<f64>,
    /// NaN overalt hvis økten mangler puls helt.
    pub bpm: Vec<f64>,
    pub has_heart_rate: bool,
    channels: BTreeMap<String, Vec<f64>>,
}

impl ConditionedStream {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Avledet kanal, f.eks. `"speed_short"`.
    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    /// Glattet fart for skalaen, ellers rå fart.
    pub fn speed_for(&self, scale: &str) -> &[f64] {
        self.channel(&format!("speed_{scale}")).unwrap_or(&self.speed_kmh)
    }

    /// Glattet puls for skalaen, ellers rå puls.
    pub fn bpm_for(&self, scale: &str) -> &[f64] {
        self.channel(&format!("bpm_{scale}")).unwrap_or(&self.bpm)
    }

    /// Indekser med `start <= t <= end` (tid er strengt stigende).
    pub fn window(&self, start_s: f64, end_s: f64) -> Range<usize> {
        let lo = self.time_s.partition_point(|&t| t < start_s);
        let hi = self.time_s.partition_point(|&t| t <= end_s);
        lo..hi.max(lo)
    }
}

/// Imputerer hull og legger til `speed_<scale>` / `bpm_<scale>` per profil.
pub fn condition(stream: &Stream, profiles: &[ScaleProfile]) -> ConditionedStream {
    let samples = stream.samples();
    let n = samples.len();
    let time_s: Vec<f64> = samples.iter().map(|s| s.time_s).collect();

    let speed_kmh = fill_gaps(samples.iter().map(|s| s.speed_kmh)).unwrap_or_else(|| {
        if n > 0 {
            log::warn!("stream has no speed values, treating as standstill");
        }
        vec![0.0; n]
    });
    let (bpm, has_heart_rate) = match fill_gaps(samples.iter().map(|s| s.bpm)) {
        Some(v) => (v, true),
        None => (vec![f64::NAN; n], false),
    };

    let mut channels = BTreeMap::new();
    for p in profiles {
        // glatting kan gi små negative utslag rundt stillstand
        let speed: Vec<f64> = savitzky_golay(&speed_kmh, p.window, p.poly_order)
            .into_iter()
            .map(|v| v.max(0.0))
            .collect();
        channels.insert(p.speed_channel(), speed);
        if has_heart_rate {
            // puls glattes minst med 2. grad
            channels.insert(p.bpm_channel(), savitzky_golay(&bpm, p.window, p.poly_order.max(2)));
        }
    }

    ConditionedStream {
        time_s,
        speed_kmh,
        bpm,
        has_heart_rate,
        channels,
    }
}

/// Forover-fyll, deretter bakover-fyll. `None` hvis kolonnen ikke har en eneste verdi.
pub fn fill_gaps<I>(values: I) -> Option<Vec<f64>>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut out = Vec::new();
    let mut last: Option<f64> = None;
    let mut leading = 0usize;
    for v in values {
        match v.filter(|x| x.is_finite()) {
            Some(x) => {
                last = Some(x);
                out.push(x);
            }
            None => match last {
                Some(x) => out.push(x),
                None => {
                    leading += 1;
                    out.push(f64::NAN);
                }
            },
        }
    }
    let first = out.get(leading).copied()?;
    for x in out.iter_mut().take(leading) {
        *x = first;
    }
    Some(out)
}

/// Savitzky–Golay-glatting med "interp"-kanter: de første/siste `w/2`
/// punktene evalueres fra et polynom tilpasset de første/siste `w` punktene.
/// Vinduet klemmes til strømmens lengde; resultatet har alltid samme lengde.
pub fn savitzky_golay(y: &[f64], window: usize, poly_order: usize) -> Vec<f64> {
    let n = y.len();
    let (w, p) = clamp_window(window, poly_order, n);
    if w <= 1 {
        return y.to_vec();
    }
    if w < window {
        log::debug!("savgol window {window} clamped to {w} for {n} samples");
    }
    let half = w / 2;
    let mut out = vec![0.0; n];

    let center = fit_weights(w, p, 0.0);
    for i in half..n - half {
        out[i] = dot(&center, &y[i - half..=i + half]);
    }

    let head = &y[..w];
    let tail = &y[n - w..];
    for j in 0..half {
        let left = fit_weights(w, p, j as f64 - half as f64);
        out[j] = dot(&left, head);
        let right = fit_weights(w, p, half as f64 - j as f64);
        out[n - 1 - j] = dot(&right, tail);
    }
    out
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Vekter `c` slik at `Σ c_j y_j` er minste-kvadraters-polynomet (grad `p`)
/// over `w` punkter med sentrerte posisjoner `j - w/2`, evaluert i `pos`.
fn fit_weights(w: usize, p: usize, pos: f64) -> Vec<f64> {
    let half = (w / 2) as f64;
    let m = p + 1;
    let xs: Vec<f64> = (0..w).map(|j| j as f64 - half).collect();

    // Normalligninger A^T A
    let mut ata = vec![vec![0.0; m]; m];
    for (r, row) in ata.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = xs.iter().map(|x| x.powi((r + c) as i32)).sum();
        }
    }
    let v: Vec<f64> = (0..m).map(|k| pos.powi(k as i32)).collect();
    let z = solve(ata, v);

    xs.iter()
        .map(|x| (0..m).map(|k| x.powi(k as i32) * z[k]).sum())
        .collect()
}

/// Gauss-eliminasjon med delvis pivotering. Matrisen er symmetrisk positiv
/// definitt så lenge `p < w`.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();
    for col in 0..n {
        let piv = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        a.swap(col, piv);
        b.swap(col, piv);
        let pivot_row = a[col].clone();
        let pivot_b = b[col];
        let d = pivot_row[col];
        if d.abs() < f64::EPSILON {
            continue;
        }
        for r in col + 1..n {
            let f = a[r][col] / d;
            if f == 0.0 {
                continue;
            }
            for (cell, pv) in a[r].iter_mut().zip(&pivot_row).skip(col) {
                *cell -= f * pv;
            }
            b[r] -= f * pivot_b;
        }
    }
    let mut x = vec![0.0; n];
    for r in (0..n).rev() {
        let s: f64 = (r + 1..n).map(|c| a[r][c] * x[c]).sum();
        x[r] = if a[r][r].abs() < f64::EPSILON { 0.0 } else { (b[r] - s) / a[r][r] };
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;

    #[test]
    fn savgol_preserves_polynomials_up_to_order() {
        // 2. grads polynom skal gjengis eksakt, også i kantene (interp)
        let y: Vec<f64> =
            (0..40).map(|i| 0.5 * (i as f64).powi(2) - 3.0 * i as f64 + 7.0).collect();
        let s = savitzky_golay(&y, 11, 2);
        assert_eq!(s.len(), y.len());
        for (a, b) in s.iter().zip(&y) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn savgol_damps_spike() {
        let mut y = vec![10.0; 30];
        y[15] = 40.0;
        let s = savitzky_golay(&y, 11, 2);
        assert!(s[15] < 25.0);
    }

    #[test]
    fn savgol_clamps_window_on_short_series() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let s = savitzky_golay(&y, 51, 3);
        assert_eq!(s.len(), 4);
        // vindu 3, grad 2 => eksakt gjengivelse
        for (a, b) in s.iter().zip(&y) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(savitzky_golay(&[5.0], 11, 2), vec![5.0]);
        assert!(savitzky_golay(&[], 11, 2).is_empty());
    }

    #[test]
    fn fill_gaps_forward_then_backward() {
        let v = fill_gaps(vec![None, Some(2.0), None, Some(f64::NAN), Some(5.0), None]).unwrap();
        assert_eq!(v, vec![2.0, 2.0, 2.0, 2.0, 5.0, 5.0]);
        assert!(fill_gaps(vec![None, None]).is_none());
    }

    #[test]
    fn condition_adds_aligned_channels() {
        let samples: Vec<Sample> = (0..60)
            .map(|i| Sample {
                time_s: i as f64,
                speed_kmh: if i % 7 == 0 { None } else { Some(10.0) },
                bpm: Some(130.0),
                altitude_m: None,
            })
            .collect();
        let stream = Stream::new(samples).unwrap();
        let c = condition(&stream, &ScaleProfile::default_set());
        for name in ["speed_short", "speed_medium", "speed_long", "bpm_short", "bpm_long"] {
            assert_eq!(c.channel(name).map(|ch| ch.len()), Some(60), "{name}");
        }
        assert!(c.speed_kmh.iter().all(|v| (*v - 10.0).abs() < 1e-12));
        assert_eq!(c.window(10.0, 12.5), 10..13);
    }

    #[test]
    fn missing_heart_rate_falls_back_to_raw() {
        let samples: Vec<Sample> = (0..20)
            .map(|i| Sample { time_s: i as f64, speed_kmh: Some(9.0), bpm: None, altitude_m: None })
            .collect();
        let c = condition(&Stream::new(samples).unwrap(), &[ScaleProfile::short()]);
        assert!(!c.has_heart_rate);
        assert!(c.channel("bpm_short").is_none());
        assert!(c.bpm_for("short")[0].is_nan());
    }
}
