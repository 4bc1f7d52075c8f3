use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// --- RoundTo trait (offentlig, brukt av clustering og rapport) ---
pub trait RoundTo {
    fn round_to(self, dp: u32) -> f64;
}

impl RoundTo for f64 {
    #[inline]
    fn round_to(self, dp: u32) -> f64 {
        if dp == 0 { return self.round(); }
        let factor = 10_f64.powi(dp as i32);
        (self * factor).round() / factor
    }
}

/// Runder `value` til nærmeste multiplum av `step` (f.eks. 50 m eller 15 s).
/// `step <= 0` gir ren avrunding til heltall.
pub fn round_to_step(value: f64, step: f64) -> i64 {
    if step.is_nan() || step <= 0.0 {
        return value.round() as i64;
    }
    ((value / step).round() * step).round() as i64
}

/// Tempo i hele sekunder per kilometer.
///
/// Vises som `"M:SS min/km"`. Sammenligninger skjer numerisk på totalt antall
/// sekunder – lavere verdi betyr raskere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pace(u32);

impl Pace {
    pub fn from_secs_per_km(secs: u32) -> Self {
        Pace(secs)
    }

    /// `60 / speed` min/km, rundet til nærmeste sekund. `None` for fart <= 0.
    pub fn from_speed_kmh(speed_kmh: f64) -> Option<Self> {
        if !speed_kmh.is_finite() || speed_kmh <= 0.0 {
            return None;
        }
        let secs = (3600.0 / speed_kmh).round();
        if secs > u32::MAX as f64 {
            return None;
        }
        Some(Pace(secs as u32))
    }

    pub fn total_secs(self) -> u32 {
        self.0
    }

    pub fn minutes(self) -> u32 {
        self.0 / 60
    }

    pub fn seconds(self) -> u32 {
        self.0 % 60
    }

    /// Samme eller raskere enn `limit`.
    pub fn is_at_or_faster_than(self, limit: Pace) -> bool {
        self.0 <= limit.0
    }

    /// Strengt raskere enn `limit`.
    pub fn is_faster_than(self, limit: Pace) -> bool {
        self.0 < limit.0
    }

    /// Kort form uten enhet, f.eks. `"4:05"`.
    pub fn short(self) -> String {
        format!("{}:{:02}", self.minutes(), self.seconds())
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02} min/km", self.minutes(), self.seconds())
    }
}

impl FromStr for Pace {
    type Err = CoreError;

    /// Aksepterer `"4:15"` og `"4:15 min/km"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CoreError::InvalidPace(s.to_string());
        let clean = s.trim().trim_end_matches("min/km").trim();
        let (m, sec) = clean.split_once(':').ok_or_else(bad)?;
        let m: u32 = m.trim().parse().map_err(|_| bad())?;
        let sec: u32 = sec.trim().parse().map_err(|_| bad())?;
        if sec >= 60 {
            return Err(bad());
        }
        Ok(Pace(m * 60 + sec))
    }
}

impl From<Pace> for String {
    fn from(p: Pace) -> Self {
        p.short()
    }
}

impl TryFrom<String> for Pace {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Sekunder → `mm:ss` (brukes i intervall-listingen).
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Enkelt aritmetisk snitt; `None` for tom slice eller ikke-finite resultat.
pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    let m = xs.iter().sum::<f64>() / xs.len() as f64;
    m.is_finite().then_some(m)
}

/// Median (brukes av relativfilteret).
pub fn median(xs: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = xs.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let n = v.len();
    Some(if n % 2 == 1 { v[n / 2] } else { (v[n / 2 - 1] + v[n / 2]) / 2.0 })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_from_speed_and_display() {
        let p = Pace::from_speed_kmh(12.0).unwrap();
        assert_eq!(p.total_secs(), 300);
        assert_eq!(p.to_string(), "5:00 min/km");
        assert_eq!(Pace::from_speed_kmh(14.0).unwrap().to_string(), "4:17 min/km");
        assert!(Pace::from_speed_kmh(0.0).is_none());
        assert!(Pace::from_speed_kmh(-3.0).is_none());
    }

    #[test]
    fn pace_text_round_trips_across_speeds() {
        // 0.5 til 40 km/t: visning og parsing må treffe 3600 / v innen ett sekund
        let mut v = 0.5;
        while v <= 40.0 {
            let shown = Pace::from_speed_kmh(v).unwrap().to_string();
            let back: Pace = shown.parse().unwrap();
            let diff = (back.total_secs() as f64 - 3600.0 / v).abs();
            assert!(diff <= 1.0, "{v} km/t => {shown} ({diff} s avvik)");
            v += 0.013;
        }
    }

    #[test]
    fn pace_parse_accepts_unit_suffix() {
        assert_eq!("4:15".parse::<Pace>().unwrap().total_secs(), 255);
        assert_eq!("3:05 min/km".parse::<Pace>().unwrap().total_secs(), 185);
        assert!("4:75".parse::<Pace>().is_err());
        assert!("fast".parse::<Pace>().is_err());
    }

    #[test]
    fn pace_ordering_is_numeric() {
        // "10:00" < "9:00" leksikalsk, men 10 min/km er tregere
        let slow: Pace = "10:00".parse().unwrap();
        let fast: Pace = "9:00".parse().unwrap();
        assert!(fast.is_faster_than(slow));
        assert!(!slow.is_at_or_faster_than(fast));
    }

    #[test]
    fn round_helpers() {
        assert_eq!(round_to_step(338.4, 50.0), 350);
        assert_eq!(round_to_step(87.0, 5.0), 85);
        assert_eq!(round_to_step(232.0, 15.0), 225);
        assert!((1.23456_f64.round_to(2) - 1.23).abs() < 1e-12);
        assert_eq!(format_clock(125.0), "02:05");
        assert_eq!(median(&[3.0, 1.0, 2.0, 10.0]), Some(2.5));
    }
}
