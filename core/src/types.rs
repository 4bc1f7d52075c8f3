use serde::{Deserialize, Serialize};

use crate::models::SessionMeta;
use crate::units::Pace;

/// Rått effort-intervall fra én skala. Lever bare gjennom én analyse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start_s: f64,
    pub end_s: f64,
    pub scale: String,
}

impl Interval {
    pub fn new(start_s: f64, end_s: f64, scale: impl Into<String>) -> Self {
        Self { start_s, end_s, scale: scale.into() }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }
}

/// Ferdig effort-blokk med metrikker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub start_s: f64,
    pub end_s: f64,
    pub duration_s: f64,
    pub distance_m: f64,
    pub mean_speed_kmh: f64,
    pub mean_bpm: Option<f64>,
    /// Puls ved slutt minus puls ved start.
    pub cardiac_drift: Option<f64>,
    pub scale: String,
}

/// Gruppenøkkel: avrundet distanse (m) og/eller varighet (s), etter
/// `KeyMode`. Delen som ikke brukes er `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterKey {
    pub distance_m: Option<i64>,
    pub duration_s: Option<i64>,
}

impl ClusterKey {
    /// `"4 × 350 m"`, `"4 × 90 s"` eller `"4 × 350 m / 90 s"`.
    pub fn label(&self, repetitions: usize) -> String {
        match (self.distance_m, self.duration_s) {
            (Some(d), Some(t)) => format!("{repetitions} × {d} m / {t} s"),
            (Some(d), None) => format!("{repetitions} × {d} m"),
            (None, Some(t)) => format!("{repetitions} × {t} s"),
            (None, None) => format!("{repetitions} ×"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub repetitions: usize,
    /// `"<count> × <value> <unit>"`, f.eks. `"4 × 350 m"`.
    pub label: String,
    pub pace: Option<Pace>,
    /// `"M:SS min/km"` eller `"N/A"`.
    pub pace_display: String,
    pub mean_speed_kmh: f64,
    pub mean_duration_s: f64,
    pub mean_distance_m: f64,
    pub mean_bpm: Option<f64>,
    pub mean_cardiac_drift: Option<f64>,
    pub scales: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub key: ClusterKey,
    pub blocks: Vec<Block>,
    pub summary: GroupSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatClass {
    ShortRepeats,
    LongRepeats,
    Other,
}

impl RepeatClass {
    pub fn title(self) -> &'static str {
        match self {
            RepeatClass::ShortRepeats => "short repeats",
            RepeatClass::LongRepeats => "long repeats",
            RepeatClass::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedGroup {
    pub class: RepeatClass,
    pub group: ClusterGroup,
}

/// Pausen mellom to direkte etterfølgende blokker i samme gruppe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoverySegment {
    pub key: ClusterKey,
    /// Samme etikett som gruppen, f.eks. `"4 × 350 m"`.
    pub group_label: String,
    /// Start på blokken pausen følger etter.
    pub after_block_start_s: f64,
    pub start_s: f64,
    pub end_s: f64,
    pub duration_s: f64,
    pub mean_speed_kmh: f64,
    pub pace: Option<Pace>,
    pub pace_display: String,
    pub mean_bpm: Option<f64>,
}

/// Resultat av mønster-etterbehandlingen (f.eks. 4×4′).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternHint {
    pub scale: String,
    pub repetitions: usize,
    pub rounded_duration_s: i64,
    /// Satt når mønsteret faller i 4×4′-vinduet.
    pub four_by_four: bool,
    pub label: String,
}

/// Hele analysen for én økt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub meta: SessionMeta,
    pub sample_count: usize,
    pub intervals: Vec<Interval>,
    pub blocks: Vec<Block>,
    pub groups: Vec<ClusterGroup>,
    pub recoveries: Vec<RecoverySegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classified: Option<Vec<ClassifiedGroup>>,
    pub is_interval_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternHint>,
}

impl SessionReport {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
