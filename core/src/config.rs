use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::detection::{MEAN_THRESHOLD_FACTOR, MERGE_IOU};
use crate::error::{CoreError, CoreResult};
use crate::profiles::ScaleProfile;
use crate::refine::REFINE_FRACTION;
use crate::units::Pace;

/// Minste varighet (s) en blokk må ha etter utpakking, uansett skala.
pub const MIN_BLOCK_DURATION_S: f64 = 8.0;
/// Standard distansebøtte (m) for gruppering.
pub const DISTANCE_BUCKET_M: f64 = 50.0;

/// Alt som styrer én analyse. Alle felter har standardverdier, så en tom
/// JSON (`{}`) gir standardoppsettet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub scales: Vec<ScaleProfile>,
    pub mean_threshold_factor: f64,
    pub merge_iou: f64,
    pub refine_fraction: f64,
    pub min_block_duration_s: f64,
    pub distance_bucket_m: f64,
    /// Hva blokkene grupperes på (gjelder også klassifisering og pauser).
    pub cluster_key: KeyMode,
    /// Kjør klassifiseringen (korte / lange drag / andre).
    pub classify: bool,
    pub classification: ClassificationConfig,
    pub cardio_filter: Option<CardioFilter>,
    pub relative_filter: Option<RelativeFilter>,
    /// Raskeste gruppe må være minst så rask for at økten regnes som intervaller.
    pub interval_session_pace: Pace,
    pub pattern: Option<PatternConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            scales: ScaleProfile::default_set(),
            mean_threshold_factor: MEAN_THRESHOLD_FACTOR,
            merge_iou: MERGE_IOU,
            refine_fraction: REFINE_FRACTION,
            min_block_duration_s: MIN_BLOCK_DURATION_S,
            distance_bucket_m: DISTANCE_BUCKET_M,
            cluster_key: KeyMode::default(),
            classify: false,
            classification: ClassificationConfig::default(),
            cardio_filter: None,
            relative_filter: None,
            interval_session_pace: Pace::from_secs_per_km(4 * 60 + 15),
            pattern: Some(PatternConfig::default()),
        }
    }
}

/// Gruppering på avrundet distanse (standard), skalaens avrundede varighet,
/// eller begge. Med begge splittes et sett når varigheten varierer over en
/// bøttegrense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    #[default]
    Distance,
    Duration,
    Both,
}

/// Terskler for korte / lange drag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub short_min_distance_m: f64,
    pub short_max_distance_m: f64,
    pub short_max_pace: Pace,
    pub long_max_pace: Pace,
    pub min_short_reps: usize,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            short_min_distance_m: 50.0,
            short_max_distance_m: 400.0,
            short_max_pace: Pace::from_secs_per_km(3 * 60 + 45),
            long_max_pace: Pace::from_secs_per_km(4 * 60 + 20),
            min_short_reps: 4,
        }
    }
}

/// Beholder blokker med `cardiac_drift >= min_cardiac_drift` og
/// `mean_bpm >= min_mean_bpm`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardioFilter {
    pub min_cardiac_drift: f64,
    pub min_mean_bpm: f64,
}

impl Default for CardioFilter {
    fn default() -> Self {
        Self { min_cardiac_drift: 7.0, min_mean_bpm: 125.0 }
    }
}

/// Beholder blokker innen ±`tolerance` av medianfarten i sin distansegruppe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeFilter {
    pub tolerance: f64,
    pub min_reps: usize,
}

impl Default for RelativeFilter {
    fn default() -> Self {
        Self { tolerance: 0.15, min_reps: 2 }
    }
}

/// "Beste mønster"-etterbehandlingen (f.eks. 4×4′).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub scale: String,
    pub duration_bucket_s: f64,
    pub min_reps: usize,
    pub four_by_four_min_s: f64,
    pub four_by_four_max_s: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            scale: "long".into(),
            duration_bucket_s: 15.0,
            min_reps: 3,
            four_by_four_min_s: 210.0,
            four_by_four_max_s: 270.0,
        }
    }
}

impl AnalysisConfig {
    /// Leser JSON; feil rapporteres med sti til feltet (f.eks. `scales[1].window`).
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let cfg: AnalysisConfig =
            serde_path_to_error::deserialize(de).map_err(CoreError::from_json_path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Avviser ugyldige terskler. Feil her er fatale for kjøringen.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));

        if self.scales.is_empty() {
            return invalid("at least one scale profile is required".into());
        }
        let mut seen = HashSet::new();
        for p in &self.scales {
            p.validate()?;
            if !seen.insert(p.name.as_str()) {
                return invalid(format!("duplicate scale '{}'", p.name));
            }
        }
        if !(self.mean_threshold_factor > 0.0) || !self.mean_threshold_factor.is_finite() {
            return invalid("mean_threshold_factor must be > 0".into());
        }
        if !(self.merge_iou > 0.0 && self.merge_iou <= 1.0) {
            return invalid("merge_iou must be in (0, 1]".into());
        }
        if !(self.refine_fraction > 0.0 && self.refine_fraction <= 1.0) {
            return invalid("refine_fraction must be in (0, 1]".into());
        }
        if !(self.min_block_duration_s >= 0.0) {
            return invalid("min_block_duration_s must be >= 0".into());
        }
        if !(self.distance_bucket_m > 0.0) || !self.distance_bucket_m.is_finite() {
            return invalid("distance_bucket_m must be > 0".into());
        }
        let c = &self.classification;
        if !(c.short_min_distance_m >= 0.0 && c.short_min_distance_m <= c.short_max_distance_m) {
            return invalid(
                "classification distances must satisfy 0 <= short_min <= short_max".into(),
            );
        }
        if let Some(r) = &self.relative_filter {
            if !(r.tolerance >= 0.0 && r.tolerance < 1.0) {
                return invalid("relative_filter.tolerance must be in [0, 1)".into());
            }
        }
        if let Some(p) = &self.pattern {
            if !(p.duration_bucket_s > 0.0) {
                return invalid("pattern.duration_bucket_s must be > 0".into());
            }
            if p.four_by_four_min_s > p.four_by_four_max_s {
                return invalid("pattern four_by_four range is inverted".into());
            }
        }
        Ok(())
    }
}
