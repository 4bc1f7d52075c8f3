use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Ett øyeblikk i strømmen. Hull (manglende målinger) er `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time_s: f64,             // sek fra start
    pub speed_kmh: Option<f64>,  // km/t
    pub bpm: Option<f64>,        // puls
    #[serde(default)]
    pub altitude_m: Option<f64>, // meter
}

impl Sample {
    pub fn new(time_s: f64, speed_kmh: f64, bpm: f64) -> Self {
        Self {
            time_s,
            speed_kmh: Some(speed_kmh),
            bpm: Some(bpm),
            altitude_m: None,
        }
    }
}

/// Ordnet sekvens av samples for én økt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    samples: Vec<Sample>,
}

impl Stream {
    /// Bygger en strøm og sjekker at `time_s` er endelig og strengt stigende.
    pub fn new(samples: Vec<Sample>) -> CoreResult<Self> {
        for (i, s) in samples.iter().enumerate() {
            if !s.time_s.is_finite() {
                return Err(CoreError::NonMonotonicTime { index: i, time_s: s.time_s });
            }
            if i > 0 && s.time_s <= samples[i - 1].time_s {
                return Err(CoreError::NonMonotonicTime { index: i, time_s: s.time_s });
            }
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// (første, siste) tidsstempel, `None` for tom strøm.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => Some((a.time_s, b.time_s)),
            _ => None,
        }
    }

    pub fn has_altitude(&self) -> bool {
        self.samples.iter().any(|s| s.altitude_m.is_some())
    }
}

/// Metadata om økten fra opplaster (valgfritt, brukes kun i rapporten).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub activity_id: Option<u64>,
    pub name: Option<String>,
    pub sport_type: Option<String>,
    pub start_time_utc: Option<DateTime<Utc>>,
}
