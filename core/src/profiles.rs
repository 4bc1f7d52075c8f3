use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Navngitt deteksjonsprofil: kobler en glattingsoppløsning til terskler og
/// varighetsgrenser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleProfile {
    pub name: String,
    /// Savitzky–Golay-vindu (samples, oddetall).
    pub window: usize,
    /// Polynomgrad for glattingen (< window).
    pub poly_order: usize,
    /// Korteste intervall som teller (s).
    pub min_duration_s: f64,
    /// Antall sammenhengende samples under terskel som tåles før intervallet lukkes.
    pub max_pause: usize,
    /// Terskel relativt til maks av den glattede kanalen.
    pub threshold_fraction: f64,
    /// Bøttebredde (s) når varigheter rundes for gruppering.
    pub duration_bucket_s: f64,
}

impl ScaleProfile {
    /// sprint / 30"-1' / 200-400 m
    pub fn short() -> Self {
        Self {
            name: "short".into(),
            window: 11,
            poly_order: 2,
            min_duration_s: 20.0,
            max_pause: 6,
            threshold_fraction: 0.82,
            duration_bucket_s: 5.0,
        }
    }

    /// 1'-2' / 500-800 m
    pub fn medium() -> Self {
        Self {
            name: "medium".into(),
            window: 25,
            poly_order: 2,
            min_duration_s: 70.0,
            max_pause: 8,
            threshold_fraction: 0.80,
            duration_bucket_s: 10.0,
        }
    }

    /// 3'-6' / 1-2 km (f.eks. 4×4')
    pub fn long() -> Self {
        Self {
            name: "long".into(),
            window: 51,
            poly_order: 3,
            min_duration_s: 160.0,
            max_pause: 12,
            threshold_fraction: 0.78,
            duration_bucket_s: 15.0,
        }
    }

    /// Standardtabellen short/medium/long.
    pub fn default_set() -> Vec<ScaleProfile> {
        vec![Self::short(), Self::medium(), Self::long()]
    }

    pub fn speed_channel(&self) -> String {
        format!("speed_{}", self.name)
    }

    pub fn bpm_channel(&self) -> String {
        format!("bpm_{}", self.name)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let bad =
            |msg: &str| Err(CoreError::InvalidConfig(format!("scale '{}': {msg}", self.name)));
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidConfig("scale name must not be empty".into()));
        }
        if self.window == 0 || self.window % 2 == 0 {
            return bad("window must be odd and > 0");
        }
        if self.poly_order >= self.window {
            return bad("poly_order must be < window");
        }
        if !self.min_duration_s.is_finite() || self.min_duration_s < 0.0 {
            return bad("min_duration_s must be >= 0");
        }
        if !(self.threshold_fraction > 0.0 && self.threshold_fraction <= 1.0) {
            return bad("threshold_fraction must be in (0, 1]");
        }
        if !(self.duration_bucket_s > 0.0) || !self.duration_bucket_s.is_finite() {
            return bad("duration_bucket_s must be > 0");
        }
        Ok(())
    }
}

/// Vindu klemt til største oddetall <= `len`, grad klemt til `window - 1`.
pub fn clamp_window(window: usize, poly_order: usize, len: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let mut w = window.max(1);
    if w % 2 == 0 {
        w -= 1;
    }
    if w > len {
        w = if len % 2 == 1 { len } else { len - 1 };
    }
    (w, poly_order.min(w - 1))
}
