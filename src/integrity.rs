//! Distortion checks: Lie Factor, zero baseline, cross-panel scale consistency.
//!
//! Every check reports; none of them fails normalization.

use serde::{Deserialize, Serialize};

use crate::frame::LayoutResult;
use crate::models::EffectSize;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum LieFactor {
    Computed { value: f64, compliant: bool },
    /// One of the effects is zero (or missing), so the ratio is meaningless.
    Indeterminate { reason: String },
}

impl LieFactor {
    pub fn value(&self) -> Option<f64> {
        match self {
            LieFactor::Computed { value, .. } => Some(*value),
            LieFactor::Indeterminate { .. } => None,
        }
    }

    pub fn is_violation(&self) -> bool {
        matches!(
            self,
            LieFactor::Computed {
                compliant: false,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistortionReport {
    pub lie_factor: LieFactor,
    pub zero_baseline_respected: bool,
    pub scales_consistent_across_panels: bool,
}

impl DistortionReport {
    pub fn has_violation(&self) -> bool {
        self.lie_factor.is_violation()
            || !self.zero_baseline_respected
            || !self.scales_consistent_across_panels
    }
}

/// `depicted / data`, compliant within `[1 - tolerance, 1 + tolerance]`.
pub fn lie_factor(depicted: f64, data: f64, tolerance: f64) -> LieFactor {
    if !depicted.is_finite() || !data.is_finite() {
        return LieFactor::Indeterminate {
            reason: "effect sizes must be finite".to_string(),
        };
    }
    if depicted == 0.0 || data == 0.0 {
        return LieFactor::Indeterminate {
            reason: "effect shown and effect in data must both be non-zero".to_string(),
        };
    }
    let value = depicted / data;
    let compliant = value >= 1.0 - tolerance && value <= 1.0 + tolerance;
    LieFactor::Computed { value, compliant }
}

/// Effect sizes a bar drawn from `frame.padded_min` implies.
///
/// The data effect is the relative change from the smallest to the largest
/// value; the depicted effect is the same change in drawn bar length. Only
/// defined for positive data above the baseline.
pub fn bar_effect(frame: &LayoutResult) -> Option<EffectSize> {
    let (lo, hi, base) = (frame.data_min, frame.data_max, frame.padded_min);
    if lo <= 0.0 || lo <= base || hi <= lo {
        return None;
    }
    Some(EffectSize {
        depicted: (hi - lo) / (lo - base),
        data: (hi - lo) / lo,
    })
}

/// Bars need their value axis to reach zero.
pub fn zero_baseline_respected(required: bool, frame: &LayoutResult) -> bool {
    !required || frame.padded_min <= 0.0
}

/// Every panel frame must be identical to the shared one.
pub fn scales_consistent(panel_frames: &[&LayoutResult]) -> bool {
    match panel_frames.split_first() {
        Some((first, rest)) => rest.iter().all(|f| *f == *first),
        None => true,
    }
}
