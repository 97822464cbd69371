//! 1-D collision resolution for direct labels.
//!
//! Labels are sorted by value and pushed forward greedily: each one sits at
//! `max(raw, previous + min_gap)`. Rank order is preserved, adjacent labels are
//! at least `min_gap` apart, and each label stays as close to its value as the
//! labels below it allow.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelPlacement {
    pub entity_id: String,
    pub text: String,
    pub side: LabelSide,
    pub raw: f64,
    pub position: f64,
}

/// Non-fatal: labels had to be pushed past the nominal axis extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutWarning {
    pub side: LabelSide,
    /// How far the top label sits beyond the extent.
    pub overflow: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelLayout {
    /// In input order.
    pub placements: Vec<LabelPlacement>,
    pub warning: Option<LayoutWarning>,
}

/// A label to place: entity id, label text, raw value.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRequest {
    pub entity_id: String,
    pub text: String,
    pub raw: f64,
}

impl LabelRequest {
    pub fn new(entity_id: &str, text: &str, raw: f64) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            text: text.to_string(),
            raw,
        }
    }
}

/// Greedy forward push over `(id, value)` pairs; returns positions in input order.
///
/// Ties are broken by input order. `min_gap` must be positive.
pub fn resolve_positions(raw: &[f64], min_gap: f64) -> Vec<f64> {
    push_apart(raw, min_gap).0
}

/// The flag is set when some gap fell short of `min_gap` because `p + min_gap`
/// rounds back to `p` at that magnitude; such labels sit one ulp apart instead.
fn push_apart(raw: &[f64], min_gap: f64) -> (Vec<f64>, bool) {
    let mut order: Vec<usize> = (0..raw.len()).collect();
    order.sort_by(|&a, &b| raw[a].total_cmp(&raw[b]).then(a.cmp(&b)));

    let mut out = vec![0.0; raw.len()];
    let mut prev: Option<f64> = None;
    let mut squeezed = false;
    for idx in order {
        let pos = match prev {
            Some(p) => {
                let mut next = raw[idx].max(p + min_gap);
                if next - p < min_gap * (1.0 - 1e-9) {
                    squeezed = true;
                    if next <= p {
                        next = p.next_up();
                    }
                }
                next
            }
            None => raw[idx],
        };
        out[idx] = pos;
        prev = Some(pos);
    }
    (out, squeezed)
}

/// Resolve one side of labels within `[extent_min, extent_max]`.
pub fn resolve_labels(
    requests: &[LabelRequest],
    side: LabelSide,
    min_gap: f64,
    extent: (f64, f64),
) -> LabelLayout {
    let raw: Vec<f64> = requests.iter().map(|r| r.raw).collect();
    let (positions, squeezed) = push_apart(&raw, min_gap);

    let placements: Vec<LabelPlacement> = requests
        .iter()
        .zip(&positions)
        .map(|(r, &position)| LabelPlacement {
            entity_id: r.entity_id.clone(),
            text: r.text.clone(),
            side,
            raw: r.raw,
            position,
        })
        .collect();

    let (lo, hi) = extent;
    let needed = min_gap * (requests.len().saturating_sub(1)) as f64;
    let top = positions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let warning = if needed > hi - lo || top > hi || squeezed {
        let overflow = (top - hi).max(0.0);
        let mut message = format!(
            "{} {:?} labels need {:.3} of axis but only {:.3} is available; top label overflows by {:.3}",
            requests.len(),
            side,
            needed,
            hi - lo,
            overflow
        );
        if squeezed {
            message.push_str(&format!(
                "; a gap of {min_gap} is below float precision at this magnitude, \
                 some labels are only one ulp apart"
            ));
        }
        log::warn!("{message}");
        Some(LayoutWarning {
            side,
            overflow,
            message,
        })
    } else {
        None
    };

    LabelLayout {
        placements,
        warning,
    }
}
