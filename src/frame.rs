//! Range frames: axis extents that hug the data, and sparse tick sets.
//!
//! A frame always ticks its data minimum and maximum. Interior ticks are round
//! multiples of a 1/2/2.5/5 step, plus any caller-supplied marks inside the
//! data range. Ticks never leave `[data_min, data_max]`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub data_min: f64,
    pub data_max: f64,
    pub padded_min: f64,
    pub padded_max: f64,
    /// Ascending, deduplicated.
    pub ticks: Vec<f64>,
}

impl LayoutResult {
    pub fn includes_zero(&self) -> bool {
        self.padded_min <= 0.0 && self.padded_max >= 0.0
    }
}

/// Frames one small-multiples panel is drawn with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub panel_id: String,
    pub title: Option<String>,
    pub series_ids: Vec<String>,
    pub x: Option<LayoutResult>,
    pub y: LayoutResult,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOptions {
    pub padding: f64,
    pub degenerate_margin: f64,
    pub max_ticks: usize,
    /// Extend the padded bounds to reach zero.
    pub include_zero: bool,
    pub marks: Vec<f64>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            padding: 0.05,
            degenerate_margin: 1.0,
            max_ticks: 6,
            include_zero: false,
            marks: Vec::new(),
        }
    }
}

const NICE_STEPS: [f64; 4] = [1.0, 2.0, 2.5, 5.0];

/// Compute one frame jointly over every sequence sharing the axis.
///
/// Returns `None` when there is no finite value at all.
pub fn range_frame(sequences: &[&[f64]], opts: &FrameOptions) -> Option<LayoutResult> {
    let values: Vec<f64> = sequences
        .iter()
        .flat_map(|s| s.iter().copied())
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (mut padded_min, mut padded_max) = if data_max > data_min {
        // Halves keep the pad finite when the span itself overflows.
        let pad = (2.0 * opts.padding) * (data_max / 2.0 - data_min / 2.0);
        (
            (data_min - pad).max(f64::MIN),
            (data_max + pad).min(f64::MAX),
        )
    } else {
        degenerate_bounds(data_min, opts)
    };

    // Zero is the baseline: no padding beyond it. All-zero data keeps its margin.
    if opts.include_zero && !(data_min == 0.0 && data_max == 0.0) {
        if data_min >= 0.0 {
            padded_min = 0.0;
        }
        if data_max <= 0.0 {
            padded_max = 0.0;
        }
    }

    let ticks = select_ticks(data_min, data_max, opts.max_ticks, &opts.marks);
    log::debug!(
        "range frame data=[{data_min}, {data_max}] padded=[{padded_min}, {padded_max}] ticks={ticks:?}"
    );
    Some(LayoutResult {
        data_min,
        data_max,
        padded_min,
        padded_max,
        ticks,
    })
}

/// Widen a single value into a frame. The margin scales with magnitude so it
/// survives rounding; at worst the bounds step one ulp outward.
fn degenerate_bounds(value: f64, opts: &FrameOptions) -> (f64, f64) {
    let margin = opts
        .degenerate_margin
        .abs()
        .max(value.abs() * opts.padding.abs())
        .max(f64::EPSILON);
    let mut lo = (value - margin).max(f64::MIN);
    let mut hi = (value + margin).min(f64::MAX);
    if lo >= value && value > f64::MIN {
        lo = value.next_down();
    }
    if hi <= value && value < f64::MAX {
        hi = value.next_up();
    }
    (lo, hi)
}

/// Pick a sparse tick set: both endpoints, round interior values, and marks.
pub fn select_ticks(data_min: f64, data_max: f64, max_ticks: usize, marks: &[f64]) -> Vec<f64> {
    if data_max <= data_min {
        return vec![data_min];
    }
    // Infinite when the endpoints are further apart than f64::MAX.
    let span = data_max - data_min;

    let mut ticks = vec![data_min, data_max];
    ticks.extend(
        marks
            .iter()
            .copied()
            .filter(|m| m.is_finite() && *m >= data_min && *m <= data_max),
    );

    let room = max_ticks.saturating_sub(ticks.len());
    if room > 0 && span.is_finite() {
        ticks.extend(interior_ticks(data_min, data_max, room));
    }

    ticks.sort_by(f64::total_cmp);
    let eps = if span.is_finite() { span * 1e-9 } else { 0.0 };
    ticks.dedup_by(|a, b| (*a - *b).abs() <= eps);
    ticks
}

/// Round values strictly inside the range, at most `room` of them, none
/// crowding an endpoint by less than half a step.
fn interior_ticks(data_min: f64, data_max: f64, room: usize) -> Vec<f64> {
    let span = data_max - data_min;
    let mut step = nice_step(span / (room as f64 + 1.0));
    for _ in 0..16 {
        if let Some(candidates) = multiples_inside(data_min, data_max, step, room)
            && candidates.len() <= room
        {
            return candidates;
        }
        step = next_nice_step(step);
    }
    Vec::new()
}

/// `None` when the step yields far more multiples than `room`, before any of
/// them are collected.
fn multiples_inside(data_min: f64, data_max: f64, step: f64, room: usize) -> Option<Vec<f64>> {
    if !(step.is_finite() && step > 0.0) {
        return None;
    }
    let first = (data_min / step).ceil();
    let last = (data_max / step).floor();
    // Two extra: the endpoint filter can drop one multiple at each end.
    if !(last - first <= room as f64 + 2.0) || first.abs().max(last.abs()) > MAX_EXACT_INT {
        return None;
    }
    let decimals = decimals_for(step);
    Some(
        (first as i64..=last as i64)
            .map(|k| round_to(k as f64 * step, decimals))
            .filter(|v| v - data_min >= step / 2.0 && data_max - v >= step / 2.0)
            .collect(),
    )
}

/// 2^53: beyond it, consecutive multiples are no longer distinct integers.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Smallest 1/2/2.5/5 x 10^k step not below `raw`.
pub fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    for m in NICE_STEPS {
        let step = m * magnitude;
        if step >= raw * (1.0 - 1e-12) {
            return step;
        }
    }
    10.0 * magnitude
}

fn next_nice_step(step: f64) -> f64 {
    nice_step(step * 1.000_001)
}

fn decimals_for(step: f64) -> i32 {
    (-(step.log10().floor()) as i32 + 1).max(0)
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (v * f).round() / f
}
