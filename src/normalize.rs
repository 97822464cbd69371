//! Orchestrates one normalization call.
//!
//! classify → (override gate) → range frames → direct labels → palette →
//! integrity → checklist. Nothing here renders; the result is handed to a
//! [`Renderer`](crate::render::Renderer).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::checklist::{self, ChecklistReport, RuleContext};
use crate::classify::{SubstitutionDecision, classify};
use crate::config::NormalizerConfig;
use crate::error::SchemaError;
use crate::frame::{FrameOptions, LayoutResult, PanelLayout, range_frame};
use crate::integrity::{self, DistortionReport, LieFactor};
use crate::labels::{LabelPlacement, LabelRequest, LabelSide, LayoutWarning, resolve_labels};
use crate::models::{ChartSpec, ChartType, Datum, Panel};
use crate::palette::{Color, PaletteAssignment, PaletteMode, assign_palette};
use crate::session::{Admission, Clock, NeedsConfirmation, OverrideSessions, SystemClock};

/// A chart spec bundled with every derived layout and audit parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedChartSpec {
    pub spec: ChartSpec,
    pub decision: SubstitutionDecision,
    /// Banned type rendered after explicit confirmation.
    pub overridden: bool,
    pub x: Option<LayoutResult>,
    pub y: LayoutResult,
    pub panels: Vec<PanelLayout>,
    pub labels: Vec<LabelPlacement>,
    pub label_warnings: Vec<LayoutWarning>,
    pub palette: PaletteAssignment,
    pub distortion: DistortionReport,
    pub checklist: ChecklistReport,
}

impl NormalizedChartSpec {
    pub fn label(&self, series_id: &str, side: LabelSide) -> Option<&LabelPlacement> {
        self.labels
            .iter()
            .find(|l| l.entity_id == series_id && l.side == side)
    }

    /// Value-axis values as drawn: cumulative for stacked areas.
    pub fn drawn_values(&self) -> Vec<(String, Vec<f64>)> {
        drawn_values(&self.spec)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Normalization {
    Normalized(Box<NormalizedChartSpec>),
    NeedsConfirmation(NeedsConfirmation),
}

impl Normalization {
    pub fn normalized(&self) -> Option<&NormalizedChartSpec> {
        match self {
            Normalization::Normalized(n) => Some(n),
            Normalization::NeedsConfirmation(_) => None,
        }
    }

    pub fn needs_confirmation(&self) -> Option<&NeedsConfirmation> {
        match self {
            Normalization::NeedsConfirmation(n) => Some(n),
            Normalization::Normalized(_) => None,
        }
    }
}

/// Reject malformed specs before any computation.
pub fn validate(spec: &ChartSpec) -> Result<(), SchemaError> {
    let first = spec.series.first().ok_or(SchemaError::NoSeries)?;
    let point_data = first.values.first().is_none_or(Datum::is_point);

    let mut seen = HashSet::new();
    for s in &spec.series {
        if !seen.insert(s.id.as_str()) {
            return Err(SchemaError::DuplicateSeries {
                series: s.id.clone(),
            });
        }
        if s.values.is_empty() {
            return Err(SchemaError::EmptySeries {
                series: s.id.clone(),
            });
        }
        for (index, d) in s.values.iter().enumerate() {
            if d.is_point() != point_data {
                return Err(SchemaError::MixedData {
                    series: s.id.clone(),
                });
            }
            let finite = d.value().is_finite() && d.x().is_none_or(f64::is_finite);
            if !finite {
                return Err(SchemaError::NonFinite {
                    series: s.id.clone(),
                    index,
                });
            }
        }
        if let Some(c) = &s.color
            && Color::from_hex(c).is_none()
        {
            return Err(SchemaError::InvalidColor {
                series: s.id.clone(),
                value: c.clone(),
            });
        }
    }

    if spec.chart_type.requires_shared_scale() {
        let expected = first.values.len();
        if let Some(s) = spec.series.iter().find(|s| s.values.len() != expected) {
            return Err(SchemaError::ArityMismatch {
                series: s.id.clone(),
                chart: spec.chart_type.to_string(),
                expected,
                found: s.values.len(),
            });
        }
    }
    if spec.chart_type == ChartType::Slope
        && let Some(s) = spec.series.iter().find(|s| s.values.len() < 2)
    {
        return Err(SchemaError::TooFewValues {
            series: s.id.clone(),
            chart: spec.chart_type.to_string(),
            min: 2,
        });
    }

    for (i, panel) in spec.panels.iter().enumerate() {
        if let Some(missing) = panel.series.iter().find(|id| !seen.contains(id.as_str())) {
            return Err(SchemaError::UnknownSeries {
                field: format!("panels[{i}].series"),
                series: missing.clone(),
            });
        }
    }
    if let PaletteMode::SingleAccent {
        highlight: Some(h),
    } = &spec.palette
        && !seen.contains(h.as_str())
    {
        return Err(SchemaError::UnknownSeries {
            field: "palette.highlight".to_string(),
            series: h.clone(),
        });
    }
    if let Some(gap) = spec.label_gap
        && !(gap.is_finite() && gap > 0.0)
    {
        return Err(SchemaError::InvalidGap { value: gap });
    }
    if spec.confirmed && spec.request_id.is_none() {
        return Err(SchemaError::MissingRequestId);
    }
    Ok(())
}

/// Per-series value-axis values; stacked areas accumulate by position.
fn drawn_values(spec: &ChartSpec) -> Vec<(String, Vec<f64>)> {
    let mut out: Vec<(String, Vec<f64>)> = Vec::with_capacity(spec.series.len());
    let mut running: Vec<f64> = Vec::new();
    for s in &spec.series {
        let ys = s.ys();
        let vals = if spec.chart_type == ChartType::StackedArea {
            if running.len() < ys.len() {
                running.resize(ys.len(), 0.0);
            }
            for (acc, y) in running.iter_mut().zip(&ys) {
                *acc += y;
            }
            running[..ys.len()].to_vec()
        } else {
            ys
        };
        out.push((s.id.clone(), vals));
    }
    out
}

pub struct Normalizer<C: Clock = SystemClock> {
    config: NormalizerConfig,
    sessions: OverrideSessions<C>,
}

impl Normalizer<SystemClock> {
    pub fn new(config: NormalizerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for Normalizer<SystemClock> {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}

impl<C: Clock> Normalizer<C> {
    pub fn with_clock(config: NormalizerConfig, clock: C) -> Self {
        let sessions =
            OverrideSessions::with_clock(config.session_ttl(), clock).sweep_every(config.sweep_every);
        Self { config, sessions }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &OverrideSessions<C> {
        &self.sessions
    }

    /// Normalize a chart spec, or ask for confirmation of a banned type.
    pub fn normalize(&self, spec: &ChartSpec) -> Result<Normalization, SchemaError> {
        validate(spec)?;

        let decision = classify(&spec.chart_type, spec.series.len());
        let mut overridden = false;
        if decision.is_banned {
            match self
                .sessions
                .admit(&decision, spec.request_id.as_deref(), spec.confirmed)
            {
                Admission::NeedsConfirmation(n) => {
                    log::info!(
                        "{} needs confirmation (substitute: {:?})",
                        spec.chart_type,
                        n.substitute_type
                    );
                    return Ok(Normalization::NeedsConfirmation(n));
                }
                Admission::Proceed(_) => overridden = true,
            }
        }

        let drawn = drawn_values(spec);
        let y_opts = self.frame_options(spec.value_axis_includes_zero(), &spec.y_axis.marks);
        let x_opts =
            self.frame_options(spec.x_axis.start_at_zero.unwrap_or(false), &spec.x_axis.marks);

        let y_refs: Vec<&[f64]> = drawn.iter().map(|(_, v)| v.as_slice()).collect();
        let y = range_frame(&y_refs, &y_opts).ok_or(SchemaError::NoSeries)?;
        let xs: Vec<Vec<f64>> = spec.series.iter().map(|s| s.xs()).collect();
        let x = if spec.has_point_data() {
            let x_refs: Vec<&[f64]> = xs.iter().map(Vec::as_slice).collect();
            range_frame(&x_refs, &x_opts)
        } else {
            None
        };

        let panels = self.panel_layouts(spec, &drawn, &x, &y, &x_opts, &y_opts);
        let (labels, label_warnings) = self.direct_labels(spec, &drawn, &y);

        let ids: Vec<String> = spec.series.iter().map(|s| s.id.clone()).collect();
        let palette = assign_palette(&ids, &spec.palette).with_overrides(&spec.explicit_colors());

        let distortion = self.distortion(spec, &y, &panels);
        if distortion.has_violation() {
            log::warn!("{}: integrity warning {:?}", spec.chart_type, distortion);
        }

        let checklist = checklist::evaluate(&RuleContext {
            spec,
            decision: &decision,
            overridden,
            x: x.as_ref(),
            y: &y,
            panels: &panels,
            label_warnings: &label_warnings,
            palette: &palette,
            distortion: &distortion,
            config: &self.config,
        });

        if overridden && let Some(id) = spec.request_id.as_deref() {
            self.sessions.complete(id);
        }

        Ok(Normalization::Normalized(Box::new(NormalizedChartSpec {
            spec: spec.clone(),
            decision,
            overridden,
            x,
            y,
            panels,
            labels,
            label_warnings,
            palette,
            distortion,
            checklist,
        })))
    }

    fn frame_options(&self, include_zero: bool, marks: &[f64]) -> FrameOptions {
        FrameOptions {
            padding: self.config.frame_padding,
            degenerate_margin: self.config.degenerate_margin,
            max_ticks: self.config.max_ticks,
            include_zero,
            marks: marks.to_vec(),
        }
    }

    /// One shared frame for every panel unless `independent_scales` is set.
    fn panel_layouts(
        &self,
        spec: &ChartSpec,
        drawn: &[(String, Vec<f64>)],
        x: &Option<LayoutResult>,
        y: &LayoutResult,
        x_opts: &FrameOptions,
        y_opts: &FrameOptions,
    ) -> Vec<PanelLayout> {
        if spec.chart_type != ChartType::SmallMultiples {
            return Vec::new();
        }
        let groups: Vec<Panel> = if spec.panels.is_empty() {
            spec.series
                .iter()
                .map(|s| Panel {
                    id: s.id.clone(),
                    title: Some(s.display_label().to_string()),
                    series: vec![s.id.clone()],
                })
                .collect()
        } else {
            spec.panels.clone()
        };

        groups
            .into_iter()
            .map(|panel| {
                let (px, py) = if spec.independent_scales {
                    let ys: Vec<&[f64]> = drawn
                        .iter()
                        .filter(|(id, _)| panel.series.contains(id))
                        .map(|(_, v)| v.as_slice())
                        .collect();
                    let xs: Vec<Vec<f64>> = spec
                        .series
                        .iter()
                        .filter(|s| panel.series.contains(&s.id))
                        .map(|s| s.xs())
                        .collect();
                    let x_refs: Vec<&[f64]> = xs.iter().map(Vec::as_slice).collect();
                    let px = x.as_ref().and_then(|_| range_frame(&x_refs, x_opts));
                    let py = range_frame(&ys, y_opts).unwrap_or_else(|| y.clone());
                    (px, py)
                } else {
                    (x.clone(), y.clone())
                };
                PanelLayout {
                    panel_id: panel.id,
                    title: panel.title,
                    series_ids: panel.series,
                    x: px,
                    y: py,
                }
            })
            .collect()
    }

    fn direct_labels(
        &self,
        spec: &ChartSpec,
        drawn: &[(String, Vec<f64>)],
        y: &LayoutResult,
    ) -> (Vec<LabelPlacement>, Vec<LayoutWarning>) {
        if !spec.chart_type.uses_direct_labels() {
            return (Vec::new(), Vec::new());
        }
        // From half-spans: the padded span of finite data can still overflow.
        let half_span = y.padded_max / 2.0 - y.padded_min / 2.0;
        let gap = spec
            .label_gap
            .unwrap_or(2.0 * self.config.label_gap_fraction * half_span);
        let extent = (y.padded_min, y.padded_max);

        let text_of = |id: &str| {
            spec.series_by_id(id)
                .map(|s| s.display_label().to_string())
                .unwrap_or_else(|| id.to_string())
        };
        let requests = |pick: fn(&[f64]) -> Option<f64>| -> Vec<LabelRequest> {
            drawn
                .iter()
                .filter_map(|(id, vals)| {
                    pick(vals).map(|raw| LabelRequest::new(id, &text_of(id), raw))
                })
                .collect()
        };

        let mut sides = vec![(LabelSide::Right, requests(|v| v.last().copied()))];
        if spec.chart_type == ChartType::Slope {
            sides.insert(0, (LabelSide::Left, requests(|v| v.first().copied())));
        }

        let mut labels = Vec::new();
        let mut warnings = Vec::new();
        for (side, reqs) in sides {
            let layout = resolve_labels(&reqs, side, gap, extent);
            labels.extend(layout.placements);
            warnings.extend(layout.warning);
        }
        (labels, warnings)
    }

    fn distortion(
        &self,
        spec: &ChartSpec,
        y: &LayoutResult,
        panels: &[PanelLayout],
    ) -> DistortionReport {
        let tol = self.config.lie_tolerance;
        let lie_factor = match spec.effect {
            Some(e) => integrity::lie_factor(e.depicted, e.data, tol),
            None if spec.chart_type.requires_zero_baseline() => match integrity::bar_effect(y) {
                Some(e) => integrity::lie_factor(e.depicted, e.data, tol),
                None => LieFactor::Indeterminate {
                    reason: "data too flat or not positive to size an effect".to_string(),
                },
            },
            None => LieFactor::Indeterminate {
                reason: "no effect size supplied".to_string(),
            },
        };

        let ys: Vec<&LayoutResult> = panels.iter().map(|p| &p.y).collect();
        let xs: Vec<&LayoutResult> = panels.iter().filter_map(|p| p.x.as_ref()).collect();
        DistortionReport {
            lie_factor,
            zero_baseline_respected: integrity::zero_baseline_respected(
                spec.chart_type.requires_zero_baseline(),
                y,
            ),
            scales_consistent_across_panels: integrity::scales_consistent(&ys)
                && integrity::scales_consistent(&xs),
        }
    }
}
