//! Versioned battery of presentation and integrity rules.
//!
//! Rules are independent predicates over the assembled result. The report
//! lists them in declaration order, so identical input gives an identical
//! report. Add a rule by appending a row to [`RULES`].

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classify::SubstitutionDecision;
use crate::config::NormalizerConfig;
use crate::frame::{LayoutResult, PanelLayout};
use crate::integrity::{DistortionReport, LieFactor};
use crate::labels::LayoutWarning;
use crate::models::{ChartSpec, ChartType, FrameStyle, TickDirection};
use crate::palette::PaletteAssignment;

pub const CHECKLIST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub rule_id: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistReport {
    pub version: String,
    pub entries: Vec<ChecklistEntry>,
}

impl ChecklistReport {
    pub fn get(&self, rule_id: &str) -> Option<&ChecklistEntry> {
        self.entries.iter().find(|e| e.rule_id == rule_id)
    }

    /// Failed rules that are warnings rather than informational flags.
    pub fn warnings(&self) -> impl Iterator<Item = &ChecklistEntry> {
        self.entries
            .iter()
            .filter(|e| !e.passed && e.severity == Severity::Warning)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings().next().is_none()
    }
}

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub spec: &'a ChartSpec,
    pub decision: &'a SubstitutionDecision,
    pub overridden: bool,
    pub x: Option<&'a LayoutResult>,
    pub y: &'a LayoutResult,
    pub panels: &'a [PanelLayout],
    pub label_warnings: &'a [LayoutWarning],
    pub palette: &'a PaletteAssignment,
    pub distortion: &'a DistortionReport,
    pub config: &'a NormalizerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
}

impl Verdict {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    fn flag(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    fn check(ok: bool, pass: impl Into<String>, fail: impl Into<String>) -> Self {
        if ok { Self::pass(pass) } else { Self::warn(fail) }
    }
}

pub struct Rule {
    pub id: &'static str,
    pub check: fn(&RuleContext<'_>) -> Verdict,
}

pub static RULES: &[Rule] = &[
    Rule { id: "bannedChartType", check: banned_chart_type },
    Rule { id: "spinesRemoved", check: spines_removed },
    Rule { id: "rangeFrame", check: range_frame_present },
    Rule { id: "tickDirection", check: tick_direction },
    Rule { id: "tickDensity", check: tick_density },
    Rule { id: "serifTypography", check: serif_typography },
    Rule { id: "legendRemoved", check: legend_removed },
    Rule { id: "gridlinesRemoved", check: gridlines_removed },
    Rule { id: "bannedColorMap", check: banned_color_map },
    Rule { id: "paletteDistinct", check: palette_distinct },
    Rule { id: "panelCount", check: panel_count },
    Rule { id: "lieFactor", check: lie_factor },
    Rule { id: "zeroBaseline", check: zero_baseline },
    Rule { id: "scalesConsistentAcrossPanels", check: scales_consistent },
    Rule { id: "labelsWithinFrame", check: labels_within_frame },
];

pub fn evaluate(ctx: &RuleContext<'_>) -> ChecklistReport {
    let entries = RULES
        .iter()
        .map(|rule| {
            let v = (rule.check)(ctx);
            ChecklistEntry {
                rule_id: rule.id.to_string(),
                passed: v.passed,
                severity: v.severity,
                message: v.message,
            }
        })
        .collect();
    ChecklistReport {
        version: CHECKLIST_VERSION.to_string(),
        entries,
    }
}

fn banned_chart_type(ctx: &RuleContext<'_>) -> Verdict {
    let d = ctx.decision;
    if !d.is_banned {
        return Verdict::pass(format!("{} is an allowed chart type", d.chart_type));
    }
    let substitute = d
        .substitute_type
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string());
    if ctx.overridden {
        Verdict::flag(format!(
            "{} rendered under explicit override (suggested substitute: {substitute})",
            d.chart_type
        ))
    } else {
        Verdict::warn(format!(
            "{} is banned; use {substitute}: {}",
            d.chart_type, d.rationale
        ))
    }
}

fn spines_removed(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        !ctx.spec.style.top_right_spines,
        "top and right spines removed",
        "top/right spines carry no data; remove them",
    )
}

fn range_frame_present(ctx: &RuleContext<'_>) -> Verdict {
    let frame_ok = |f: &LayoutResult| f.padded_min <= f.data_min && f.data_max <= f.padded_max;
    let ok = ctx.spec.style.frame == FrameStyle::Range
        && frame_ok(ctx.y)
        && ctx.x.is_none_or(frame_ok);
    Verdict::check(
        ok,
        "axes drawn as range frames",
        "axes should span only the data extent (range frame)",
    )
}

fn tick_direction(ctx: &RuleContext<'_>) -> Verdict {
    match ctx.spec.style.tick_direction {
        TickDirection::Out => Verdict::pass("ticks point outward"),
        TickDirection::None => Verdict::pass("tick marks omitted"),
        TickDirection::In => Verdict::warn("inward ticks collide with data; point them outward"),
    }
}

fn tick_density(ctx: &RuleContext<'_>) -> Verdict {
    let max = ctx.config.max_ticks.max(1);
    let mut counts = vec![ctx.y.ticks.len()];
    counts.extend(ctx.x.map(|x| x.ticks.len()));
    let worst = counts.into_iter().max().unwrap_or(0);
    Verdict::check(
        worst <= max,
        format!("{worst} ticks on the densest axis (limit {max})"),
        format!("{worst} ticks exceed the limit of {max}"),
    )
}

fn serif_typography(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        ctx.spec.style.serif,
        "serif typography",
        "use a serif face for labels and annotations",
    )
}

fn legend_removed(ctx: &RuleContext<'_>) -> Verdict {
    let single = ctx.spec.series.len() <= 1;
    Verdict::check(
        !ctx.spec.style.legend || single,
        "series labelled directly, no legend",
        "replace the legend with direct labels",
    )
}

fn gridlines_removed(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        !ctx.spec.style.gridlines,
        "no gridlines",
        "gridlines are non-data ink; remove them or mute them heavily",
    )
}

fn color_map_pattern(banned: &[String]) -> Option<Regex> {
    if banned.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = banned.iter().map(|b| regex::escape(b)).collect();
    Regex::new(&format!("(?i)^(?:{})(?:_r)?$", alternatives.join("|"))).ok()
}

fn banned_color_map(ctx: &RuleContext<'_>) -> Verdict {
    let Some(map) = ctx.spec.style.color_map.as_deref() else {
        return Verdict::pass("no color map requested");
    };
    let banned = color_map_pattern(&ctx.config.banned_color_maps)
        .is_some_and(|re| re.is_match(map.trim()));
    Verdict::check(
        !banned,
        format!("color map `{map}` allowed"),
        format!("color map `{map}` is perceptually non-uniform; use a sequential map"),
    )
}

fn palette_distinct(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        ctx.palette.is_distinct(),
        "series colors are distinct",
        "two series share a color although the palette has room",
    )
}

fn panel_count(ctx: &RuleContext<'_>) -> Verdict {
    if ctx.spec.chart_type != ChartType::SmallMultiples {
        return Verdict::pass("not a small-multiples chart");
    }
    let n = ctx.panels.len();
    let max = ctx.config.max_panels;
    Verdict::check(
        n <= max,
        format!("{n} panels (limit {max})"),
        format!("{n} panels exceed the limit of {max}"),
    )
}

fn lie_factor(ctx: &RuleContext<'_>) -> Verdict {
    match &ctx.distortion.lie_factor {
        LieFactor::Computed { value, compliant } => Verdict::check(
            *compliant,
            format!("lie factor {value:.3}"),
            format!("lie factor {value:.3} distorts the effect"),
        ),
        LieFactor::Indeterminate { reason } => {
            Verdict::pass(format!("lie factor indeterminate: {reason}"))
        }
    }
}

fn zero_baseline(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        ctx.distortion.zero_baseline_respected,
        "value axis baseline respected",
        format!(
            "{} bars must start at zero; axis starts at {}",
            ctx.spec.chart_type, ctx.y.padded_min
        ),
    )
}

fn scales_consistent(ctx: &RuleContext<'_>) -> Verdict {
    Verdict::check(
        ctx.distortion.scales_consistent_across_panels,
        "panels share one scale",
        "panels are scaled independently and cannot be compared",
    )
}

fn labels_within_frame(ctx: &RuleContext<'_>) -> Verdict {
    match ctx.label_warnings.first() {
        None => Verdict::pass("direct labels fit the frame"),
        Some(w) => Verdict::warn(w.message.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_ids_are_unique() {
        let mut ids: Vec<&str> = RULES.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len());
    }

    #[test]
    fn color_map_pattern_matches_reversed_and_case() {
        let re = color_map_pattern(&["jet".into(), "rainbow".into()]).unwrap();
        assert!(re.is_match("Jet"));
        assert!(re.is_match("jet_r"));
        assert!(re.is_match("RAINBOW"));
        assert!(!re.is_match("viridis"));
        assert!(!re.is_match("jetstream"));
        assert!(color_map_pattern(&[]).is_none());
    }
}
