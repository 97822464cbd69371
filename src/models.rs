use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::classify::Substitute;
use crate::palette::{Color, PaletteMode};

/// Chart types known to the classifier.
///
/// Anything else parses into `Other(token)` and is treated as allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChartType {
    Line,
    Scatter,
    Bar,
    HorizontalBar,
    DotPlot,
    Slope,
    SmallMultiples,
    Sparkline,
    Histogram,
    BoxPlot,
    Heatmap,
    Contour,
    Area,
    StackedArea,
    Pie,
    Donut,
    Bar3d,
    Surface3d,
    DualAxis,
    Radar,
    Bubble,
    Gauge,
    WordCloud,
    /// Unlisted type, kept verbatim (already canonicalized).
    Other(String),
}

impl ChartType {
    /// Canonical kebab-case token, e.g. `"3d-bar"`.
    pub fn token(&self) -> &str {
        match self {
            ChartType::Line => "line",
            ChartType::Scatter => "scatter",
            ChartType::Bar => "bar",
            ChartType::HorizontalBar => "horizontal-bar",
            ChartType::DotPlot => "dot-plot",
            ChartType::Slope => "slope",
            ChartType::SmallMultiples => "small-multiples",
            ChartType::Sparkline => "sparkline",
            ChartType::Histogram => "histogram",
            ChartType::BoxPlot => "box-plot",
            ChartType::Heatmap => "heatmap",
            ChartType::Contour => "contour",
            ChartType::Area => "area",
            ChartType::StackedArea => "stacked-area",
            ChartType::Pie => "pie",
            ChartType::Donut => "donut",
            ChartType::Bar3d => "3d-bar",
            ChartType::Surface3d => "3d-surface",
            ChartType::DualAxis => "dual-axis",
            ChartType::Radar => "radar",
            ChartType::Bubble => "bubble",
            ChartType::Gauge => "gauge",
            ChartType::WordCloud => "word-cloud",
            ChartType::Other(s) => s.as_str(),
        }
    }

    /// Bars encode magnitude by length, so their value axis needs a zero baseline.
    pub fn requires_zero_baseline(&self) -> bool {
        matches!(
            self,
            ChartType::Bar | ChartType::HorizontalBar | ChartType::Bar3d | ChartType::Histogram
        )
    }

    /// Types whose series must share one arity and one scale.
    pub fn requires_shared_scale(&self) -> bool {
        matches!(self, ChartType::SmallMultiples | ChartType::Slope)
    }

    /// Types labelled directly at line ends instead of through a legend.
    pub fn uses_direct_labels(&self) -> bool {
        matches!(
            self,
            ChartType::Line | ChartType::Slope | ChartType::Area | ChartType::StackedArea
        )
    }
}

fn canonical_token(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c })
        .collect()
}

impl FromStr for ChartType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = canonical_token(s);
        Ok(match token.as_str() {
            "line" => ChartType::Line,
            "scatter" => ChartType::Scatter,
            "bar" | "column" => ChartType::Bar,
            "horizontal-bar" | "barh" => ChartType::HorizontalBar,
            "dot-plot" | "dot" => ChartType::DotPlot,
            "slope" | "slopegraph" => ChartType::Slope,
            "small-multiples" | "facet" => ChartType::SmallMultiples,
            "sparkline" => ChartType::Sparkline,
            "histogram" => ChartType::Histogram,
            "box-plot" | "boxplot" => ChartType::BoxPlot,
            "heatmap" => ChartType::Heatmap,
            "contour" => ChartType::Contour,
            "area" => ChartType::Area,
            "stacked-area" => ChartType::StackedArea,
            "pie" => ChartType::Pie,
            "donut" | "doughnut" => ChartType::Donut,
            "3d-bar" | "bar-3d" => ChartType::Bar3d,
            "3d-surface" | "surface-3d" => ChartType::Surface3d,
            "dual-axis" => ChartType::DualAxis,
            "radar" | "spider" => ChartType::Radar,
            "bubble" => ChartType::Bubble,
            "gauge" => ChartType::Gauge,
            "word-cloud" | "wordcloud" => ChartType::WordCloud,
            _ => ChartType::Other(token),
        })
    }
}

impl From<String> for ChartType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for ChartType {
    fn from(s: &str) -> Self {
        ChartType::from(s.to_string())
    }
}

impl From<ChartType> for String {
    fn from(t: ChartType) -> Self {
        t.token().to_string()
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One observation: a numeric (x, y) pair or a category with a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Point { x: f64, y: f64 },
    Category { category: String, value: f64 },
}

impl Datum {
    /// The value plotted on the value (y) axis.
    pub fn value(&self) -> f64 {
        match self {
            Datum::Point { y, .. } => *y,
            Datum::Category { value, .. } => *value,
        }
    }

    pub fn x(&self) -> Option<f64> {
        match self {
            Datum::Point { x, .. } => Some(*x),
            Datum::Category { .. } => None,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Datum::Point { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    /// Display label; falls back to `id` when absent.
    #[serde(default)]
    pub label: Option<String>,
    pub values: Vec<Datum>,
    #[serde(default)]
    pub color: Option<String>,
}

impl Series {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    pub fn ys(&self) -> Vec<f64> {
        self.values.iter().map(Datum::value).collect()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.values.iter().filter_map(Datum::x).collect()
    }

    /// Series of (x, y) points.
    pub fn points(id: &str, pts: &[(f64, f64)]) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            values: pts.iter().map(|&(x, y)| Datum::Point { x, y }).collect(),
            color: None,
        }
    }

    /// Series of y values at x = 0, 1, 2, ...
    pub fn values(id: &str, ys: &[f64]) -> Self {
        let pts: Vec<(f64, f64)> = ys.iter().enumerate().map(|(i, &y)| (i as f64, y)).collect();
        Self::points(id, &pts)
    }

    /// Series of category/value pairs.
    pub fn categories(id: &str, cats: &[(&str, f64)]) -> Self {
        Self {
            id: id.to_string(),
            label: None,
            values: cats
                .iter()
                .map(|&(c, v)| Datum::Category {
                    category: c.to_string(),
                    value: v,
                })
                .collect(),
            color: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    /// `None` defers to the chart type (bars require zero).
    #[serde(default)]
    pub start_at_zero: Option<bool>,
    /// Semantically meaningful values (targets, thresholds) to keep as ticks.
    #[serde(default)]
    pub marks: Vec<f64>,
}

/// A small-multiples panel and the series drawn in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub series: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TickDirection {
    #[default]
    Out,
    In,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameStyle {
    /// Axis lines span only the data extent.
    #[default]
    Range,
    /// Conventional full box/axes.
    Full,
}

/// Presentation flags the checklist audits. Defaults are the minimal-ink choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleHints {
    pub top_right_spines: bool,
    pub frame: FrameStyle,
    pub tick_direction: TickDirection,
    pub serif: bool,
    pub legend: bool,
    pub gridlines: bool,
    pub color_map: Option<String>,
}

impl Default for StyleHints {
    fn default() -> Self {
        Self {
            top_right_spines: false,
            frame: FrameStyle::Range,
            tick_direction: TickDirection::Out,
            serif: true,
            legend: false,
            gridlines: false,
            color_map: None,
        }
    }
}

/// Effect magnitude as drawn vs. as measured in the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSize {
    pub depicted: f64,
    pub data: f64,
}

/// Abstract chart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default)]
    pub request_id: Option<String>,
    pub chart_type: ChartType,
    pub series: Vec<Series>,
    #[serde(default)]
    pub x_axis: AxisSpec,
    #[serde(default)]
    pub y_axis: AxisSpec,
    #[serde(default)]
    pub panels: Vec<Panel>,
    /// Compute one frame per panel instead of a shared one.
    #[serde(default)]
    pub independent_scales: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub palette: PaletteMode,
    #[serde(default)]
    pub style: StyleHints,
    #[serde(default)]
    pub effect: Option<EffectSize>,
    /// Minimum gap between direct labels, in value-axis units.
    #[serde(default)]
    pub label_gap: Option<f64>,
}

impl ChartSpec {
    pub fn new(chart_type: impl Into<ChartType>, series: Vec<Series>) -> Self {
        Self {
            request_id: None,
            chart_type: chart_type.into(),
            series,
            x_axis: AxisSpec::default(),
            y_axis: AxisSpec::default(),
            panels: Vec::new(),
            independent_scales: false,
            confirmed: false,
            palette: PaletteMode::default(),
            style: StyleHints::default(),
            effect: None,
            label_gap: None,
        }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn confirmed(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    /// Copy of this spec retargeted at another chart type, confirmation cleared.
    pub fn with_chart_type(&self, chart_type: ChartType) -> Self {
        let mut out = self.clone();
        out.chart_type = chart_type;
        out.confirmed = false;
        out
    }

    /// Copy of this spec rewritten to the substitute's chart type.
    pub fn with_substitute(&self, substitute: Substitute) -> Self {
        self.with_chart_type(substitute.primary())
    }

    /// Whether the value axis must include zero, honoring an explicit axis flag.
    pub fn value_axis_includes_zero(&self) -> bool {
        self.y_axis
            .start_at_zero
            .unwrap_or_else(|| self.chart_type.requires_zero_baseline())
    }

    pub fn has_point_data(&self) -> bool {
        self.series
            .iter()
            .flat_map(|s| s.values.first())
            .all(Datum::is_point)
    }

    pub fn series_by_id(&self, id: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.id == id)
    }

    /// Explicit palette colors, already validated.
    pub fn explicit_colors(&self) -> Vec<(String, Color)> {
        self.series
            .iter()
            .filter_map(|s| {
                let c = s.color.as_deref()?;
                Color::from_hex(c).map(|col| (s.id.clone(), col))
            })
            .collect()
    }
}
