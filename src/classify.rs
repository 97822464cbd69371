//! Chart-type classification and substitution advice.
//!
//! Banned types live in one table; adding a substitution is a new row, not a
//! new branch. Lookups walk the table in order and the first matching row wins.
//! Types missing from the table are allowed.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ChartType;

/// Recommended replacement for a banned chart type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Substitute {
    HorizontalBarOrDotPlot,
    #[serde(rename = "2d-bar")]
    Bar2d,
    HeatmapOrContour,
    SmallMultiples,
    SmallMultiplesOfBarOrDot,
    SmallMultiplesOfLine,
    ScatterWithDirectLabels,
    NumberWithSparkline,
    BarOfFrequencies,
}

impl Substitute {
    pub fn token(&self) -> &'static str {
        match self {
            Substitute::HorizontalBarOrDotPlot => "horizontal-bar-or-dot-plot",
            Substitute::Bar2d => "2d-bar",
            Substitute::HeatmapOrContour => "heatmap-or-contour",
            Substitute::SmallMultiples => "small-multiples",
            Substitute::SmallMultiplesOfBarOrDot => "small-multiples-of-bar-or-dot",
            Substitute::SmallMultiplesOfLine => "small-multiples-of-line",
            Substitute::ScatterWithDirectLabels => "scatter-with-direct-labels",
            Substitute::NumberWithSparkline => "number-with-sparkline",
            Substitute::BarOfFrequencies => "bar-of-frequencies",
        }
    }

    /// The concrete chart type to use when rewriting a spec to this substitute.
    pub fn primary(&self) -> ChartType {
        match self {
            Substitute::HorizontalBarOrDotPlot => ChartType::HorizontalBar,
            Substitute::Bar2d => ChartType::Bar,
            Substitute::HeatmapOrContour => ChartType::Heatmap,
            Substitute::SmallMultiples
            | Substitute::SmallMultiplesOfBarOrDot
            | Substitute::SmallMultiplesOfLine => ChartType::SmallMultiples,
            Substitute::ScatterWithDirectLabels => ChartType::Scatter,
            Substitute::NumberWithSparkline => ChartType::Sparkline,
            Substitute::BarOfFrequencies => ChartType::Bar,
        }
    }
}

impl fmt::Display for Substitute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One row of the banned table.
#[derive(Debug, Clone, Copy)]
pub struct BannedEntry {
    /// Canonical chart type token.
    pub chart: &'static str,
    /// Row applies only when the chart has more than this many series.
    pub series_above: usize,
    pub substitute: Substitute,
    pub rationale: &'static str,
}

pub static BANNED: &[BannedEntry] = &[
    BannedEntry {
        chart: "pie",
        series_above: 0,
        substitute: Substitute::HorizontalBarOrDotPlot,
        rationale: "Angles and areas are judged far less accurately than positions along a common scale.",
    },
    BannedEntry {
        chart: "donut",
        series_above: 0,
        substitute: Substitute::HorizontalBarOrDotPlot,
        rationale: "A pie with its center removed hides even the angle cue; compare lengths instead.",
    },
    BannedEntry {
        chart: "3d-bar",
        series_above: 0,
        substitute: Substitute::Bar2d,
        rationale: "Perspective distorts bar heights and the third dimension encodes no data.",
    },
    BannedEntry {
        chart: "3d-surface",
        series_above: 0,
        substitute: Substitute::HeatmapOrContour,
        rationale: "Occlusion and perspective hide values; a heatmap or contour shows every cell.",
    },
    BannedEntry {
        chart: "dual-axis",
        series_above: 0,
        substitute: Substitute::SmallMultiples,
        rationale: "Two arbitrary scales let any crossing or correlation be manufactured by rescaling.",
    },
    BannedEntry {
        chart: "radar",
        series_above: 0,
        substitute: Substitute::SmallMultiplesOfBarOrDot,
        rationale: "Polygon area depends on axis order and radial values are hard to compare.",
    },
    BannedEntry {
        chart: "stacked-area",
        series_above: 3,
        substitute: Substitute::SmallMultiplesOfLine,
        rationale: "Beyond three layers every band but the bottom one floats on a moving baseline.",
    },
    BannedEntry {
        chart: "bubble",
        series_above: 0,
        substitute: Substitute::ScatterWithDirectLabels,
        rationale: "Bubble areas are misread and overlapping circles hide points.",
    },
    BannedEntry {
        chart: "gauge",
        series_above: 0,
        substitute: Substitute::NumberWithSparkline,
        rationale: "A dial spends most of its ink on decoration to show a single number.",
    },
    BannedEntry {
        chart: "word-cloud",
        series_above: 0,
        substitute: Substitute::BarOfFrequencies,
        rationale: "Word length and placement swamp frequency; font size is not a readable scale.",
    },
];

/// Outcome of one classification call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionDecision {
    pub chart_type: ChartType,
    pub is_banned: bool,
    pub substitute_type: Option<Substitute>,
    pub rationale: String,
}

/// Look up the first banned-table row matching this chart type and series count.
pub fn banned_entry(chart: &ChartType, series_count: usize) -> Option<&'static BannedEntry> {
    BANNED
        .iter()
        .find(|e| e.chart == chart.token() && series_count > e.series_above)
}

/// Classify a chart type. Unlisted types are allowed.
pub fn classify(chart: &ChartType, series_count: usize) -> SubstitutionDecision {
    let decision = match banned_entry(chart, series_count) {
        Some(entry) => SubstitutionDecision {
            chart_type: chart.clone(),
            is_banned: true,
            substitute_type: Some(entry.substitute),
            rationale: entry.rationale.to_string(),
        },
        None => SubstitutionDecision {
            chart_type: chart.clone(),
            is_banned: false,
            substitute_type: None,
            rationale: String::new(),
        },
    };
    log::debug!(
        "classified {} ({} series): banned={}",
        chart,
        series_count,
        decision.is_banned
    );
    decision
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_row_has_substitute_and_rationale() {
        for entry in BANNED {
            let d = classify(&ChartType::from(entry.chart), entry.series_above + 1);
            assert!(d.is_banned, "{} should be banned", entry.chart);
            assert_eq!(d.substitute_type, Some(entry.substitute));
            assert!(!d.rationale.is_empty());
            assert!(!entry.substitute.token().is_empty());
        }
    }

    #[test]
    fn table_tokens_are_canonical() {
        for entry in BANNED {
            assert_eq!(ChartType::from(entry.chart).token(), entry.chart);
        }
    }

    #[test]
    fn stacked_area_is_fine_up_to_three_series() {
        assert!(!classify(&ChartType::StackedArea, 3).is_banned);
        let d = classify(&ChartType::StackedArea, 4);
        assert!(d.is_banned);
        assert_eq!(d.substitute_type, Some(Substitute::SmallMultiplesOfLine));
    }

    #[test]
    fn unknown_types_fail_open() {
        let d = classify(&ChartType::from("sankey"), 2);
        assert!(!d.is_banned);
        assert!(d.substitute_type.is_none());
        assert!(d.rationale.is_empty());
    }

    #[test]
    fn substitute_serializes_as_token() {
        for entry in BANNED {
            let json = serde_json::to_string(&entry.substitute).unwrap();
            assert_eq!(json, format!("\"{}\"", entry.substitute.token()));
        }
    }
}
