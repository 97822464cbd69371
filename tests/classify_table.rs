use honest_charts::classify::{BANNED, banned_entry};
use honest_charts::{ChartType, Substitute, classify};

#[test]
fn pie_and_donut_suggest_bars_or_dots() {
    for t in ["pie", "Donut", "doughnut"] {
        let d = classify(&ChartType::from(t), 1);
        assert!(d.is_banned, "{t}");
        assert_eq!(d.substitute_type, Some(Substitute::HorizontalBarOrDotPlot));
        assert!(!d.rationale.is_empty());
    }
}

#[test]
fn every_banned_row_classifies_as_banned() {
    for row in BANNED {
        let chart = ChartType::from(row.chart);
        assert!(!matches!(chart, ChartType::Other(_)), "{} is not a known type", row.chart);
        let d = classify(&chart, row.series_above + 1);
        assert!(d.is_banned);
        assert_eq!(d.substitute_type, Some(row.substitute));
    }
}

#[test]
fn stacked_area_is_banned_only_past_three_series() {
    assert!(!classify(&ChartType::StackedArea, 3).is_banned);
    let d = classify(&ChartType::StackedArea, 4);
    assert!(d.is_banned);
    assert_eq!(d.substitute_type, Some(Substitute::SmallMultiplesOfLine));
}

#[test]
fn allowed_and_unknown_types_pass() {
    for t in ["line", "scatter", "slope", "small-multiples", "sparkline", "sankey"] {
        let d = classify(&ChartType::from(t), 2);
        assert!(!d.is_banned, "{t}");
        assert!(d.substitute_type.is_none());
        assert!(d.rationale.is_empty());
    }
    assert!(banned_entry(&ChartType::from("treemap"), 10).is_none());
}

#[test]
fn substitutes_serialize_as_tokens() {
    let d = classify(&ChartType::Bar3d, 1);
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json["substitute_type"], "2d-bar");
    assert_eq!(json["chart_type"], "3d-bar");
    assert_eq!(Substitute::Bar2d.primary(), ChartType::Bar);
}
