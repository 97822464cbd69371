use honest_charts::render::{Renderer, SvgRenderer};
use honest_charts::{ChartSpec, ChartType, Normalizer, Series};

#[test]
fn slope_svg_has_both_label_columns() {
    let spec = ChartSpec::new(
        ChartType::Slope,
        vec![
            Series::points("north", &[(2010.0, 10.0), (2020.0, 14.0)]).with_label("North"),
            Series::points("south", &[(2010.0, 12.0), (2020.0, 9.0)]).with_label("South"),
        ],
    );
    let out = Normalizer::default().normalize(&spec).unwrap();
    let svg = SvgRenderer::new(400, 300)
        .render(out.normalized().unwrap())
        .unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("width=\"400\""));
    assert_eq!(svg.matches("North").count(), 2);
    assert_eq!(svg.matches("South").count(), 2);
}

#[test]
fn long_labels_are_truncated() {
    let spec = ChartSpec::new(
        ChartType::Line,
        vec![Series::values("s", &[1.0, 2.0]).with_label(&"very long label ".repeat(20))],
    );
    let out = Normalizer::default().normalize(&spec).unwrap();
    let svg = SvgRenderer::default().render(out.normalized().unwrap()).unwrap();
    assert!(svg.contains('…'));
}

#[test]
fn svg_draws_no_legend_or_gridlines() {
    let spec = ChartSpec::new(
        ChartType::Bar,
        vec![Series::categories("s", &[("a", 3.0), ("b", 5.0)])],
    );
    let out = Normalizer::default().normalize(&spec).unwrap();
    let svg = SvgRenderer::default().render(out.normalized().unwrap()).unwrap();
    assert!(svg.contains("serif"));
    // One fill rect for the background plus one per bar.
    assert_eq!(svg.matches("<rect").count(), 3);
}

#[test]
fn tick_labels_follow_the_locale() {
    let spec = ChartSpec::new(
        ChartType::Line,
        vec![Series::values("visits", &[1000.0, 12000.0, 30000.0])],
    );
    let out = Normalizer::default().normalize(&spec).unwrap();
    let chart = out.normalized().unwrap();

    let en = SvgRenderer::new(600, 400).render(chart).unwrap();
    assert!(en.contains("30,000"));

    let de = SvgRenderer::new(600, 400).with_locale("de").render(chart).unwrap();
    assert!(de.contains("30.000"));
    assert!(!de.contains("30,000"));
}
