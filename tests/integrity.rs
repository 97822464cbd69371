use honest_charts::integrity::{lie_factor, scales_consistent};
use honest_charts::{ChartSpec, ChartType, LieFactor, Normalizer, Series};
use honest_charts::models::EffectSize;

#[test]
fn lie_factor_thresholds() {
    let lf = lie_factor(3.0, 1.0, 0.05);
    assert_eq!(lf.value(), Some(3.0));
    assert!(lf.is_violation());

    let lf = lie_factor(1.02, 1.0, 0.05);
    assert!(!lf.is_violation());

    assert!(matches!(lie_factor(0.0, 1.0, 0.05), LieFactor::Indeterminate { .. }));
    assert!(matches!(lie_factor(1.0, 0.0, 0.05), LieFactor::Indeterminate { .. }));
}

#[test]
fn declared_effect_sizes_flow_into_checklist() {
    let mut spec = ChartSpec::new(ChartType::Line, vec![Series::values("a", &[1.0, 2.0])]);
    spec.effect = Some(EffectSize {
        depicted: 3.0,
        data: 1.0,
    });
    let out = Normalizer::default().normalize(&spec).unwrap();
    let n = out.normalized().unwrap();
    assert!(n.distortion.lie_factor.is_violation());
    let entry = n.checklist.get("lieFactor").unwrap();
    assert!(!entry.passed);
}

#[test]
fn truncated_bar_axis_is_flagged() {
    let mut spec = ChartSpec::new(
        ChartType::Bar,
        vec![Series::categories("sales", &[("q1", 100.0), ("q2", 105.0)])],
    );
    spec.y_axis.start_at_zero = Some(false);
    let out = Normalizer::default().normalize(&spec).unwrap();
    let n = out.normalized().unwrap();
    assert!(!n.distortion.zero_baseline_respected);
    assert!(n.distortion.lie_factor.is_violation());
    assert!(!n.checklist.get("zeroBaseline").unwrap().passed);
    assert!(!n.checklist.is_clean());
}

#[test]
fn default_bars_start_at_zero_and_pass() {
    let spec = ChartSpec::new(
        ChartType::Bar,
        vec![Series::categories("sales", &[("q1", 100.0), ("q2", 105.0)])],
    );
    let out = Normalizer::default().normalize(&spec).unwrap();
    let n = out.normalized().unwrap();
    assert_eq!(n.y.padded_min, 0.0);
    assert!(n.distortion.zero_baseline_respected);
    assert!(!n.distortion.lie_factor.is_violation());
}

#[test]
fn independent_panel_scales_are_inconsistent() {
    let mut spec = ChartSpec::new(
        ChartType::SmallMultiples,
        vec![
            Series::values("a", &[1.0, 2.0, 3.0]),
            Series::values("b", &[10.0, 20.0, 30.0]),
        ],
    );
    spec.independent_scales = true;
    let out = Normalizer::default().normalize(&spec).unwrap();
    let n = out.normalized().unwrap();
    assert!(!n.distortion.scales_consistent_across_panels);
    assert!(!n.checklist.get("scalesConsistentAcrossPanels").unwrap().passed);

    let ys: Vec<_> = n.panels.iter().map(|p| &p.y).collect();
    assert!(!scales_consistent(&ys));
}
