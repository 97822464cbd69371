use honest_charts::checklist::RULES;
use honest_charts::{ChartSpec, ChartType, Normalization, Normalizer, Series, storage};
use tempfile::tempdir;

#[test]
fn spec_file_to_report_files() {
    let dir = tempdir().unwrap();
    let spec_path = dir.path().join("spec.json");
    let json_path = dir.path().join("normalized.json");
    let csv_path = dir.path().join("checklist.csv");

    let spec = ChartSpec::new(
        ChartType::Line,
        vec![Series::values("a", &[1.0, 2.0, 4.0]).with_label("Alpha")],
    );
    std::fs::write(&spec_path, serde_json::to_string_pretty(&spec).unwrap()).unwrap();

    let loaded = storage::load_spec(&spec_path).unwrap();
    assert_eq!(loaded, spec);

    let out = Normalizer::default().normalize(&loaded).unwrap();
    let chart = out.normalized().unwrap();
    storage::save_json(&out, &json_path).unwrap();
    storage::save_report_csv(&chart.checklist, &csv_path).unwrap();

    let back: Normalization =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    let back = back.normalized().unwrap();
    assert_eq!(back.checklist, chart.checklist);
    assert_eq!(back.spec.chart_type, ChartType::Line);

    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), RULES.len());
    assert_eq!(&rows[0][0], "1.0");
    assert_eq!(&rows[0][1], "bannedChartType");
}

#[test]
fn spec_file_with_unknown_chart_type_still_loads() {
    let dir = tempdir().unwrap();
    let p = dir.path().join("sankey.json");
    std::fs::write(
        &p,
        r#"{"chart_type": "Sankey", "series": [{"id": "s", "values": [{"x": 0, "y": 1}]}]}"#,
    )
    .unwrap();
    let spec = storage::load_spec(&p).unwrap();
    assert_eq!(spec.chart_type, ChartType::Other("sankey".into()));
}
