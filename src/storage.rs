use crate::checklist::ChecklistReport;
use crate::models::ChartSpec;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Read a chart spec from a JSON file.
pub fn load_spec<P: AsRef<Path>>(path: P) -> Result<ChartSpec> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading chart spec {}", path.display()))?;
    let spec = serde_json::from_str(&raw)
        .with_context(|| format!("parsing chart spec {}", path.display()))?;
    Ok(spec)
}

/// Save any result (normalized spec, confirmation request, decision) as pretty JSON.
pub fn save_json<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    let mut f = File::create(path)?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save a checklist report as CSV with header.
pub fn save_report_csv<P: AsRef<Path>>(report: &ChecklistReport, path: P) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_path(path)?;
    wtr.write_record(["version", "rule_id", "passed", "severity", "message"])?;
    for e in &report.entries {
        let severity = match e.severity {
            crate::checklist::Severity::Info => "info",
            crate::checklist::Severity::Warning => "warning",
        };
        wtr.write_record([
            report.version.as_str(),
            e.rule_id.as_str(),
            if e.passed { "true" } else { "false" },
            severity,
            e.message.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checklist::{ChecklistEntry, Severity};
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("report.csv");
        let jsonp = dir.path().join("report.json");
        let report = ChecklistReport {
            version: "1.0".into(),
            entries: vec![ChecklistEntry {
                rule_id: "serifTypography".into(),
                passed: false,
                severity: Severity::Warning,
                message: "use a serif face, please".into(),
            }],
        };
        save_report_csv(&report, &csvp).unwrap();
        save_json(&report, &jsonp).unwrap();
        let csv_text = std::fs::read_to_string(&csvp).unwrap();
        assert!(csv_text.starts_with("version,rule_id,passed,severity,message"));
        assert!(csv_text.contains("\"use a serif face, please\""));
        assert!(jsonp.exists());
    }

    #[test]
    fn load_spec_reports_path_on_error() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("bad.json");
        std::fs::write(&p, "{ not json").unwrap();
        let err = load_spec(&p).unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }
}
