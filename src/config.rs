use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunables for normalization. Every field has a default, so a config file
/// only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Fraction of the data span added on each side of the range frame.
    pub frame_padding: f64,
    /// Absolute padding used when all values are equal.
    pub degenerate_margin: f64,
    /// Upper bound on ticks per axis, endpoints included.
    pub max_ticks: usize,
    /// Default label gap as a fraction of the value-axis frame span.
    pub label_gap_fraction: f64,
    /// Lie factors within `1 ± lie_tolerance` are compliant.
    pub lie_tolerance: f64,
    pub max_panels: usize,
    pub session_ttl_secs: u64,
    /// Sweep expired sessions every N admissions.
    pub sweep_every: usize,
    pub banned_color_maps: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            frame_padding: 0.05,
            degenerate_margin: 1.0,
            max_ticks: 6,
            label_gap_fraction: 0.03,
            lie_tolerance: 0.05,
            max_panels: 25,
            session_ttl_secs: 900,
            sweep_every: 64,
            banned_color_maps: ["jet", "rainbow", "hsv", "gist_rainbow", "nipy_spectral"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl NormalizerConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_config_keeps_defaults() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{"max_ticks": 4, "session_ttl_secs": 5}}"#).unwrap();
        let cfg = NormalizerConfig::from_json_file(f.path()).unwrap();
        assert_eq!(cfg.max_ticks, 4);
        assert_eq!(cfg.session_ttl(), Duration::from_secs(5));
        assert_eq!(cfg.max_panels, 25);
        assert!((cfg.frame_padding - 0.05).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(NormalizerConfig::from_json_file("/nonexistent/honest.json").is_err());
    }
}
