//! Deterministic color assignment for chart series.
//!
//! Three palettes are available:
//!
//! - **Grayscale**: a five-step gray ramp, cycled by series index.
//! - **Single accent**: every series is the neutral gray except one highlighted
//!   series, which receives the single accent color.
//! - **Colorblind safe**: the eight Okabe–Ito hues, cycled by `index mod 8`.
//!
//! # Example
//!
//! ```rust
//! use honest_charts::palette::{assign_palette, PaletteMode};
//!
//! let ids = vec!["a".to_string(), "b".to_string()];
//! let a = assign_palette(&ids, &PaletteMode::ColorblindSafe);
//! let b = assign_palette(&ids, &PaletteMode::ColorblindSafe);
//! assert_eq!(a, b);
//! ```
//!
//! Assignment is a pure function of (series order, mode): identical inputs
//! always produce identical outputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque RGB color, serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (case-insensitive). Returns `None` for anything else.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::from_hex(&s).ok_or_else(|| format!("expected #RRGGBB color, got `{s}`"))
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.hex()
    }
}

/// Gray ramp, darkest first so the first series carries the most ink.
pub const GRAYSCALE: [Color; 5] = [
    Color::rgb(0x1A, 0x1A, 0x1A),
    Color::rgb(0x4D, 0x4D, 0x4D),
    Color::rgb(0x7F, 0x7F, 0x7F),
    Color::rgb(0xA6, 0xA6, 0xA6),
    Color::rgb(0xCC, 0xCC, 0xCC),
];

pub const NEUTRAL: Color = Color::rgb(0x8C, 0x8C, 0x8C);
pub const ACCENT: Color = Color::rgb(0xC0, 0x39, 0x2B);

/// Okabe–Ito palette.
pub const COLORBLIND_SAFE: [Color; 8] = [
    Color::rgb(0x00, 0x00, 0x00), // black
    Color::rgb(0xE6, 0x9F, 0x00), // orange
    Color::rgb(0x56, 0xB4, 0xE9), // sky blue
    Color::rgb(0x00, 0x9E, 0x73), // bluish green
    Color::rgb(0xF0, 0xE4, 0x42), // yellow
    Color::rgb(0x00, 0x72, 0xB2), // blue
    Color::rgb(0xD5, 0x5E, 0x00), // vermillion
    Color::rgb(0xCC, 0x79, 0xA7), // reddish purple
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PaletteMode {
    #[default]
    Grayscale,
    SingleAccent {
        #[serde(default)]
        highlight: Option<String>,
    },
    ColorblindSafe,
}

impl PaletteMode {
    /// Number of distinct colors the mode can hand out.
    pub fn size(&self) -> usize {
        match self {
            PaletteMode::Grayscale => GRAYSCALE.len(),
            PaletteMode::SingleAccent { .. } => 2,
            PaletteMode::ColorblindSafe => COLORBLIND_SAFE.len(),
        }
    }

    /// Single-accent intentionally shares the neutral tone across series.
    pub fn expects_distinct(&self) -> bool {
        !matches!(self, PaletteMode::SingleAccent { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub series_id: String,
    pub color: Color,
    #[serde(default)]
    pub accent: bool,
    /// Color came from the chart request rather than the palette.
    #[serde(default)]
    pub explicit: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteAssignment {
    pub mode: PaletteMode,
    pub entries: Vec<PaletteEntry>,
}

impl PaletteAssignment {
    pub fn color_of(&self, series_id: &str) -> Option<Color> {
        self.entries
            .iter()
            .find(|e| e.series_id == series_id)
            .map(|e| e.color)
    }

    /// Replace palette colors with caller-supplied ones.
    pub fn with_overrides(mut self, overrides: &[(String, Color)]) -> Self {
        for (id, color) in overrides {
            if let Some(entry) = self.entries.iter_mut().find(|e| &e.series_id == id) {
                entry.color = *color;
                entry.explicit = true;
            }
        }
        self
    }

    /// True when no two palette-assigned series share a color, or when the
    /// series count exceeds the palette size (cycling is then expected).
    pub fn is_distinct(&self) -> bool {
        if !self.mode.expects_distinct() || self.entries.len() > self.mode.size() {
            return true;
        }
        let mut seen = std::collections::HashSet::new();
        self.entries.iter().all(|e| seen.insert(e.color))
    }
}

/// Assign a color to each series id in order.
pub fn assign_palette(series_ids: &[String], mode: &PaletteMode) -> PaletteAssignment {
    let entries = series_ids
        .iter()
        .enumerate()
        .map(|(idx, id)| {
            let (color, accent) = match mode {
                PaletteMode::Grayscale => (GRAYSCALE[idx % GRAYSCALE.len()], false),
                PaletteMode::ColorblindSafe => {
                    (COLORBLIND_SAFE[idx % COLORBLIND_SAFE.len()], false)
                }
                PaletteMode::SingleAccent { highlight } => {
                    if highlight.as_deref() == Some(id.as_str()) {
                        (ACCENT, true)
                    } else {
                        (NEUTRAL, false)
                    }
                }
            };
            PaletteEntry {
                series_id: id.clone(),
                color,
                accent,
                explicit: false,
            }
        })
        .collect();
    log::debug!("assigned {:?} palette to {} series", mode, series_ids.len());
    PaletteAssignment {
        mode: mode.clone(),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("s{i}")).collect()
    }

    #[test]
    fn hex_round_trip_and_rejects_garbage() {
        let c = Color::from_hex("#e69f00").unwrap();
        assert_eq!(c, Color::rgb(0xE6, 0x9F, 0x00));
        assert_eq!(c.hex(), "#E69F00");
        assert!(Color::from_hex("e69f00").is_none());
        assert!(Color::from_hex("#e69f0").is_none());
        assert!(Color::from_hex("#zzzzzz").is_none());
    }

    #[test]
    fn grayscale_cycles_after_ramp() {
        let p = assign_palette(&ids(6), &PaletteMode::Grayscale);
        assert_eq!(p.entries[5].color, p.entries[0].color);
        assert_ne!(p.entries[1].color, p.entries[0].color);
        assert!(p.is_distinct());
    }

    #[test]
    fn single_accent_only_highlights_one() {
        let mode = PaletteMode::SingleAccent {
            highlight: Some("s2".into()),
        };
        let p = assign_palette(&ids(4), &mode);
        let accents: Vec<_> = p.entries.iter().filter(|e| e.accent).collect();
        assert_eq!(accents.len(), 1);
        assert_eq!(accents[0].series_id, "s2");
        assert_eq!(p.color_of("s0"), Some(NEUTRAL));
        assert_eq!(p.color_of("s2"), Some(ACCENT));
    }

    #[test]
    fn overrides_mark_entries_explicit() {
        let p = assign_palette(&ids(2), &PaletteMode::ColorblindSafe)
            .with_overrides(&[("s1".into(), Color::rgb(1, 2, 3))]);
        assert_eq!(p.color_of("s1"), Some(Color::rgb(1, 2, 3)));
        assert!(p.entries[1].explicit);
        assert!(!p.entries[0].explicit);
    }

    #[test]
    fn duplicate_override_breaks_distinctness() {
        let black = COLORBLIND_SAFE[0];
        let p = assign_palette(&ids(3), &PaletteMode::ColorblindSafe)
            .with_overrides(&[("s2".into(), black)]);
        assert!(!p.is_distinct());
    }

    #[test]
    fn palette_mode_json_shape() {
        let m: PaletteMode =
            serde_json::from_str(r#"{"mode": "single-accent", "highlight": "b"}"#).unwrap();
        assert_eq!(
            m,
            PaletteMode::SingleAccent {
                highlight: Some("b".into())
            }
        );
        let m: PaletteMode = serde_json::from_str(r#"{"mode": "colorblind-safe"}"#).unwrap();
        assert_eq!(m, PaletteMode::ColorblindSafe);
    }
}
