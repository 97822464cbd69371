//! Rendering back ends for normalized charts.
//!
//! Renderers only draw what the normalizer already decided: frames, ticks,
//! label positions and colors all come from the [`NormalizedChartSpec`].

pub mod svg;
pub mod text;
pub mod util;

use anyhow::Result;

use crate::normalize::NormalizedChartSpec;

pub use svg::SvgRenderer;

/// Turns a normalized chart into an output artifact (SVG text, bytes, ...).
pub trait Renderer {
    type Artifact;

    fn render(&self, chart: &NormalizedChartSpec) -> Result<Self::Artifact>;
}
