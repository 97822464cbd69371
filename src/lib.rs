//! honest_charts
//!
//! Validates declarative chart specs and normalizes them into honest,
//! minimal-ink renderings. Pairs with the `honest-charts` CLI.
//!
//! ### Features
//! - Classify chart types and suggest substitutes for banned ones (pie, 3D, dual-axis, ...)
//! - Two-step "explain, then allow" override sessions for banned types
//! - Range-frame axes with sparse, round ticks
//! - Collision-free direct labels instead of legends
//! - Grayscale / single-accent / colorblind-safe palettes
//! - Lie factor, zero-baseline and shared-scale integrity checks
//! - A versioned presentation checklist, exportable as JSON or CSV
//! - A reference SVG renderer
//!
//! ### Example
//! ```no_run
//! use honest_charts::{ChartSpec, ChartType, Normalization, Normalizer, Series};
//! use honest_charts::render::{Renderer, SvgRenderer};
//!
//! let spec = ChartSpec::new(
//!     ChartType::Line,
//!     vec![
//!         Series::values("gdp", &[1.0, 1.4, 1.9]).with_label("GDP"),
//!         Series::values("debt", &[0.8, 1.1, 1.2]).with_label("Debt"),
//!     ],
//! );
//! match Normalizer::default().normalize(&spec)? {
//!     Normalization::Normalized(chart) => {
//!         for entry in chart.checklist.warnings() {
//!             eprintln!("{}: {}", entry.rule_id, entry.message);
//!         }
//!         let svg = SvgRenderer::default().render(&chart)?;
//!         std::fs::write("gdp.svg", svg)?;
//!     }
//!     Normalization::NeedsConfirmation(ask) => eprintln!("{}", ask.rationale),
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod checklist;
pub mod classify;
pub mod config;
pub mod error;
pub mod frame;
pub mod integrity;
pub mod labels;
pub mod models;
pub mod normalize;
pub mod palette;
pub mod render;
pub mod session;
pub mod storage;

pub use checklist::{ChecklistEntry, ChecklistReport, Severity};
pub use classify::{Substitute, SubstitutionDecision, classify};
pub use config::NormalizerConfig;
pub use error::{SchemaError, SessionError};
pub use frame::LayoutResult;
pub use integrity::{DistortionReport, LieFactor};
pub use labels::{LabelPlacement, LabelSide, LayoutWarning};
pub use models::{AxisSpec, ChartSpec, ChartType, Datum, Panel, Series, StyleHints};
pub use normalize::{Normalization, NormalizedChartSpec, Normalizer};
pub use palette::{Color, PaletteAssignment, PaletteMode};
pub use session::{NeedsConfirmation, OverrideSessions, SessionState};
