//! SVG reference renderer built on plotters.
//!
//! Draws straight onto a pixel-space drawing area instead of a `ChartBuilder`
//! mesh, so no default tick generator, grid or box sneaks in: axes are range
//! frames, ticks come from the normalized `LayoutResult`, series are labelled
//! at their resolved label positions.

use anyhow::{Result, anyhow};
use num_format::Locale;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_svg::SVGBackend;

use super::Renderer;
use super::text::{truncate_to_width, widest_label_px};
use super::util::{format_tick, map_locale};
use crate::frame::LayoutResult;
use crate::labels::LabelSide;
use crate::models::{ChartType, Datum, Series, TickDirection};
use crate::normalize::NormalizedChartSpec;
use crate::palette::Color as SeriesColor;

const INK: RGBColor = RGBColor(0x33, 0x33, 0x33);
const AXIS: RGBColor = RGBColor(0x59, 0x59, 0x59);
const TICK_LEN: i32 = 5;
const AXIS_OFFSET: i32 = 8;
const LABEL_GAP: i32 = 6;
const MAX_LABEL_PX: u32 = 160;
const MARGIN: i32 = 16;

fn rgb(c: SeriesColor) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

/// Renders a normalized chart to an SVG document string.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    pub width: u32,
    pub height: u32,
    /// Locale tag for tick labels, e.g. `"en"` or `"de"`.
    pub locale: String,
    pub font_px: u32,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            width: 800,
            height: 500,
            locale: "en".to_string(),
            font_px: 12,
        }
    }
}

impl SvgRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, tag: &str) -> Self {
        self.locale = tag.to_string();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Line,
    Area,
    Points,
    Bars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Xy(Mark),
    /// Categories stacked vertically, values along x.
    Rows { bars: bool },
    Slope,
    Panels,
    Sparkline,
}

impl Layout {
    fn of(chart: &ChartType) -> Option<Self> {
        Some(match chart {
            ChartType::Line => Layout::Xy(Mark::Line),
            ChartType::Area | ChartType::StackedArea => Layout::Xy(Mark::Area),
            ChartType::Scatter | ChartType::Bubble => Layout::Xy(Mark::Points),
            ChartType::Bar | ChartType::Histogram => Layout::Xy(Mark::Bars),
            ChartType::HorizontalBar => Layout::Rows { bars: true },
            ChartType::DotPlot => Layout::Rows { bars: false },
            ChartType::Slope => Layout::Slope,
            ChartType::SmallMultiples => Layout::Panels,
            ChartType::Sparkline => Layout::Sparkline,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Rect {
    fn inset(self, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: self.left + left,
            top: self.top + top,
            right: (self.right - right).max(self.left + left + 1),
            bottom: (self.bottom - bottom).max(self.top + top + 1),
        }
    }
}

/// Linear map from a data interval onto a pixel interval.
#[derive(Debug, Clone, Copy)]
struct Scale {
    d0: f64,
    d1: f64,
    p0: i32,
    p1: i32,
}

impl Scale {
    fn new((d0, d1): (f64, f64), (p0, p1): (i32, i32)) -> Self {
        Self { d0, d1, p0, p1 }
    }

    fn map(&self, v: f64) -> i32 {
        let span = self.d1 - self.d0;
        let t = if span.abs() < f64::EPSILON {
            0.5
        } else {
            (v - self.d0) / span
        };
        self.p0 + (t * (self.p1 - self.p0) as f64).round() as i32
    }
}

struct Painter<'a, DB: DrawingBackend> {
    area: &'a DrawingArea<DB, Shift>,
    family: FontFamily<'static>,
    font_px: u32,
    locale: &'static Locale,
    decimal_sep: char,
    ticks: TickDirection,
}

impl<DB: DrawingBackend> Painter<'_, DB> {
    fn line(&self, pts: Vec<(i32, i32)>, color: RGBColor, width: u32) -> Result<()> {
        self.area
            .draw(&PathElement::new(pts, color.stroke_width(width)))
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn text(&self, s: &str, at: (i32, i32), h: HPos, v: VPos, color: RGBColor) -> Result<()> {
        let style = FontDesc::new(self.family, self.font_px as f64, FontStyle::Normal)
            .color(&color)
            .pos(Pos::new(h, v));
        self.area
            .draw(&Text::new(s.to_string(), at, style))
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn dot(&self, at: (i32, i32), r: i32, color: RGBColor) -> Result<()> {
        self.area
            .draw(&Circle::new(at, r, color.filled()))
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn rect(&self, a: (i32, i32), b: (i32, i32), color: RGBColor) -> Result<()> {
        self.area
            .draw(&Rectangle::new([a, b], color.filled()))
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn polygon(&self, pts: Vec<(i32, i32)>, color: RGBColor) -> Result<()> {
        self.area
            .draw(&Polygon::new(pts, color.mix(0.25).filled()))
            .map_err(|e| anyhow!("{:?}", e))
    }

    fn tick_label(&self, v: f64) -> String {
        format_tick(v, self.locale, self.decimal_sep)
    }

    /// Vertical range frame at `x`, ticks pointing away from the data.
    fn y_frame(&self, frame: &LayoutResult, scale: Scale, x: i32) -> Result<()> {
        self.line(
            vec![(x, scale.map(frame.data_min)), (x, scale.map(frame.data_max))],
            AXIS,
            1,
        )?;
        let tick = match self.ticks {
            TickDirection::Out => -TICK_LEN,
            TickDirection::In => TICK_LEN,
            TickDirection::None => 0,
        };
        for &t in &frame.ticks {
            let y = scale.map(t);
            if tick != 0 {
                self.line(vec![(x, y), (x + tick, y)], AXIS, 1)?;
            }
            self.text(
                &self.tick_label(t),
                (x - TICK_LEN - 3, y),
                HPos::Right,
                VPos::Center,
                AXIS,
            )?;
        }
        Ok(())
    }

    /// Horizontal range frame at `y`.
    fn x_frame(&self, frame: &LayoutResult, scale: Scale, y: i32) -> Result<()> {
        self.line(
            vec![(scale.map(frame.data_min), y), (scale.map(frame.data_max), y)],
            AXIS,
            1,
        )?;
        let tick = match self.ticks {
            TickDirection::Out => TICK_LEN,
            TickDirection::In => -TICK_LEN,
            TickDirection::None => 0,
        };
        for &t in &frame.ticks {
            let x = scale.map(t);
            if tick != 0 {
                self.line(vec![(x, y), (x, y + tick)], AXIS, 1)?;
            }
            self.text(
                &self.tick_label(t),
                (x, y + TICK_LEN + 3),
                HPos::Center,
                VPos::Top,
                AXIS,
            )?;
        }
        Ok(())
    }
}

fn x_positions(values: &[Datum]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, d)| d.x().unwrap_or(i as f64))
        .collect()
}

fn categories(n: &NormalizedChartSpec) -> Vec<String> {
    n.spec
        .series
        .first()
        .map(|s| {
            s.values
                .iter()
                .enumerate()
                .map(|(i, d)| match d {
                    Datum::Category { category, .. } if !category.is_empty() => category.clone(),
                    Datum::Category { .. } => format!("#{}", i + 1),
                    Datum::Point { x, .. } => format!("{x}"),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Baseline bars grow from: zero when the frame reaches it, else the frame floor.
fn baseline(frame: &LayoutResult) -> f64 {
    0.0_f64.clamp(frame.padded_min, frame.padded_max)
}

impl SvgRenderer {
    fn painter<'a, DB: DrawingBackend>(
        &self,
        area: &'a DrawingArea<DB, Shift>,
        n: &NormalizedChartSpec,
    ) -> Painter<'a, DB> {
        let (locale, decimal_sep) = map_locale(&self.locale);
        Painter {
            area,
            family: if n.spec.style.serif {
                FontFamily::Serif
            } else {
                FontFamily::SansSerif
            },
            font_px: self.font_px,
            locale,
            decimal_sep,
            ticks: n.spec.style.tick_direction,
        }
    }

    fn series_color(n: &NormalizedChartSpec, id: &str) -> RGBColor {
        n.palette.color_of(id).map(rgb).unwrap_or(INK)
    }

    fn label_width(&self, n: &NormalizedChartSpec, side: LabelSide) -> i32 {
        let texts: Vec<&str> = n
            .labels
            .iter()
            .filter(|l| l.side == side)
            .map(|l| l.text.as_str())
            .collect();
        if texts.is_empty() {
            return 0;
        }
        // Slope labels also carry the value.
        let extra = if n.spec.chart_type == ChartType::Slope { 6 } else { 0 };
        (widest_label_px(texts, self.font_px, MAX_LABEL_PX) as i32)
            + extra * self.font_px as i32 / 2
            + LABEL_GAP
    }

    fn draw<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        n: &NormalizedChartSpec,
        layout: Layout,
    ) -> Result<()> {
        let p = self.painter(area, n);
        let (w, h) = area.dim_in_pixel();
        let full = Rect {
            left: 0,
            top: 0,
            right: w as i32,
            bottom: h as i32,
        };
        match layout {
            Layout::Xy(mark) => {
                let right = self.label_width(n, LabelSide::Right);
                let rect = full.inset(MARGIN + 56, MARGIN + 16, MARGIN + right, MARGIN + 28);
                self.draw_xy(&p, n, rect, &all_ids(n), n.x.as_ref(), &n.y, mark, true)
            }
            Layout::Rows { bars } => {
                let cats = categories(n);
                let cat_w =
                    widest_label_px(cats.iter().map(String::as_str), self.font_px, MAX_LABEL_PX);
                let rect = full.inset(
                    MARGIN + cat_w as i32 + LABEL_GAP,
                    MARGIN + 16,
                    MARGIN,
                    MARGIN + 28,
                );
                self.draw_rows(&p, n, rect, &cats, bars)
            }
            Layout::Slope => {
                let rect = full.inset(
                    MARGIN + self.label_width(n, LabelSide::Left),
                    MARGIN + 20,
                    MARGIN + self.label_width(n, LabelSide::Right),
                    MARGIN,
                );
                self.draw_slope(&p, n, rect)
            }
            Layout::Panels => self.draw_panels(&p, n, full.inset(MARGIN, MARGIN, MARGIN, MARGIN)),
            Layout::Sparkline => self.draw_sparkline(&p, n, full.inset(4, 4, 4, 4)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_xy<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        n: &NormalizedChartSpec,
        rect: Rect,
        ids: &[String],
        x: Option<&LayoutResult>,
        y: &LayoutResult,
        mark: Mark,
        labels: bool,
    ) -> Result<()> {
        let drawn = n.drawn_values();
        let longest = n.spec.series.iter().map(|s| s.values.len()).max().unwrap_or(1);
        let x_dom = match x {
            Some(f) => (f.padded_min, f.padded_max),
            None => (-0.5, longest as f64 - 0.5),
        };
        let sx = Scale::new(x_dom, (rect.left, rect.right));
        let sy = Scale::new((y.padded_min, y.padded_max), (rect.bottom, rect.top));

        p.y_frame(y, sy, rect.left - AXIS_OFFSET)?;
        match x {
            Some(f) => p.x_frame(f, sx, rect.bottom + AXIS_OFFSET)?,
            None => {
                for (i, c) in categories(n).iter().enumerate() {
                    p.text(
                        c,
                        (sx.map(i as f64), rect.bottom + AXIS_OFFSET),
                        HPos::Center,
                        VPos::Top,
                        AXIS,
                    )?;
                }
            }
        }
        if let Some(title) = &n.spec.y_axis.title {
            p.text(
                title,
                (rect.left - AXIS_OFFSET, rect.top - 12),
                HPos::Left,
                VPos::Bottom,
                AXIS,
            )?;
        }
        if let Some(title) = &n.spec.x_axis.title {
            p.text(title, (rect.right, rect.bottom + 28), HPos::Right, VPos::Top, AXIS)?;
        }

        let base = baseline(y);
        let visible: Vec<&Series> =
            n.spec.series.iter().filter(|s| ids.contains(&s.id)).collect();
        let slot = (sx.map(1.0) - sx.map(0.0)).abs().max(2);
        let bar_w = ((slot as f64 * 0.8) / visible.len().max(1) as f64).max(1.0) as i32;
        let mut lower: Option<Vec<f64>> = None;

        for (k, s) in visible.iter().enumerate() {
            let color = Self::series_color(n, &s.id);
            let ys = drawn
                .iter()
                .find(|(id, _)| id == &s.id)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| s.ys());
            let xs = match x {
                Some(_) => x_positions(&s.values),
                None => (0..s.values.len()).map(|i| i as f64).collect(),
            };
            let pts: Vec<(i32, i32)> = xs
                .iter()
                .zip(&ys)
                .map(|(&a, &b)| (sx.map(a), sy.map(b)))
                .collect();

            match mark {
                Mark::Line => p.line(pts, color, 2)?,
                Mark::Area => {
                    let stacked = n.spec.chart_type == ChartType::StackedArea;
                    // Close the band against the series below, or the baseline.
                    let floor: Vec<(i32, i32)> = match (&lower, stacked) {
                        (Some(prev), true) => xs
                            .iter()
                            .zip(prev)
                            .map(|(&a, &b)| (sx.map(a), sy.map(b)))
                            .rev()
                            .collect(),
                        _ => xs.iter().rev().map(|&a| (sx.map(a), sy.map(base))).collect(),
                    };
                    let mut poly = pts.clone();
                    poly.extend(floor);
                    p.polygon(poly, color)?;
                    p.line(pts, color, 2)?;
                    lower = Some(ys.clone());
                }
                Mark::Points => {
                    for pt in pts {
                        p.dot(pt, 3, color)?;
                    }
                }
                Mark::Bars => {
                    let offset = -(slot as f64 * 0.4) as i32 + k as i32 * bar_w;
                    for &(px, py) in &pts {
                        let x0 = px + offset;
                        let y0 = sy.map(base);
                        p.rect((x0, py.min(y0)), (x0 + bar_w - 1, py.max(y0)), color)?;
                    }
                }
            }
        }

        if labels {
            let right = n
                .labels
                .iter()
                .filter(|l| l.side == LabelSide::Right && ids.contains(&l.entity_id));
            for l in right {
                let text = truncate_to_width(&l.text, self.font_px, MAX_LABEL_PX);
                p.text(
                    &text,
                    (rect.right + LABEL_GAP, sy.map(l.position)),
                    HPos::Left,
                    VPos::Center,
                    Self::series_color(n, &l.entity_id),
                )?;
            }
        }
        Ok(())
    }

    fn draw_rows<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        n: &NormalizedChartSpec,
        rect: Rect,
        cats: &[String],
        bars: bool,
    ) -> Result<()> {
        let rows = cats.len().max(1) as f64;
        let sv = Scale::new((n.y.padded_min, n.y.padded_max), (rect.left, rect.right));
        let sr = Scale::new((-0.5, rows - 0.5), (rect.top, rect.bottom));
        let row_h = (sr.map(1.0) - sr.map(0.0)).abs().max(2);
        let k = n.spec.series.len().max(1) as i32;
        let thick = ((row_h as f64 * 0.6) as i32 / k).max(1);
        let base = sv.map(baseline(&n.y));

        for (i, c) in cats.iter().enumerate() {
            let at = (rect.left - LABEL_GAP, sr.map(i as f64));
            p.text(c, at, HPos::Right, VPos::Center, INK)?;
        }
        for (j, s) in n.spec.series.iter().enumerate() {
            let color = Self::series_color(n, &s.id);
            for (i, d) in s.values.iter().enumerate() {
                let cy = sr.map(i as f64);
                let v = sv.map(d.value());
                if bars {
                    let y0 = cy - (thick * k) / 2 + j as i32 * thick;
                    p.rect((base.min(v), y0), (base.max(v), y0 + thick - 1), color)?;
                } else {
                    p.dot((v, cy), 4, color)?;
                }
            }
        }
        p.x_frame(&n.y, sv, rect.bottom + AXIS_OFFSET)
    }

    fn draw_slope<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        n: &NormalizedChartSpec,
        rect: Rect,
    ) -> Result<()> {
        let sy = Scale::new((n.y.padded_min, n.y.padded_max), (rect.bottom, rect.top));
        let (xl, xr) = (rect.left, rect.right);

        if let Some(first) = n.spec.series.first() {
            let head = |d: Option<&Datum>| match d {
                // Column heads are usually years; no digit grouping.
                Some(Datum::Point { x, .. }) => format!("{x}"),
                Some(Datum::Category { category, .. }) => category.clone(),
                None => String::new(),
            };
            for (d, x) in [(first.values.first(), xl), (first.values.last(), xr)] {
                p.text(&head(d), (x, rect.top - 8), HPos::Center, VPos::Bottom, AXIS)?;
            }
        }

        for s in &n.spec.series {
            let color = Self::series_color(n, &s.id);
            let (Some(a), Some(b)) = (s.values.first(), s.values.last()) else {
                continue;
            };
            p.line(vec![(xl, sy.map(a.value())), (xr, sy.map(b.value()))], color, 2)?;
        }
        for l in &n.labels {
            let color = Self::series_color(n, &l.entity_id);
            let value = p.tick_label(l.raw);
            let text = truncate_to_width(&l.text, self.font_px, MAX_LABEL_PX);
            match l.side {
                LabelSide::Left => p.text(
                    &format!("{text} {value}"),
                    (xl - LABEL_GAP, sy.map(l.position)),
                    HPos::Right,
                    VPos::Center,
                    color,
                )?,
                LabelSide::Right => p.text(
                    &format!("{value} {text}"),
                    (xr + LABEL_GAP, sy.map(l.position)),
                    HPos::Left,
                    VPos::Center,
                    color,
                )?,
            }
        }
        Ok(())
    }

    fn draw_panels<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        n: &NormalizedChartSpec,
        rect: Rect,
    ) -> Result<()> {
        let count = n.panels.len().max(1);
        let cols = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        let cell_w = (rect.right - rect.left) / cols as i32;
        let cell_h = (rect.bottom - rect.top) / rows as i32;

        for (i, panel) in n.panels.iter().enumerate() {
            let (c, r) = ((i % cols) as i32, (i / cols) as i32);
            let cell = Rect {
                left: rect.left + c * cell_w,
                top: rect.top + r * cell_h,
                right: rect.left + (c + 1) * cell_w,
                bottom: rect.top + (r + 1) * cell_h,
            };
            if let Some(title) = &panel.title {
                p.text(title, (cell.left + 48, cell.top + 2), HPos::Left, VPos::Top, INK)?;
            }
            let plot = cell.inset(48, 20, 12, 28);
            self.draw_xy(
                p,
                n,
                plot,
                &panel.series_ids,
                panel.x.as_ref(),
                &panel.y,
                Mark::Line,
                false,
            )?;
        }
        Ok(())
    }

    fn draw_sparkline<DB: DrawingBackend>(
        &self,
        p: &Painter<'_, DB>,
        n: &NormalizedChartSpec,
        rect: Rect,
    ) -> Result<()> {
        let end_w = self.font_px as i32 * 4;
        let rect = rect.inset(0, 0, end_w, 0);
        let x_dom = n.x.as_ref().map(|f| (f.data_min, f.data_max)).unwrap_or((0.0, 1.0));
        let sx = Scale::new(x_dom, (rect.left, rect.right));
        let sy = Scale::new((n.y.padded_min, n.y.padded_max), (rect.bottom, rect.top));
        for s in &n.spec.series {
            let color = Self::series_color(n, &s.id);
            let pts: Vec<(i32, i32)> = x_positions(&s.values)
                .into_iter()
                .zip(s.ys())
                .map(|(a, b)| (sx.map(a), sy.map(b)))
                .collect();
            if let (Some(&end), Some(last)) = (pts.last(), s.values.last()) {
                p.line(pts, color, 1)?;
                p.dot(end, 2, color)?;
                let value = p.tick_label(last.value());
                p.text(&value, (end.0 + 4, end.1), HPos::Left, VPos::Center, color)?;
            }
        }
        Ok(())
    }
}

fn all_ids(n: &NormalizedChartSpec) -> Vec<String> {
    n.spec.series.iter().map(|s| s.id.clone()).collect()
}

impl Renderer for SvgRenderer {
    type Artifact = String;

    fn render(&self, n: &NormalizedChartSpec) -> Result<String> {
        let layout = Layout::of(&n.spec.chart_type).ok_or_else(|| {
            anyhow!("svg renderer has no drawing for {} charts", n.spec.chart_type)
        })?;
        let mut buf = String::new();
        {
            let root =
                SVGBackend::with_string(&mut buf, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| anyhow!("{:?}", e))?;
            self.draw(&root, n, layout)?;
            root.present().map_err(|e| anyhow!("{:?}", e))?;
        }
        Ok(buf)
    }
}
