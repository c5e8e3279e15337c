//! Chart renderer: downsampled series → pixel geometry
//!
//! The renderer owns no drawing surface. It produces a `ChartGeometry` that
//! any `Surface` (SVG, egui painter, ...) can draw.

use super::axis::{AxisFormatter, Tick};
use super::downsample::{
    align_offsets, downsample_with, global_domain, DownsampleOptions, DownsampledLine, NamedSeries,
};
use tracing::debug;

/// Length of tick marks in pixels
const TICK_LEN: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos {
    pub x: f32,
    pub y: f32,
}

impl Pos {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Line colours, cycled by series index
pub const PALETTE: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

pub const AXIS_COLOR: Rgb = Rgb(0x80, 0x80, 0x80);

pub fn series_color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

/// Text alignment relative to the anchor point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Text hangs below the point, centred (x-axis labels)
    TopCenter,
    /// Text ends at the point, vertically centred (y-axis labels)
    RightMiddle,
    /// Text sits above the point, centred (axis title)
    BottomCenter,
}

/// Anything geometry can be drawn onto
pub trait Surface {
    fn polyline(&mut self, points: &[Pos], color: Rgb, width: f32);
    fn line(&mut self, from: Pos, to: Pos, color: Rgb, width: f32);
    fn text(&mut self, at: Pos, text: &str, anchor: Anchor, color: Rgb);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 10.0,
            right: 20.0,
            bottom: 40.0,
            left: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub name: String,
    pub color: Rgb,
    pub points: Vec<Pos>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisGeometry {
    pub from: Pos,
    pub to: Pos,
    pub ticks: Vec<Tick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub size: Size,
    pub lines: Vec<Polyline>,
    pub x_axis: AxisGeometry,
    pub y_axis: AxisGeometry,
    pub x_label: String,
}

impl ChartGeometry {
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        for line in &self.lines {
            surface.polyline(&line.points, line.color, 1.5);
        }

        surface.line(self.x_axis.from, self.x_axis.to, AXIS_COLOR, 1.0);
        for tick in &self.x_axis.ticks {
            let at = Pos::new(tick.px, self.x_axis.from.y);
            surface.line(at, Pos::new(at.x, at.y + TICK_LEN), AXIS_COLOR, 1.0);
            surface.text(Pos::new(at.x, at.y + TICK_LEN + 2.0), &tick.label, Anchor::TopCenter, AXIS_COLOR);
        }

        surface.line(self.y_axis.from, self.y_axis.to, AXIS_COLOR, 1.0);
        for tick in &self.y_axis.ticks {
            let at = Pos::new(self.y_axis.from.x, tick.px);
            surface.line(at, Pos::new(at.x - TICK_LEN, at.y), AXIS_COLOR, 1.0);
            surface.text(Pos::new(at.x - TICK_LEN - 2.0, at.y), &tick.label, Anchor::RightMiddle, AXIS_COLOR);
        }

        if !self.x_label.is_empty() {
            let center = (self.x_axis.from.x + self.x_axis.to.x) / 2.0;
            surface.text(Pos::new(center, self.size.height - 2.0), &self.x_label, Anchor::BottomCenter, AXIS_COLOR);
        }
    }
}

/// Lays out downsampled series inside a fixed pixel box
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    size: Size,
    margins: Margins,
    axis: AxisFormatter,
    /// Fixed value domain; the data extent is used when unset
    y_domain: Option<(f64, f64)>,
}

impl ChartRenderer {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size { width, height },
            margins: Margins::default(),
            axis: AxisFormatter::new(),
            y_domain: None,
        }
    }

    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    pub fn with_axis_formatter(mut self, axis: AxisFormatter) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_y_domain(mut self, lo: f64, hi: f64) -> Self {
        self.y_domain = Some((lo, hi));
        self
    }

    /// Horizontal and vertical pixel ranges of the plot area
    ///
    /// The vertical range runs bottom → top so larger values render higher.
    fn plot_ranges(&self) -> ((f32, f32), (f32, f32)) {
        let m = &self.margins;
        let x_range = (m.left, (self.size.width - m.right).max(m.left));
        let y_range = ((self.size.height - m.bottom).max(m.top), m.top);
        (x_range, y_range)
    }

    pub fn render(&self, series: &[NamedSeries], max_points: usize, x_label: &str) -> ChartGeometry {
        let x_domain = global_domain(series);
        // chunk boundaries of every line start from the same origin
        let mut aligned = series.to_vec();
        if let Some((origin, _)) = x_domain {
            align_offsets(&mut aligned, origin);
        }
        let lines = downsample_with(&aligned, &DownsampleOptions::new(max_points));
        let y_domain = self.y_domain.or_else(|| value_extent(&lines)).map(pad_flat);

        let (x_range, y_range) = self.plot_ranges();
        let polylines = match (x_domain, y_domain) {
            (Some(xd), Some(yd)) => lines
                .iter()
                .map(|line| Polyline {
                    name: line.name.clone(),
                    color: series_color(line.index),
                    points: line
                        .points
                        .iter()
                        .map(|p| Pos::new(map_linear(p.x, xd, x_range), map_linear(p.y, yd, y_range)))
                        .collect(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let x_ticks = x_domain
            .map(|d| self.axis.time_ticks(d, x_range))
            .unwrap_or_default();
        let y_ticks = y_domain
            .map(|d| self.axis.value_ticks(d, y_range))
            .unwrap_or_default();

        debug!(
            series = series.len(),
            lines = polylines.len(),
            x_ticks = x_ticks.len(),
            y_ticks = y_ticks.len(),
            "Chart rendered"
        );

        ChartGeometry {
            size: self.size,
            lines: polylines,
            x_axis: AxisGeometry {
                from: Pos::new(x_range.0, y_range.0),
                to: Pos::new(x_range.1, y_range.0),
                ticks: x_ticks,
            },
            y_axis: AxisGeometry {
                from: Pos::new(x_range.0, y_range.0),
                to: Pos::new(x_range.0, y_range.1),
                ticks: y_ticks,
            },
            x_label: x_label.to_string(),
        }
    }
}

fn value_extent(lines: &[DownsampledLine]) -> Option<(f64, f64)> {
    lines
        .iter()
        .flat_map(|l| l.points.iter())
        .map(|p| (p.y, p.y))
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

/// Give a flat value domain some height so lines land mid-plot
fn pad_flat((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

fn map_linear(v: f64, domain: (f64, f64), range: (f32, f32)) -> f32 {
    let width = domain.1 - domain.0;
    if width <= 0.0 {
        return (range.0 + range.1) / 2.0;
    }
    let t = ((v - domain.0) / width) as f32;
    range.0 + t * (range.1 - range.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Point;

    #[derive(Default)]
    struct Recorder {
        polylines: Vec<(usize, Rgb)>,
        lines: usize,
        texts: Vec<String>,
    }

    impl Surface for Recorder {
        fn polyline(&mut self, points: &[Pos], color: Rgb, _width: f32) {
            self.polylines.push((points.len(), color));
        }

        fn line(&mut self, _from: Pos, _to: Pos, _color: Rgb, _width: f32) {
            self.lines += 1;
        }

        fn text(&mut self, _at: Pos, text: &str, _anchor: Anchor, _color: Rgb) {
            self.texts.push(text.to_string());
        }
    }

    fn series(name: &str, start: f64, ys: &[f64]) -> NamedSeries {
        NamedSeries::new(
            name,
            ys.iter()
                .enumerate()
                .map(|(i, &y)| Point::new(start + i as f64 * 60.0, y))
                .collect(),
        )
    }

    #[test]
    fn test_larger_values_render_higher() {
        let renderer = ChartRenderer::new(400.0, 200.0);
        let geo = renderer.render(&[series("a", 1_700_000_000.0, &[0.0, 100.0])], 100, "time");
        let pts = &geo.lines[0].points;
        assert!(pts[1].y < pts[0].y);
        assert_eq!(pts[0], Pos::new(50.0, 160.0));
        assert_eq!(pts[1], Pos::new(380.0, 10.0));
    }

    #[test]
    fn test_late_series_shares_chunk_grid() {
        let renderer = ChartRenderer::new(400.0, 200.0);
        let t0 = 1_700_000_000.0;
        let early = series("early", t0, &[1.0; 24]);
        // starts three samples later
        let late = series("late", t0 + 180.0, &[2.0; 21]);
        let geo = renderer.render(&[early, late], 5, "time");

        let xs = |i: usize| geo.lines[i].points.iter().map(|p| p.x).collect::<Vec<_>>();
        let (early_x, late_x) = (xs(0), xs(1));
        assert_eq!(early_x.len(), 5);
        assert_eq!(late_x.len(), 5);
        // leading partial chunk, then the same boundaries as the early line
        assert!(late_x[0] > early_x[0] && late_x[0] < early_x[1]);
        assert_eq!(late_x[1..], early_x[1..]);
    }

    #[test]
    fn test_palette_cycles_by_input_index() {
        let input: Vec<NamedSeries> = (0..12)
            .map(|i| series(&format!("s{i}"), 1_700_000_000.0, &[1.0, 2.0, 3.0]))
            .collect();
        let geo = ChartRenderer::new(400.0, 200.0).render(&input, 50, "");
        assert_eq!(geo.lines[0].color, PALETTE[0]);
        assert_eq!(geo.lines[10].color, PALETTE[0]);
        assert_eq!(geo.lines[11].color, PALETTE[1]);
    }

    #[test]
    fn test_draw_emits_axes_and_labels() {
        let geo = ChartRenderer::new(600.0, 300.0)
            .with_y_domain(0.0, 100.0)
            .render(&[series("a", 1_700_000_000.0, &[10.0, 50.0, 30.0, 70.0])], 100, "time");
        let mut rec = Recorder::default();
        geo.draw(&mut rec);

        assert_eq!(rec.polylines, vec![(4, PALETTE[0])]);
        let ticks = geo.x_axis.ticks.len() + geo.y_axis.ticks.len();
        assert_eq!(rec.lines, 2 + ticks);
        assert_eq!(rec.texts.last().map(String::as_str), Some("time"));
        assert!(geo.y_axis.ticks.iter().any(|t| t.label == "100"));
    }

    #[test]
    fn test_empty_input_renders_bare_axes() {
        let geo = ChartRenderer::new(400.0, 200.0).render(&[], 100, "time");
        assert!(geo.lines.is_empty());
        assert!(geo.x_axis.ticks.is_empty());
        assert!(geo.y_axis.ticks.is_empty());
    }

    #[test]
    fn test_flat_series_centered() {
        let geo = ChartRenderer::new(400.0, 200.0).render(&[series("flat", 0.0, &[5.0, 5.0])], 10, "");
        let y = geo.lines[0].points[0].y;
        assert!((y - 85.0).abs() < 1e-3);
    }

    #[test]
    fn test_rgb_hex() {
        assert_eq!(Rgb(0x1f, 0x77, 0xb4).to_hex(), "#1f77b4");
    }
}
