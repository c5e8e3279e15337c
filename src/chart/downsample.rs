//! Chunked-average downsampling of irregular time series
//!
//! Each series is reduced to at most `max_points` points. A series that only
//! covers part of the global time domain gets proportionally smaller chunks,
//! so every line ends up with a similar on-screen point density.

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Seconds since the Unix epoch
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input series, points ordered by `x`
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSeries {
    pub name: String,
    /// Virtual points preceding the first point, counted from a shared origin.
    /// Shifts the first chunk boundary so lines sharing an axis stay aligned.
    pub offset: usize,
    pub points: Vec<Point>,
}

impl NamedSeries {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            offset: 0,
            points,
        }
    }

    fn x_extent(&self) -> Option<(f64, f64)> {
        x_extent(&self.points)
    }
}

/// Reduced series, ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DownsampledLine {
    /// Position of the source series in the input (stable colour key)
    pub index: usize,
    pub name: String,
    pub offset: usize,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownsampleOptions {
    pub max_points: usize,
    /// Restrict to this `[min, max]` time window instead of the data extent
    pub domain: Option<(f64, f64)>,
}

impl DownsampleOptions {
    pub fn new(max_points: usize) -> Self {
        Self {
            max_points,
            domain: None,
        }
    }
}

/// Global `[min, max]` x across all series, `None` when there are no points
pub fn global_domain(series: &[NamedSeries]) -> Option<(f64, f64)> {
    series
        .iter()
        .filter_map(NamedSeries::x_extent)
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}

/// Downsample every series against the shared data extent
pub fn downsample(series: &[NamedSeries], max_points: usize) -> Vec<DownsampledLine> {
    downsample_with(series, &DownsampleOptions::new(max_points))
}

pub fn downsample_with(series: &[NamedSeries], opts: &DownsampleOptions) -> Vec<DownsampledLine> {
    if opts.max_points == 0 {
        return Vec::new();
    }

    let clipped: Vec<(usize, &NamedSeries, &[Point])> = series
        .iter()
        .enumerate()
        .filter_map(|(index, s)| {
            let points = match opts.domain {
                Some((lo, hi)) => clip(&s.points, lo, hi),
                None => &s.points[..],
            };
            if points.is_empty() {
                trace!(series = %s.name, "Series outside domain, skipped");
                return None;
            }
            Some((index, s, points))
        })
        .collect();

    let domain = opts.domain.or_else(|| {
        clipped
            .iter()
            .filter_map(|(_, _, points)| x_extent(points))
            .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
    });
    let Some((global_min, global_max)) = domain else {
        return Vec::new();
    };
    let global_width = global_max - global_min;

    clipped
        .into_iter()
        .filter_map(|(index, s, points)| {
            let (min_x, max_x) = x_extent(points)?;
            let line_fraction = if global_width > 0.0 {
                ((max_x - min_x) / global_width).min(1.0)
            } else {
                // instantaneous domain: every series covers all of it
                1.0
            };
            // also rejects NaN
            if !(line_fraction > 0.0) {
                trace!(series = %s.name, "Series has no temporal extent, skipped");
                return None;
            }

            // a single point is the mean of everything, wherever the grid starts
            let offset = if opts.max_points == 1 { 0 } else { s.offset };
            let chunk = chunk_size(points.len(), offset, opts.max_points, line_fraction);
            let reduced = chunk_means(points, offset, chunk);
            trace!(
                series = %s.name,
                input = points.len(),
                output = reduced.len(),
                chunk,
                line_fraction,
                "Series downsampled"
            );

            Some(DownsampledLine {
                index,
                name: s.name.clone(),
                offset: s.offset,
                points: reduced,
            })
        })
        .collect()
}

/// Set each series' `offset` from its first point's distance to `origin`,
/// measured in that series' own mean sample spacing.
pub fn align_offsets(series: &mut [NamedSeries], origin: f64) {
    for s in series.iter_mut() {
        let (Some(first), Some(last)) = (s.points.first(), s.points.last()) else {
            continue;
        };
        if s.points.len() < 2 || last.x <= first.x {
            s.offset = 0;
            continue;
        }
        let spacing = (last.x - first.x) / (s.points.len() - 1) as f64;
        let steps = ((first.x - origin) / spacing).round();
        s.offset = if steps > 0.0 { steps as usize } else { 0 };
    }
}

/// Smallest chunk that honours both the coverage-scaled budget and
/// `max_points`, without walking the offset.
fn chunk_size(len: usize, offset: usize, max_points: usize, line_fraction: f64) -> usize {
    let budget = max_points as f64 * line_fraction;
    let base = ((len as f64 / budget).ceil() as usize).max(1);
    if max_points < 2 || chunk_count(len, offset, base) <= max_points {
        return base;
    }
    // the leading partial chunk adds at most one; any chunk from `fits` on is valid
    let fits = (len - 1).div_ceil(max_points - 1).max(1);
    if chunk_count(len, offset, base + 1) <= max_points {
        base + 1
    } else {
        fits
    }
}

/// Chunks needed for `len` points after `offset` virtual ones
fn chunk_count(len: usize, offset: usize, chunk: usize) -> usize {
    (offset % chunk + len).div_ceil(chunk)
}

fn chunk_means(points: &[Point], offset: usize, chunk: usize) -> Vec<Point> {
    let mut out = Vec::with_capacity(chunk_count(points.len(), offset, chunk));
    let first = chunk - offset % chunk;
    let (head, tail) = points.split_at(first.min(points.len()));

    for part in std::iter::once(head).chain(tail.chunks(chunk)) {
        if part.is_empty() {
            continue;
        }
        let mean = part.iter().map(|p| p.y).sum::<f64>() / part.len() as f64;
        out.push(Point::new(part[0].x, mean));
    }
    out
}

fn clip(points: &[Point], lo: f64, hi: f64) -> &[Point] {
    let start = points.partition_point(|p| p.x < lo);
    let end = points.partition_point(|p| p.x <= hi);
    if start >= end {
        &[]
    } else {
        &points[start..end]
    }
}

fn x_extent(points: &[Point]) -> Option<(f64, f64)> {
    points
        .iter()
        .map(|p| (p.x, p.x))
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)))
}
