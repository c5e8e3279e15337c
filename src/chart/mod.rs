//! Time-series charting: downsampling, axes and geometry

pub mod axis;
pub mod downsample;
pub mod renderer;
pub mod svg;

pub use axis::{AxisFormatter, Granularity, Tick, DEFAULT_MIN_PITCH_PX};
pub use downsample::{
    align_offsets, downsample, downsample_with, global_domain, DownsampleOptions, DownsampledLine,
    NamedSeries, Point,
};
pub use renderer::{Anchor, ChartGeometry, ChartRenderer, Pos, Rgb, Size, Surface, PALETTE};
pub use svg::SvgSurface;
