//! Axis ticks and multi-resolution time labels
//!
//! A timestamp is labelled at the finest calendar unit it is not aligned to:
//! `12:30` for a half hour, `Tue 14` for a midnight, `March` for the first
//! of a month, and so on. Ticks are thinned so that no two labels are closer
//! than a minimum pixel pitch.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, TimeZone, Timelike, Utc, Weekday};

pub const DEFAULT_MIN_PITCH_PX: f32 = 40.0;

/// Ticks requested from the scale before thinning
pub const TARGET_TICKS: usize = 10;

const MS_SECOND: i64 = 1_000;
const MS_MINUTE: i64 = 60 * MS_SECOND;
const MS_HOUR: i64 = 60 * MS_MINUTE;
const MS_DAY: i64 = 24 * MS_HOUR;
const MS_WEEK: i64 = 7 * MS_DAY;
const MS_MONTH: i64 = 30 * MS_DAY;
const MS_YEAR: i64 = 365 * MS_DAY;

/// 1969-12-28, the Sunday before the epoch
const FIRST_SUNDAY_MS: i64 = -4 * MS_DAY;

/// Runaway guard for pathological domains
const MAX_GENERATED_TICKS: usize = 1_000;

/// Finest calendar unit a timestamp is not aligned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Granularity {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Granularity {
    fn pattern(self) -> &'static str {
        match self {
            Granularity::Millisecond => "%S%.3f",
            Granularity::Second => "%H:%M:%S",
            Granularity::Minute | Granularity::Hour => "%H:%M",
            Granularity::Day => "%a %d",
            Granularity::Week => "%b %d",
            Granularity::Month => "%B",
            Granularity::Year => "%Y",
        }
    }
}

/// A labelled position on an axis
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// Domain value (seconds for time axes)
    pub value: f64,
    /// Pixel position along the axis
    pub px: f32,
    pub label: String,
}

#[derive(Debug, Clone, Copy)]
enum TickStep {
    Millis(i64),
    Weeks,
    Months(u32),
    Years(i64),
}

const TIME_STEPS: &[(TickStep, i64)] = &[
    (TickStep::Millis(MS_SECOND), MS_SECOND),
    (TickStep::Millis(5 * MS_SECOND), 5 * MS_SECOND),
    (TickStep::Millis(15 * MS_SECOND), 15 * MS_SECOND),
    (TickStep::Millis(30 * MS_SECOND), 30 * MS_SECOND),
    (TickStep::Millis(MS_MINUTE), MS_MINUTE),
    (TickStep::Millis(5 * MS_MINUTE), 5 * MS_MINUTE),
    (TickStep::Millis(15 * MS_MINUTE), 15 * MS_MINUTE),
    (TickStep::Millis(30 * MS_MINUTE), 30 * MS_MINUTE),
    (TickStep::Millis(MS_HOUR), MS_HOUR),
    (TickStep::Millis(3 * MS_HOUR), 3 * MS_HOUR),
    (TickStep::Millis(6 * MS_HOUR), 6 * MS_HOUR),
    (TickStep::Millis(12 * MS_HOUR), 12 * MS_HOUR),
    (TickStep::Millis(MS_DAY), MS_DAY),
    (TickStep::Millis(2 * MS_DAY), 2 * MS_DAY),
    (TickStep::Weeks, MS_WEEK),
    (TickStep::Months(1), MS_MONTH),
    (TickStep::Months(3), 3 * MS_MONTH),
    (TickStep::Years(1), MS_YEAR),
];

/// Produces tick positions and labels for time and value axes
#[derive(Debug, Clone, Copy)]
pub struct AxisFormatter {
    /// Timezone labels are rendered in
    offset: FixedOffset,
    min_pitch_px: f32,
}

impl Default for AxisFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl AxisFormatter {
    /// UTC labels, default pitch
    pub fn new() -> Self {
        Self {
            offset: Utc.fix(),
            min_pitch_px: DEFAULT_MIN_PITCH_PX,
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_min_pitch(mut self, px: f32) -> Self {
        self.min_pitch_px = px.max(0.0);
        self
    }

    pub fn min_pitch_px(&self) -> f32 {
        self.min_pitch_px
    }

    fn local(&self, ts: f64) -> Option<DateTime<FixedOffset>> {
        if !ts.is_finite() {
            return None;
        }
        self.offset
            .timestamp_millis_opt((ts * 1000.0).round() as i64)
            .single()
    }

    /// Granularity of a timestamp (seconds since the epoch)
    pub fn granularity(&self, ts: f64) -> Granularity {
        match self.local(ts) {
            Some(dt) => granularity_of(&dt),
            None => Granularity::Year,
        }
    }

    /// Label for a timestamp at its own granularity
    pub fn format(&self, ts: f64) -> String {
        match self.local(ts) {
            Some(dt) => dt.format(granularity_of(&dt).pattern()).to_string(),
            None => String::new(),
        }
    }

    /// Ticks for a time domain `(start, end)` in seconds over a pixel range
    pub fn time_ticks(&self, domain: (f64, f64), range: (f32, f32)) -> Vec<Tick> {
        let (lo, hi) = ordered(domain);
        if !(lo.is_finite() && hi.is_finite()) {
            return Vec::new();
        }
        if hi <= lo {
            return vec![Tick {
                value: lo,
                px: (range.0 + range.1) / 2.0,
                label: self.format(lo),
            }];
        }

        let lo_ms = (lo * 1000.0).ceil() as i64;
        let hi_ms = (hi * 1000.0).floor() as i64;
        let step = choose_time_step((hi - lo) * 1000.0);

        let ticks = self
            .time_tick_values(step, lo_ms, hi_ms)
            .into_iter()
            .map(|ms| {
                let value = ms as f64 / 1000.0;
                Tick {
                    value,
                    px: scale(value, (lo, hi), range),
                    label: self.format(value),
                }
            })
            .collect();
        thin_ticks(ticks, self.min_pitch_px)
    }

    /// Ticks for a numeric domain over a pixel range
    pub fn value_ticks(&self, domain: (f64, f64), range: (f32, f32)) -> Vec<Tick> {
        let (lo, hi) = ordered(domain);
        if !(lo.is_finite() && hi.is_finite()) {
            return Vec::new();
        }
        if hi <= lo {
            return vec![Tick {
                value: lo,
                px: (range.0 + range.1) / 2.0,
                label: format_value(lo, 1.0),
            }];
        }

        let step = nice_step((hi - lo) / TARGET_TICKS as f64);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        let ticks = (first..=last)
            .take(MAX_GENERATED_TICKS)
            .map(|i| {
                let value = i as f64 * step;
                Tick {
                    value,
                    px: scale(value, (lo, hi), range),
                    label: format_value(value, step),
                }
            })
            .collect();
        thin_ticks(ticks, self.min_pitch_px)
    }

    fn time_tick_values(&self, step: TickStep, lo_ms: i64, hi_ms: i64) -> Vec<i64> {
        let off_ms = self.offset.local_minus_utc() as i64 * MS_SECOND;
        let mut out = Vec::new();

        match step {
            TickStep::Millis(step_ms) => {
                let mut local = (lo_ms + off_ms).div_euclid(step_ms) * step_ms;
                if local < lo_ms + off_ms {
                    local += step_ms;
                }
                while local <= hi_ms + off_ms && out.len() < MAX_GENERATED_TICKS {
                    out.push(local - off_ms);
                    local += step_ms;
                }
            }
            TickStep::Weeks => {
                let from_sunday = lo_ms + off_ms - FIRST_SUNDAY_MS;
                let mut local = from_sunday.div_euclid(MS_WEEK) * MS_WEEK + FIRST_SUNDAY_MS;
                if local < lo_ms + off_ms {
                    local += MS_WEEK;
                }
                while local <= hi_ms + off_ms && out.len() < MAX_GENERATED_TICKS {
                    out.push(local - off_ms);
                    local += MS_WEEK;
                }
            }
            TickStep::Months(k) => {
                let Some(start) = self.local(lo_ms as f64 / 1000.0) else {
                    return out;
                };
                let k = k as i64;
                let mut month_index = start.year() as i64 * 12 + start.month0() as i64;
                month_index = month_index.div_euclid(k) * k;
                while out.len() < MAX_GENERATED_TICKS {
                    let Some(ms) = self.month_start_ms(month_index) else {
                        break;
                    };
                    if ms > hi_ms {
                        break;
                    }
                    if ms >= lo_ms {
                        out.push(ms);
                    }
                    month_index += k;
                }
            }
            TickStep::Years(k) => {
                let Some(start) = self.local(lo_ms as f64 / 1000.0) else {
                    return out;
                };
                let mut year = (start.year() as i64).div_euclid(k) * k;
                while out.len() < MAX_GENERATED_TICKS {
                    let Some(ms) = self.month_start_ms(year * 12) else {
                        break;
                    };
                    if ms > hi_ms {
                        break;
                    }
                    if ms >= lo_ms {
                        out.push(ms);
                    }
                    year += k;
                }
            }
        }
        out
    }

    /// UTC milliseconds of local midnight on the first of `year * 12 + month0`
    fn month_start_ms(&self, month_index: i64) -> Option<i64> {
        let year = i32::try_from(month_index.div_euclid(12)).ok()?;
        let month = month_index.rem_euclid(12) as u32 + 1;
        let naive = NaiveDate::from_ymd_opt(year, month, 1)?.and_hms_opt(0, 0, 0)?;
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.timestamp_millis())
    }
}

fn granularity_of(dt: &DateTime<FixedOffset>) -> Granularity {
    if dt.nanosecond() / 1_000_000 != 0 {
        Granularity::Millisecond
    } else if dt.second() != 0 {
        Granularity::Second
    } else if dt.minute() != 0 {
        Granularity::Minute
    } else if dt.hour() != 0 {
        Granularity::Hour
    } else if dt.day() != 1 {
        if dt.weekday() != Weekday::Sun {
            Granularity::Day
        } else {
            Granularity::Week
        }
    } else if dt.month() != 1 {
        Granularity::Month
    } else {
        Granularity::Year
    }
}

fn choose_time_step(span_ms: f64) -> TickStep {
    let target = span_ms / TARGET_TICKS as f64;
    let i = TIME_STEPS.partition_point(|&(_, approx)| (approx as f64) <= target);

    if i == TIME_STEPS.len() {
        let years = nice_step(target / MS_YEAR as f64).round().max(1.0);
        return TickStep::Years(years as i64);
    }
    if i == 0 {
        return TickStep::Millis(nice_step(target).round().max(1.0) as i64);
    }

    let (below, below_ms) = TIME_STEPS[i - 1];
    let (above, above_ms) = TIME_STEPS[i];
    if target / (below_ms as f64) < (above_ms as f64) / target {
        below
    } else {
        above
    }
}

/// 1, 2 or 5 times a power of ten, closest to `raw`
pub fn nice_step(raw: f64) -> f64 {
    if !(raw > 0.0) || !raw.is_finite() {
        return 1.0;
    }
    let base = 10f64.powf(raw.log10().floor());
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

/// Drop ticks until consecutive labels are at least `min_pitch` pixels apart
///
/// Works for ascending and descending pixel ranges.
pub fn thin_ticks(ticks: Vec<Tick>, min_pitch: f32) -> Vec<Tick> {
    if ticks.len() < 2 || min_pitch <= 0.0 {
        return ticks;
    }

    // keep a regular stride where possible, then enforce the pitch exactly
    let min_gap = ticks
        .windows(2)
        .map(|w| (w[1].px - w[0].px).abs())
        .fold(f32::INFINITY, f32::min);
    let stride = if min_gap > 0.0 && min_gap.is_finite() {
        ((min_pitch / min_gap).ceil() as usize).max(1)
    } else {
        1
    };

    let mut kept: Vec<Tick> = Vec::with_capacity(ticks.len() / stride + 1);
    for tick in ticks.into_iter().step_by(stride) {
        match kept.last() {
            Some(last) if (tick.px - last.px).abs() < min_pitch => {}
            _ => kept.push(tick),
        }
    }
    kept
}

fn scale(value: f64, domain: (f64, f64), range: (f32, f32)) -> f32 {
    let t = (value - domain.0) / (domain.1 - domain.0);
    range.0 + (t as f32) * (range.1 - range.0)
}

fn ordered(domain: (f64, f64)) -> (f64, f64) {
    if domain.0 <= domain.1 {
        domain
    } else {
        (domain.1, domain.0)
    }
}

fn format_value(value: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    // avoid "-0"
    let value = if value.abs() < step * 1e-9 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}
