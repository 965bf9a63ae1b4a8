// src/services/layout.rs
//
// Everything about the chart that can be decided without a drawing surface:
// axis ranges, tick positions and labels, titles, legend text and where the
// right-hand annotations go.
use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::models::{EtfColor, FinalReturn, ReturnTable};

pub const DPI: u32 = 150;
pub const ADAPTIVE_LOWER: f64 = -25.0;
pub const ADAPTIVE_PADDING_DAYS: i64 = 45;
pub const TITLE: &str = "Porównanie ETF - 1 rok";

const MONTHS_PL: [&str; 12] = [
    "Sty", "Lut", "Mar", "Kwi", "Maj", "Cze", "Lip", "Sie", "Wrz", "Paź", "Lis", "Gru",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// Clamped y range with ticks every `step`, on the left axis.
    Fixed { min: f64, max: f64, step: f64 },
    /// Lower bound pinned at -25%, upper bound is the data max plus a margin.
    /// Ticks move to the right axis and final values get annotations.
    Adaptive { margin_fraction: f64 },
}

impl Default for ScaleMode {
    fn default() -> Self {
        ScaleMode::Fixed {
            min: -25.0,
            max: 40.0,
            step: 10.0,
        }
    }
}

impl ScaleMode {
    pub fn adaptive() -> Self {
        ScaleMode::Adaptive { margin_fraction: 0.15 }
    }

    pub fn is_adaptive(&self) -> bool {
        matches!(self, ScaleMode::Adaptive { .. })
    }

    pub fn y_range(&self, max_return: Option<f64>) -> (f64, f64) {
        match *self {
            ScaleMode::Fixed { min, max, .. } => (min, max),
            ScaleMode::Adaptive { margin_fraction } => {
                (ADAPTIVE_LOWER, adaptive_upper(max_return, margin_fraction))
            }
        }
    }

    pub fn y_ticks(&self, lo: f64, hi: f64) -> Vec<f64> {
        match *self {
            ScaleMode::Fixed { step, .. } => multiples_within(lo, hi, step, false),
            ScaleMode::Adaptive { .. } => multiples_within(lo, hi, nice_step(hi - lo, 8), true),
        }
    }

    /// Pixel size of the figure: 12x7 in (fixed) or 12x6 in (adaptive) at 150 DPI.
    pub fn figure_size(&self) -> (u32, u32) {
        match self {
            ScaleMode::Fixed { .. } => (12 * DPI, 7 * DPI),
            ScaleMode::Adaptive { .. } => (12 * DPI, 6 * DPI),
        }
    }
}

/// `max + (max - lower) * margin`, falling back to `lower + 10` whenever the
/// data cannot produce a usable range.
pub fn adaptive_upper(max_return: Option<f64>, margin_fraction: f64) -> f64 {
    let fallback = ADAPTIVE_LOWER + 10.0;
    let Some(max) = max_return.filter(|m| m.is_finite()) else {
        return fallback;
    };
    if max < ADAPTIVE_LOWER {
        return fallback;
    }
    let margin = (max - ADAPTIVE_LOWER) * margin_fraction;
    let upper = if margin.is_finite() { max + margin } else { max };
    if !upper.is_finite() || upper <= ADAPTIVE_LOWER {
        fallback
    } else {
        upper
    }
}

/// Step from the 1/2/5 x 10^k ladder giving roughly `target` intervals.
pub fn nice_step(span: f64, target: usize) -> f64 {
    if !span.is_finite() || span <= 0.0 || target == 0 {
        return 1.0;
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let factor = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    factor * magnitude
}

fn multiples_within(lo: f64, hi: f64, step: f64, inclusive: bool) -> Vec<f64> {
    if !(step > 0.0) || !(hi > lo) {
        return Vec::new();
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last)
        .map(|k| k as f64 * step)
        .filter(|v| inclusive || (*v > lo && *v < hi))
        .collect()
}

pub fn percent_label(value: f64) -> String {
    let rounded = value.round();
    // avoid "-0%"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.0}%", rounded)
}

/// Month-start ticks inside `[start, end]`. With `year_prefix`, January and
/// the first tick carry a two-digit year, e.g. `'26 Sty`.
pub fn month_ticks(start: NaiveDate, end: NaiveDate, year_prefix: bool) -> Vec<(NaiveDate, String)> {
    let mut ticks = Vec::new();
    let Some(mut tick) = NaiveDate::from_ymd_opt(start.year(), start.month(), 1) else {
        return ticks;
    };
    if tick < start {
        tick = next_month(tick);
    }
    while tick <= end {
        let abbr = MONTHS_PL[tick.month0() as usize];
        let label = if year_prefix && (tick.month() == 1 || ticks.is_empty()) {
            format!("'{:02} {}", tick.year().rem_euclid(100), abbr)
        } else {
            abbr.to_string()
        };
        ticks.push((tick, label));
        tick = next_month(tick);
    }
    ticks
}

fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

pub fn timestamp_label(now: DateTime<Tz>) -> String {
    now.format("%d %b %Y %H:%M %Z").to_string()
}

/// Closed vertical extent occupied by something drawn on the right axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub lo: f64,
    pub hi: f64,
}

impl Span {
    pub fn around(center: f64, half_height: f64, pad: f64) -> Self {
        Span {
            lo: center - half_height - pad,
            hi: center + half_height + pad,
        }
    }

    fn overlaps(&self, other: &Span) -> bool {
        self.lo < other.hi && other.lo < self.hi
    }
}

/// Picks vertical centers (in pixels) for labels of height `label_height`
/// wanting to sit at `desired`, staying inside `[min_y, max_y]` and clear of
/// `reserved` spans and each other. Results are in input order.
pub fn place_labels(desired: &[f64], label_height: f64, gap: f64, min_y: f64, max_y: f64, reserved: &[Span]) -> Vec<f64> {
    let half = label_height / 2.0;
    let min_allowed = min_y + half + gap;
    let max_allowed = max_y - half - gap;
    let step = label_height + gap;

    // Walk labels top to bottom so the first ones claim their spot.
    let mut order: Vec<usize> = (0..desired.len()).collect();
    order.sort_by(|a, b| desired[*a].total_cmp(&desired[*b]));

    let mut placed: Vec<Span> = Vec::with_capacity(desired.len());
    let mut result = vec![0.0; desired.len()];
    for idx in order {
        let want = desired[idx];
        let y = if min_allowed > max_allowed {
            want
        } else {
            let candidates = std::iter::once(want)
                .chain((1..=6).flat_map(|k| [want + k as f64 * step, want - k as f64 * step]));
            let mut chosen = None;
            for y in candidates {
                if y < min_allowed || y > max_allowed {
                    continue;
                }
                let span = Span::around(y, half, gap / 2.0);
                if !reserved.iter().any(|r| span.overlaps(r)) && !placed.iter().any(|p| span.overlaps(p)) {
                    chosen = Some(y);
                    break;
                }
            }
            chosen.unwrap_or_else(|| want.clamp(min_allowed, max_allowed))
        };
        placed.push(Span::around(y, half, gap / 2.0));
        result[idx] = y;
    }
    result
}

/// Splits `[from, to]` into `(start, end)` dash pairs.
pub fn dash_segments(from: f64, to: f64, dash: f64, spacing: f64) -> Vec<(f64, f64)> {
    let mut segments = Vec::new();
    if !(dash > 0.0) || spacing < 0.0 || !(to > from) {
        return segments;
    }
    let mut x = from;
    while x < to {
        segments.push((x, (x + dash).min(to)));
        x += dash + spacing;
    }
    segments
}

#[derive(Debug, Clone)]
pub struct SeriesLayout {
    pub label: String,
    pub color: EtfColor,
    /// x in days since the first date, y in percent
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub text: String,
    pub color: EtfColor,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Left,
    Right,
}

/// Drawing-surface independent description of the chart.
#[derive(Debug, Clone)]
pub struct ChartLayout {
    pub size: (u32, u32),
    pub title: String,
    pub timestamp: String,
    pub origin: NaiveDate,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub y_ticks: Vec<(f64, String)>,
    pub y_axis: AxisSide,
    pub y_caption: Option<String>,
    pub x_ticks: Vec<(f64, String)>,
    pub x_caption: String,
    pub series: Vec<SeriesLayout>,
    pub annotations: Vec<Annotation>,
}

impl ChartLayout {
    pub fn build(returns: &ReturnTable, finals: &[FinalReturn], mode: ScaleMode, max_return: Option<f64>, now: DateTime<Tz>) -> Self {
        let origin = returns.dates.first().copied().unwrap_or_else(|| now.date_naive());
        let last = returns.dates.last().copied().unwrap_or(origin);
        let offset = |d: NaiveDate| (d - origin).num_days() as f64;

        let (y_lo, y_hi) = mode.y_range(max_return);
        let y_ticks = mode
            .y_ticks(y_lo, y_hi)
            .into_iter()
            .map(|v| (v, percent_label(v)))
            .collect();

        let adaptive = mode.is_adaptive();
        let x_end = if adaptive {
            offset(last) + ADAPTIVE_PADDING_DAYS as f64
        } else {
            offset(last)
        };
        let x_ticks = month_ticks(origin, last, adaptive)
            .into_iter()
            .map(|(d, label)| (offset(d), label))
            .collect();

        let series = finals
            .iter()
            .filter_map(|fr| {
                let column = returns.column(&fr.ticker)?;
                let points = returns
                    .dates
                    .iter()
                    .zip(column)
                    .map(|(d, v)| (offset(*d), *v))
                    .collect();
                Some(SeriesLayout {
                    label: fr.legend_label(),
                    color: fr.color,
                    points,
                })
            })
            .collect();

        let annotations = if adaptive {
            finals
                .iter()
                .map(|fr| Annotation {
                    text: fr.annotation_label(),
                    color: fr.color,
                    value: fr.value,
                })
                .collect()
        } else {
            Vec::new()
        };

        ChartLayout {
            size: mode.figure_size(),
            title: TITLE.to_string(),
            timestamp: timestamp_label(now),
            origin,
            x_range: (0.0, x_end.max(1.0)),
            y_range: (y_lo, y_hi),
            y_ticks,
            y_axis: if adaptive { AxisSide::Right } else { AxisSide::Left },
            y_caption: if adaptive { None } else { Some("Poziom 0%".to_string()) },
            x_ticks,
            x_caption: if adaptive { "Interwał Miesięczny" } else { "Interwał Dzienny" }.to_string(),
            series,
            annotations,
        }
    }
}
