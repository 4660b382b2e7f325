//! Comparison chart model.
//!
//! `render_chart` turns price tables into a backend-independent `ChartSpec`:
//! the series to draw (optionally rebased to 100 at their first observation),
//! their line style and color, and the fixed dark theme. The front end draws
//! it.

use crate::domain::{PriceTable, TimeSeries};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Blend toward `background` by `alpha` (1.0 = fully this color).
    pub fn over(self, background: Rgb, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8;
        Rgb::new(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
}

/// Default series color cycle for tables without an explicit palette.
pub const DEFAULT_CYCLE: [Rgb; 10] = [
    Rgb::new(0x1F, 0x77, 0xB4),
    Rgb::new(0xFF, 0x7F, 0x0E),
    Rgb::new(0x2C, 0xA0, 0x2C),
    Rgb::new(0xD6, 0x27, 0x28),
    Rgb::new(0x94, 0x67, 0xBD),
    Rgb::new(0x8C, 0x56, 0x4B),
    Rgb::new(0xE3, 0x77, 0xC2),
    Rgb::new(0x7F, 0x7F, 0x7F),
    Rgb::new(0xBC, 0xBD, 0x22),
    Rgb::new(0x17, 0xBE, 0xCF),
];

/// How every series of one table is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStyle {
    pub dash: LineDash,
    /// Explicit palette indexed by column position. Empty means the default
    /// cycle, advanced once per drawn series.
    pub palette: Vec<Rgb>,
    pub alpha: f64,
}

impl TableStyle {
    /// Instruments: solid lines on the default cycle.
    pub fn instruments() -> Self {
        Self {
            dash: LineDash::Solid,
            palette: Vec::new(),
            alpha: 1.0,
        }
    }

    /// Benchmarks: dashed white / cyan / gold, slightly translucent.
    pub fn benchmarks() -> Self {
        Self {
            dash: LineDash::Dashed,
            palette: vec![
                Rgb::new(0xFF, 0xFF, 0xFF),
                Rgb::new(0x00, 0xFF, 0xFF),
                Rgb::new(0xFF, 0xD7, 0x00),
            ],
            alpha: 0.7,
        }
    }
}

/// Fixed visual theme of the comparison chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartTheme {
    pub background: Rgb,
    pub text: Rgb,
    pub spine: Rgb,
    pub grid: Rgb,
    pub grid_dash: LineDash,
    pub grid_alpha: f64,
    pub labels_left: bool,
    pub labels_right: bool,
    pub legend_columns: usize,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            background: Rgb::new(0x0E, 0x11, 0x17),
            text: Rgb::new(0xFF, 0xFF, 0xFF),
            spine: Rgb::new(0x44, 0x44, 0x44),
            grid: Rgb::new(0x80, 0x80, 0x80),
            grid_dash: LineDash::Dotted,
            grid_alpha: 0.3,
            labels_left: true,
            labels_right: true,
            legend_columns: 3,
        }
    }
}

/// One line on the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, f64)>,
    pub dash: LineDash,
    pub color: Rgb,
    pub alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub series: Vec<PlotSeries>,
    pub normalized: bool,
    pub y_label: String,
    pub theme: ChartTheme,
}

impl ChartSpec {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Earliest and latest plotted date.
    pub fn x_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.series.iter().flat_map(|s| s.points.iter().map(|(d, _)| *d));
        let (min, max) = dates.fold((None, None), |(lo, hi): (Option<NaiveDate>, Option<NaiveDate>), d| {
            (
                Some(lo.map_or(d, |l| l.min(d))),
                Some(hi.map_or(d, |h| h.max(d))),
            )
        });
        Some((min?, max?))
    }

    /// Smallest and largest plotted value.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.series.iter().flat_map(|s| s.points.iter().map(|(_, v)| *v));
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Legend entries laid out row by row, `theme.legend_columns` per row.
    pub fn legend_rows(&self) -> Vec<&[PlotSeries]> {
        self.series.chunks(self.theme.legend_columns.max(1)).collect()
    }
}

/// Rebase a series so its first observation is 100.
///
/// `None` for an empty series or one whose first value is zero.
pub fn normalize(series: &TimeSeries) -> Option<TimeSeries> {
    let (_, base) = series.first()?;
    if base == 0.0 {
        return None;
    }
    Some(TimeSeries::new(
        series.label.clone(),
        series.points().iter().map(|(d, v)| (*d, v / base * 100.0)),
    ))
}

/// Build the chart for `tables`, each drawn with its own style.
///
/// Missing observations are dropped per series; series left with nothing to
/// draw are skipped.
pub fn render_chart(tables: &[(&PriceTable, TableStyle)], normalize_values: bool) -> ChartSpec {
    let mut series = Vec::new();
    let mut cycle = 0usize;

    for (table, style) in tables {
        for (i, raw) in table.all_series().into_iter().enumerate() {
            let plotted = if normalize_values {
                match normalize(&raw) {
                    Some(s) => s,
                    None => {
                        if !raw.is_empty() {
                            tracing::warn!(series = %raw.label, "first value is zero, cannot normalize");
                        }
                        continue;
                    }
                }
            } else if raw.is_empty() {
                continue;
            } else {
                raw
            };

            let color = if style.palette.is_empty() {
                let c = DEFAULT_CYCLE[cycle % DEFAULT_CYCLE.len()];
                cycle += 1;
                c
            } else {
                style.palette[i % style.palette.len()]
            };

            series.push(PlotSeries {
                points: plotted.points().to_vec(),
                label: plotted.label,
                dash: style.dash,
                color,
                alpha: style.alpha,
            });
        }
    }

    ChartSpec {
        series,
        normalized: normalize_values,
        y_label: if normalize_values {
            "Value (start = 100)".into()
        } else {
            "Price".into()
        },
        theme: ChartTheme::default(),
    }
}
