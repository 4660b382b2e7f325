//! Latest-close summary tiles.

use crate::domain::PriceTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileUnit {
    /// Instrument prices, shown with a yen suffix.
    Yen,
    /// Benchmark index levels, shown without a unit.
    Unitless,
}

impl TileUnit {
    pub fn suffix(self) -> &'static str {
        match self {
            TileUnit::Yen => "円",
            TileUnit::Unitless => "",
        }
    }
}

/// Direction of the day-over-day change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// Latest value of one series against the previous observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub label: String,
    pub date: NaiveDate,
    pub latest: f64,
    pub prev: f64,
    pub change: f64,
    /// `None` when the previous value is zero.
    pub pct: Option<f64>,
    pub unit: TileUnit,
    pub decimals: usize,
}

impl Tile {
    /// Month/day of the latest observation, e.g. `03/15`.
    pub fn date_label(&self) -> String {
        self.date.format("%m/%d").to_string()
    }

    /// `label (MM/DD)`
    pub fn title(&self) -> String {
        format!("{} ({})", self.label, self.date_label())
    }

    /// e.g. `1,234円`
    pub fn value_text(&self) -> String {
        format!("{}{}", format_grouped(self.latest, self.decimals), self.unit.suffix())
    }

    /// e.g. `+12円 (+0.98%)`
    pub fn delta_text(&self) -> String {
        let sign = if self.change > 0.0 { "+" } else { "" };
        let change = format!("{sign}{}{}", format_grouped(self.change, self.decimals), self.unit.suffix());
        match self.pct {
            Some(p) => format!("{change} ({p:+.2}%)"),
            None => format!("{change} (n/a)"),
        }
    }

    pub fn trend(&self) -> Trend {
        if self.change > 0.0 {
            Trend::Up
        } else if self.change < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// One tile per series with at least two observations, in column order.
pub fn summarize(table: &PriceTable, unit: TileUnit, decimals: usize) -> Vec<Tile> {
    table
        .all_series()
        .into_iter()
        .filter_map(|s| {
            let pts = s.points();
            let [.., (_, prev), (date, latest)] = pts else {
                return None;
            };
            let change = latest - prev;
            let pct = (*prev != 0.0).then(|| change / prev * 100.0);
            Some(Tile {
                label: s.label.clone(),
                date: *date,
                latest: *latest,
                prev: *prev,
                change,
                pct,
                unit,
                decimals,
            })
        })
        .collect()
}

/// Format with `,` thousands separators and fixed decimals.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Rounded-to-zero negatives print without a sign.
    let is_zero = text.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
