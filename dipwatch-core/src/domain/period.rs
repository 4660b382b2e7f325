//! Lookback period selection.
//!
//! Month and year offsets are calendar offsets: `2024-03-31 - 1 month` is
//! `2024-02-29` (clamped to the end of the shorter month), never a fixed
//! number of days.

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Closed set of lookback windows offered in the period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    FiveDays,
    OneMonth,
    SixMonths,
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl Default for Period {
    fn default() -> Self {
        Period::OneYear
    }
}

/// Concrete start/end pair for one render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::FiveDays,
        Period::OneMonth,
        Period::SixMonths,
        Period::OneYear,
        Period::ThreeYears,
        Period::FiveYears,
        Period::TenYears,
    ];

    /// Parse a selector label. Unrecognized labels fall back to ten years.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "5d" | "5日" => Period::FiveDays,
            "1mo" | "1ヶ月" => Period::OneMonth,
            "6mo" | "6ヶ月" => Period::SixMonths,
            "1y" | "1年" => Period::OneYear,
            "3y" | "3年" => Period::ThreeYears,
            "5y" | "5年" => Period::FiveYears,
            _ => Period::TenYears,
        }
    }

    /// Short code used on the command line and in persisted state.
    pub fn code(self) -> &'static str {
        match self {
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::ThreeYears => "3y",
            Period::FiveYears => "5y",
            Period::TenYears => "10y",
        }
    }

    /// Human-readable label for the selector.
    pub fn label(self) -> &'static str {
        match self {
            Period::FiveDays => "5 days",
            Period::OneMonth => "1 month",
            Period::SixMonths => "6 months",
            Period::OneYear => "1 year",
            Period::ThreeYears => "3 years",
            Period::FiveYears => "5 years",
            Period::TenYears => "10 years",
        }
    }

    /// `now` minus this period's offset.
    pub fn start_from(self, now: NaiveDateTime) -> NaiveDateTime {
        let months = match self {
            Period::FiveDays => return now - Duration::days(5),
            Period::OneMonth => 1,
            Period::SixMonths => 6,
            Period::OneYear => 12,
            Period::ThreeYears => 36,
            Period::FiveYears => 60,
            Period::TenYears => 120,
        };
        // Only fails past the representable range (year -262144).
        now.checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDateTime::MIN)
    }

    /// Resolve to a concrete window ending at `now`.
    pub fn resolve(self, now: NaiveDateTime) -> PeriodWindow {
        PeriodWindow {
            start: self.start_from(now),
            end: now,
        }
    }

    pub fn next(self) -> Period {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Period {
        let idx = Self::ALL.iter().position(|p| *p == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Resolve a free-form period label against `now`.
pub fn resolve(period_label: &str, now: NaiveDateTime) -> PeriodWindow {
    Period::from_label(period_label).resolve(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap()
    }

    #[test]
    fn five_days_is_exact_day_offset() {
        let w = Period::FiveDays.resolve(at(2024, 3, 4));
        assert_eq!(w.start, at(2024, 2, 28));
        assert_eq!(w.end, at(2024, 3, 4));
    }

    #[test]
    fn month_offset_clamps_to_month_end() {
        assert_eq!(Period::OneMonth.start_from(at(2024, 3, 31)), at(2024, 2, 29));
        assert_eq!(Period::SixMonths.start_from(at(2024, 8, 31)), at(2024, 2, 29));
    }

    #[test]
    fn year_offsets() {
        assert_eq!(Period::OneYear.start_from(at(2024, 2, 29)), at(2023, 2, 28));
        assert_eq!(Period::ThreeYears.start_from(at(2024, 6, 1)), at(2021, 6, 1));
        assert_eq!(Period::FiveYears.start_from(at(2024, 6, 1)), at(2019, 6, 1));
        assert_eq!(Period::TenYears.start_from(at(2024, 6, 1)), at(2014, 6, 1));
    }

    #[test]
    fn labels_parse_in_both_languages() {
        assert_eq!(Period::from_label("5日"), Period::FiveDays);
        assert_eq!(Period::from_label("1ヶ月"), Period::OneMonth);
        assert_eq!(Period::from_label("6mo"), Period::SixMonths);
        assert_eq!(Period::from_label("1年"), Period::OneYear);
        assert_eq!(Period::from_label(" 3y "), Period::ThreeYears);
        assert_eq!(Period::from_label("5年"), Period::FiveYears);
        assert_eq!(Period::from_label("10年"), Period::TenYears);
    }

    #[test]
    fn unknown_label_defaults_to_ten_years() {
        assert_eq!(Period::from_label("forever"), Period::TenYears);
        let now = at(2024, 6, 1);
        assert_eq!(resolve("", now).start, at(2014, 6, 1));
    }

    #[test]
    fn code_roundtrips_through_from_label() {
        for p in Period::ALL {
            assert_eq!(Period::from_label(p.code()), p);
        }
    }

    #[test]
    fn next_prev_cycle() {
        assert_eq!(Period::TenYears.next(), Period::FiveDays);
        assert_eq!(Period::FiveDays.prev(), Period::TenYears);
        assert_eq!(Period::OneYear.next().prev(), Period::OneYear);
    }
}
