//! Date-keyed price series and date-aligned price tables.
//!
//! A `PriceTable` is the outer join of several series on the union of their
//! dates. Dates a series does not cover hold `None` (no forward-fill).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered (date, value) observations under one label.
///
/// Invariant: dates strictly increasing, all values finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSeries")]
pub struct TimeSeries {
    pub label: String,
    points: Vec<(NaiveDate, f64)>,
}

/// Wire shape of a `TimeSeries`; deserialized points go through `new`.
#[derive(Deserialize)]
struct RawSeries {
    label: String,
    points: Vec<(NaiveDate, f64)>,
}

impl From<RawSeries> for TimeSeries {
    fn from(raw: RawSeries) -> Self {
        TimeSeries::new(raw.label, raw.points)
    }
}

impl TimeSeries {
    /// Build a series from unordered points. Sorts by date, keeps the last
    /// value for a repeated date and drops non-finite values.
    pub fn new(label: impl Into<String>, points: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        let by_date: BTreeMap<NaiveDate, f64> = points
            .into_iter()
            .filter(|(_, v)| v.is_finite())
            .collect();
        Self {
            label: label.into(),
            points: by_date.into_iter().collect(),
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            points: Vec::new(),
        }
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        self.points.last().copied()
    }

    /// Keep only observations dated on or after `start`.
    pub fn since(mut self, start: NaiveDate) -> Self {
        self.points.retain(|(d, _)| *d >= start);
        self
    }

    /// Same observations under a different label.
    pub fn relabeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The trailing `n` observations (all of them if fewer exist).
    pub fn tail(&self, n: usize) -> &[(NaiveDate, f64)] {
        let skip = self.points.len().saturating_sub(n);
        &self.points[skip..]
    }
}

/// One labelled column of a `PriceTable`, aligned to the table's date axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// Series joined on a shared, ascending date axis.
///
/// Created fresh per fetch and not mutated afterwards. Column order is the
/// order the series were supplied in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl PriceTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Outer-join series by date. Series with no overlapping dates simply
    /// contribute `None` on the other series' dates.
    pub fn from_series(series: Vec<TimeSeries>) -> Self {
        let all_dates: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(d, _)| *d))
            .collect();
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();

        let columns = series
            .into_iter()
            .map(|s| {
                let lookup: BTreeMap<NaiveDate, f64> = s.points.into_iter().collect();
                let values = dates.iter().map(|d| lookup.get(d).copied()).collect();
                Column {
                    label: s.label,
                    values,
                }
            })
            .collect();

        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }

    /// True when the table has no columns or no dates.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.dates.is_empty()
    }

    pub fn column(&self, label: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// A column with its missing observations dropped.
    pub fn series(&self, label: &str) -> Option<TimeSeries> {
        self.column(label).map(|c| self.column_series(c))
    }

    /// Every column as a `TimeSeries`, in column order, missing values dropped.
    pub fn all_series(&self) -> Vec<TimeSeries> {
        self.columns.iter().map(|c| self.column_series(c)).collect()
    }

    fn column_series(&self, column: &Column) -> TimeSeries {
        let points: Vec<(NaiveDate, f64)> = self
            .dates
            .iter()
            .zip(column.values.iter())
            .filter_map(|(d, v)| v.map(|v| (*d, v)))
            .collect();
        TimeSeries {
            label: column.label.clone(),
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn deserialized_series_is_sorted_and_deduplicated() {
        let json = r#"{"label":"X","points":[["2024-01-05",3.0],["2024-01-03",1.0],["2024-01-05",4.0]]}"#;
        let s: TimeSeries = serde_json::from_str(json).unwrap();
        assert_eq!(s.points(), &[(d("2024-01-03"), 1.0), (d("2024-01-05"), 4.0)]);

        let back: TimeSeries = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn series_sorts_and_dedups() {
        let s = TimeSeries::new(
            "X",
            vec![
                (d("2024-01-03"), 3.0),
                (d("2024-01-01"), 1.0),
                (d("2024-01-03"), 4.0),
                (d("2024-01-02"), f64::NAN),
            ],
        );
        assert_eq!(s.points(), &[(d("2024-01-01"), 1.0), (d("2024-01-03"), 4.0)]);
    }

    #[test]
    fn since_filters_inclusive() {
        let s = TimeSeries::new(
            "X",
            vec![(d("2024-01-01"), 1.0), (d("2024-01-02"), 2.0), (d("2024-01-03"), 3.0)],
        )
        .since(d("2024-01-02"));
        assert_eq!(s.len(), 2);
        assert_eq!(s.first(), Some((d("2024-01-02"), 2.0)));
    }

    #[test]
    fn tail_shorter_than_window_returns_all() {
        let s = TimeSeries::new("X", vec![(d("2024-01-01"), 1.0), (d("2024-01-02"), 2.0)]);
        assert_eq!(s.tail(20).len(), 2);
        assert_eq!(s.tail(1), &[(d("2024-01-02"), 2.0)]);
    }

    #[test]
    fn join_fills_missing_with_none() {
        let a = TimeSeries::new(
            "A",
            vec![(d("2024-01-02"), 100.0), (d("2024-01-03"), 101.0), (d("2024-01-04"), 102.0)],
        );
        let b = TimeSeries::new("B", vec![(d("2024-01-02"), 200.0), (d("2024-01-04"), 202.0)]);

        let table = PriceTable::from_series(vec![a, b]);
        assert_eq!(table.dates().len(), 3);
        assert_eq!(table.labels(), vec!["A", "B"]);
        assert_eq!(table.column("A").unwrap().values[1], Some(101.0));
        assert_eq!(table.column("B").unwrap().values[1], None);
        assert_eq!(table.series("B").unwrap().len(), 2);
    }

    #[test]
    fn disjoint_series_keep_their_own_ranges() {
        let a = TimeSeries::new("A", vec![(d("2024-01-01"), 1.0), (d("2024-01-02"), 2.0)]);
        let b = TimeSeries::new("B", vec![(d("2024-02-01"), 3.0)]);
        let table = PriceTable::from_series(vec![a, b]);

        assert_eq!(table.dates().len(), 3);
        assert_eq!(table.column("A").unwrap().values, vec![Some(1.0), Some(2.0), None]);
        assert_eq!(table.column("B").unwrap().values, vec![None, None, Some(3.0)]);
    }

    #[test]
    fn empty_series_yields_all_none_column() {
        let a = TimeSeries::new("A", vec![(d("2024-01-01"), 1.0)]);
        let table = PriceTable::from_series(vec![a, TimeSeries::empty("B")]);
        assert_eq!(table.column("B").unwrap().values, vec![None]);
        assert!(table.series("B").unwrap().is_empty());
        assert!(!table.is_empty());
    }

    #[test]
    fn empty_table() {
        let t = PriceTable::empty();
        assert!(t.is_empty());
        assert!(t.series("A").is_none());
        assert!(PriceTable::from_series(vec![]).is_empty());
    }
}
