//! Benchmark fund series from remote CSV exports.
//!
//! Each export is a small CSV: a one-line banner, a header row, then
//! `date,value,...` rows. Columns are addressed by position, so the header
//! row is only checked for width and every date cell must parse.

use super::cache::{CacheKey, FetchCache};
use super::decode::{decode_utf8_or_sjis, TextEncoding};
use super::provider::{DataError, HttpFetch};
use crate::config::BenchmarkDef;
use crate::domain::{PriceTable, TimeSeries};
use chrono::NaiveDate;
use std::sync::Arc;

/// Date layouts seen in fund exports, tried in order.
const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%Y年%m月%d日"];

/// Outcome of a multi-benchmark fetch. One failure never blanks the others.
#[derive(Debug, Default)]
pub struct BenchmarkFetch {
    /// One column per requested benchmark, in request order. A failed
    /// benchmark keeps its column with no observations.
    pub table: PriceTable,
    pub failures: Vec<(String, DataError)>,
}

/// Downloads and parses benchmark CSVs by name.
pub struct BenchmarkSeriesFetcher {
    http: Arc<dyn HttpFetch>,
    registry: Vec<BenchmarkDef>,
}

impl BenchmarkSeriesFetcher {
    pub fn new(http: Arc<dyn HttpFetch>, registry: Vec<BenchmarkDef>) -> Self {
        Self { http, registry }
    }

    pub fn names(&self) -> Vec<&str> {
        self.registry.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn url(&self, name: &str) -> Option<&str> {
        self.registry
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.url.as_str())
    }

    /// Fetch a single benchmark from `start` (inclusive).
    pub fn fetch_one(&self, name: &str, start: NaiveDate) -> Result<TimeSeries, DataError> {
        let url = self
            .url(name)
            .ok_or_else(|| DataError::InvalidRequest(format!("unknown benchmark: {name}")))?;
        let bytes = self.http.get_bytes(url)?;
        let (text, encoding) = decode_utf8_or_sjis(&bytes)?;
        if encoding == TextEncoding::ShiftJis {
            tracing::debug!(benchmark = name, "decoded export as Shift_JIS");
        }
        let series = parse_benchmark_csv(name, &text)?.since(start);
        tracing::debug!(benchmark = name, rows = series.len(), "parsed benchmark export");
        Ok(series)
    }

    /// Fetch every named benchmark independently through `cache` and join
    /// them by date. Each benchmark is its own cache entry, keyed by name,
    /// URL, start and `day`.
    pub fn fetch(
        &self,
        names: &[String],
        start: NaiveDate,
        cache: &mut FetchCache,
        day: NaiveDate,
    ) -> BenchmarkFetch {
        let mut failures = Vec::new();
        let mut series = Vec::with_capacity(names.len());
        for name in names {
            let key = CacheKey::new("benchmark", &(name, self.url(name).unwrap_or_default(), start), day);
            match cache.get_or_try_insert(key, || self.fetch_one(name, start).map(|s| vec![s])) {
                Ok(mut fetched) => {
                    series.push(fetched.pop().unwrap_or_else(|| TimeSeries::empty(name.as_str())))
                }
                Err(e) => {
                    tracing::warn!(benchmark = %name, error = %e, "benchmark fetch failed");
                    failures.push((name.clone(), e));
                    series.push(TimeSeries::empty(name.as_str()));
                }
            }
        }
        BenchmarkFetch {
            table: PriceTable::from_series(series),
            failures,
        }
    }
}

/// Parse a decoded export into a series labelled `name`.
///
/// Record 0 is a banner, record 1 the column headers (at least two), and
/// data starts at record 2: column 0 a date, column 1 the value. Blank
/// values are missing observations.
pub fn parse_benchmark_csv(name: &str, text: &str) -> Result<TimeSeries, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    records
        .next()
        .transpose()?
        .ok_or_else(|| DataError::Schema("empty export".into()))?;
    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| DataError::Schema("missing column header row".into()))?;
    if header.len() < 2 {
        return Err(DataError::Schema(format!(
            "expected at least 2 columns, header has {}",
            header.len()
        )));
    }

    let mut points = Vec::new();
    for (i, record) in records.enumerate() {
        let record = record?;
        let row = i + 3;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let date_cell = record.get(0).unwrap_or("");
        let date = parse_date(date_cell)
            .ok_or_else(|| DataError::Schema(format!("row {row}: unparseable date {date_cell:?}")))?;
        let value_cell = record.get(1).unwrap_or("");
        if let Some(value) = parse_value(value_cell)
            .map_err(|_| DataError::Schema(format!("row {row}: non-numeric value {value_cell:?}")))?
        {
            points.push((date, value));
        }
    }

    Ok(TimeSeries::new(name, points))
}

/// Parse a date cell, ignoring any trailing time component.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let head = cell
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or("");

    if head.len() == 8 && head.bytes().all(|b| b.is_ascii_digit()) {
        let y = head[0..4].parse().ok()?;
        let m = head[4..6].parse().ok()?;
        let d = head[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(head, fmt).ok())
}

/// `Ok(None)` for a blank cell; thousands separators are ignored.
fn parse_value(cell: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let cleaned: String = cell.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(None);
    }
    cleaned.parse().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::mock::MockHttp;
    use encoding_rs::SHIFT_JIS;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn def(name: &str, url: &str) -> BenchmarkDef {
        BenchmarkDef {
            name: name.into(),
            url: url.into(),
            default_on: false,
        }
    }

    const EXPORT: &str = "\
インデックスファンドS&P500,,
日付,基準価額(円),純資産総額(百万円)
2024/01/05,\"25,120\",1000
2024/01/04,25000,1000
2024/01/09,,1000
";

    #[test]
    fn parses_positional_columns_sorted() {
        let s = parse_benchmark_csv("S&P", EXPORT).unwrap();
        assert_eq!(s.label, "S&P");
        assert_eq!(s.points(), &[(d(2024, 1, 4), 25000.0), (d(2024, 1, 5), 25120.0)]);
    }

    #[test]
    fn narrow_header_is_schema_error() {
        let err = parse_benchmark_csv("X", "banner\ndate\n2024/01/04\n").unwrap_err();
        assert!(matches!(err, DataError::Schema(_)));
    }

    #[test]
    fn bad_date_is_schema_error() {
        let err = parse_benchmark_csv("X", "banner\na,b\nnot a date,1\n").unwrap_err();
        assert!(matches!(err, DataError::Schema(msg) if msg.contains("row 3")));
    }

    #[test]
    fn date_layouts() {
        assert_eq!(parse_date("2024/1/5"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024年01月05日"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("20240105"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05 00:00:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("2024-01-05T15:00:00"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date("05/01/2024x"), None);
    }

    #[test]
    fn shift_jis_export_is_decoded() {
        let (bytes, _, _) = SHIFT_JIS.encode("ＴＯＰＩＸ\n日付,基準価額\n2024/01/04,100\n");
        let http = MockHttp::default().with("http://t/topix", bytes.into_owned());
        let fetcher = BenchmarkSeriesFetcher::new(Arc::new(http), vec![def("TOPIX", "http://t/topix")]);
        let s = fetcher.fetch_one("TOPIX", d(2024, 1, 1)).unwrap();
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn fetch_one_filters_from_start() {
        let http = MockHttp::default().with("http://t/sp", EXPORT);
        let fetcher = BenchmarkSeriesFetcher::new(Arc::new(http), vec![def("S&P", "http://t/sp")]);
        let s = fetcher.fetch_one("S&P", d(2024, 1, 5)).unwrap();
        assert_eq!(s.points(), &[(d(2024, 1, 5), 25120.0)]);
    }

    #[test]
    fn one_failure_does_not_blank_the_rest() {
        let http = MockHttp::default()
            .with("http://t/a", "banner\nd,v\n2024/01/04,1\n")
            .with("http://t/bad", b"\xFF\xFE\xFD".to_vec());
        let fetcher = BenchmarkSeriesFetcher::new(
            Arc::new(http),
            vec![def("A", "http://t/a"), def("Bad", "http://t/bad"), def("Gone", "http://t/404")],
        );
        let names: Vec<String> = ["A", "Bad", "Gone", "Unknown"].map(String::from).to_vec();
        let mut cache = FetchCache::new();
        let out = fetcher.fetch(&names, d(2024, 1, 1), &mut cache, d(2024, 1, 10));

        assert_eq!(out.table.labels(), vec!["A", "Bad", "Gone", "Unknown"]);
        assert_eq!(out.table.series("A").unwrap().len(), 1);
        assert!(out.table.series("Bad").unwrap().is_empty());
        let failed: Vec<&str> = out.failures.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(failed, vec!["Bad", "Gone", "Unknown"]);
        assert!(matches!(out.failures[0].1, DataError::Undecodable));
        assert!(matches!(out.failures[1].1, DataError::HttpStatus { status: 404, .. }));
        assert!(matches!(out.failures[2].1, DataError::InvalidRequest(_)));
        // Only the success is remembered.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cached_benchmark_is_not_refetched() {
        let http = Arc::new(MockHttp::default().with("http://t/a", "b\nd,v\n2024/01/04,1\n"));
        let fetcher = BenchmarkSeriesFetcher::new(http.clone(), vec![def("A", "http://t/a")]);
        let mut cache = FetchCache::new();
        let names = vec!["A".to_string()];
        fetcher.fetch(&names, d(2024, 1, 1), &mut cache, d(2024, 1, 10));
        let out = fetcher.fetch(&names, d(2024, 1, 1), &mut cache, d(2024, 1, 10));
        assert_eq!(http.call_count(), 1);
        assert_eq!(out.table.series("A").unwrap().len(), 1);
    }

    #[test]
    fn disjoint_ranges_join_with_missing_values() {
        let http = MockHttp::default()
            .with("http://t/a", "b\nd,v\n2024/01/04,1\n2024/01/05,2\n")
            .with("http://t/b", "b\nd,v\n2024/02/01,10\n");
        let fetcher = BenchmarkSeriesFetcher::new(
            Arc::new(http),
            vec![def("A", "http://t/a"), def("B", "http://t/b")],
        );
        let names = ["A".to_string(), "B".to_string()];
        let out = fetcher.fetch(&names, d(2024, 1, 1), &mut FetchCache::new(), d(2024, 1, 10));
        assert!(out.failures.is_empty());
        assert_eq!(out.table.dates().len(), 3);
        assert_eq!(out.table.column("A").unwrap().values, vec![Some(1.0), Some(2.0), None]);
        assert_eq!(out.table.column("B").unwrap().values, vec![None, None, Some(10.0)]);
    }
}
