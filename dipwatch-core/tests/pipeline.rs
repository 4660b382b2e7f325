//! End-to-end pipeline tests over an in-memory HTTP layer.
//!
//! Universe file on disk (Shift_JIS) → Yahoo chart JSON → fund CSV exports
//! → chart, tiles, drawdowns and notices.

use chrono::{NaiveDate, NaiveDateTime};
use dipwatch_core::analysis::{DipCategory, LineDash};
use dipwatch_core::data::{DataError, HttpFetch, UniverseLoader, YahooProvider};
use dipwatch_core::domain::Period;
use dipwatch_core::{Dashboard, DashboardConfig, NoticeKind, Selection};
use encoding_rs::SHIFT_JIS;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeHttp {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeHttp {
    fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.bodies.insert(url.to_string(), body.into());
        self
    }
}

impl HttpFetch for FakeHttp {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| DataError::NetworkUnreachable(format!("no route to {url}")))
    }
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 12)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

/// Chart JSON for consecutive Tokyo sessions from 2024-01-04.
fn chart_json(closes: &[f64]) -> String {
    let base = 1_704_326_400i64;
    let ts: Vec<String> = (0..closes.len())
        .map(|i| (base + i as i64 * 86_400).to_string())
        .collect();
    let vals: Vec<String> = closes.iter().map(|c| c.to_string()).collect();
    format!(
        r#"{{"chart":{{"result":[{{"meta":{{"gmtoffset":32400}},"timestamp":[{}],"indicators":{{"quote":[{{"close":[{}]}}]}}}}],"error":null}}}}"#,
        ts.join(","),
        vals.join(",")
    )
}

fn sjis(text: &str) -> Vec<u8> {
    SHIFT_JIS.encode(text).0.into_owned()
}

struct Fixture {
    dashboard: Dashboard,
    http: Arc<FakeHttp>,
    _universe_file: tempfile::NamedTempFile,
}

fn fixture(period: Period) -> Fixture {
    let mut universe_file = tempfile::NamedTempFile::new().unwrap();
    universe_file
        .write_all(&sjis("日付,コード,銘柄名\n20240101,8306,三菱UFJ\n20240101,1802,大林組\n"))
        .unwrap();

    let mut config = DashboardConfig::default();
    config.universe_paths = vec![universe_file.path().to_path_buf()];
    for b in &mut config.benchmarks {
        b.url = format!("https://funds.test/{}", b.name);
    }

    let window = period.resolve(now());
    let probe = YahooProvider::new(Arc::new(FakeHttp::default()));
    let http = Arc::new(
        FakeHttp::default()
            .with(
                &probe.chart_url("8306.T", window.start, window.end),
                chart_json(&[1200.0, 1250.0, 1180.0, 1100.0]),
            )
            .with(
                &probe.chart_url("1802.T", window.start, window.end),
                chart_json(&[1500.0, 1510.0, 1520.0, 1530.0]),
            )
            .with(
                "https://funds.test/S&P",
                "インデックスファンドS&P500\n日付,基準価額\n2024/01/04,\"30,000\"\n2024/01/05,30300\n",
            )
            .with(
                "https://funds.test/TOPIX",
                sjis("ＴＯＰＩＸ\n日付,基準価額\n2024年01月04日,15000\n2024年01月05日,14850\n"),
            )
            .with("https://funds.test/Gold", b"\x81\xFF\xFE".to_vec()),
    );

    let universe = UniverseLoader::new(config.universe_paths.clone()).load();
    let provider = Arc::new(YahooProvider::new(http.clone()));
    let dashboard = Dashboard::with_parts(config, universe, provider, http.clone());
    Fixture {
        dashboard,
        http,
        _universe_file: universe_file,
    }
}

#[test]
fn universe_display_names_from_shift_jis_file() {
    let f = fixture(Period::OneMonth);
    let names: Vec<String> = f
        .dashboard
        .universe()
        .instruments
        .iter()
        .map(|i| i.display_name())
        .collect();
    assert_eq!(names, vec!["8306 三菱UFJ", "1802 大林組"]);
    assert!(f.dashboard.universe().notice.is_none());
}

#[test]
fn default_selection_renders_everything() {
    let mut f = fixture(Period::OneYear);
    let selection = f.dashboard.default_selection();
    assert_eq!(selection.codes, vec!["8306", "1802"]);
    assert_eq!(selection.benchmarks, vec!["S&P"]);

    let view = f.dashboard.render(&selection, now());
    assert!(view.notices.is_empty(), "{:?}", view.notices);

    let chart = view.chart.expect("chart");
    assert!(chart.normalized);
    assert_eq!(chart.series.len(), 3);
    assert!(chart.series.iter().all(|s| s.points[0].1 == 100.0));
    assert_eq!(chart.series[2].dash, LineDash::Dashed);

    let titles: Vec<String> = view.instrument_tiles.iter().map(|t| t.title()).collect();
    assert_eq!(titles, vec!["8306 三菱UFJ (01/07)", "1802 大林組 (01/07)"]);
    assert_eq!(view.instrument_tiles[0].delta_text(), "-80円 (-6.78%)");
    assert_eq!(view.benchmark_tiles[0].value_text(), "30,300.0");

    // 1250 high, 1100 now: -12% is a dip; 1802 is at its high.
    assert_eq!(view.drawdowns.len(), 2);
    assert_eq!(view.drawdowns[0].category, DipCategory::Dip);
    assert_eq!(view.drawdowns[1].category, DipCategory::Normal);
}

#[test]
fn raw_prices_when_not_normalized() {
    let mut f = fixture(Period::OneMonth);
    let selection = Selection {
        codes: vec!["8306".into()],
        period: Period::OneMonth,
        benchmarks: vec!["TOPIX".into()],
        normalize: false,
    };
    let view = f.dashboard.render(&selection, now());
    let chart = view.chart.expect("chart");
    assert_eq!(chart.y_label, "Price");
    assert_eq!(chart.series[0].points.last().unwrap().1, 1100.0);
    assert_eq!(chart.series[1].label, "TOPIX");
    assert_eq!(chart.series[1].points.len(), 2);
}

#[test]
fn undecodable_benchmark_only_loses_itself() {
    let mut f = fixture(Period::OneMonth);
    let selection = Selection {
        codes: vec![],
        period: Period::OneMonth,
        benchmarks: vec!["S&P".into(), "Gold".into(), "TOPIX".into()],
        normalize: true,
    };
    let view = f.dashboard.render(&selection, now());

    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].kind, NoticeKind::BenchmarkParseFailure);
    assert_eq!(view.notices[0].context.as_deref(), Some("Gold"));

    let tiles: Vec<&str> = view.benchmark_tiles.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(tiles, vec!["S&P", "TOPIX"]);
    assert!(view.instrument_tiles.is_empty());
    assert!(view.drawdowns.is_empty());
}

#[test]
fn nothing_selected_means_no_network() {
    let mut f = fixture(Period::OneMonth);
    let view = f.dashboard.render(&Selection::default(), now());
    assert!(view.chart.is_none());
    assert!(view.instrument_tiles.is_empty() && view.benchmark_tiles.is_empty());
    assert!(view.notices.is_empty());
    assert_eq!(f.http.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn network_failure_degrades_to_notice() {
    let selection = Selection {
        codes: vec!["8306".into()],
        period: Period::FiveYears,
        benchmarks: vec!["S&P".into()],
        normalize: true,
    };

    // Chart responses are only registered for the one-month window.
    let mut f = fixture(Period::OneMonth);
    let view = f.dashboard.render(&selection, now());
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].kind, NoticeKind::PriceFetchFailure);
    assert!(view.instrument_tiles.is_empty());
    assert_eq!(view.chart.expect("benchmarks still plotted").series.len(), 1);

    let mut f = fixture(Period::FiveYears);
    let view = f.dashboard.render(&selection, now());
    assert!(view.notices.is_empty());
    assert_eq!(view.instrument_tiles.len(), 1);
}
