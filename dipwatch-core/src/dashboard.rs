//! The dashboard pipeline.
//!
//! `Dashboard::render` is a plain function of a `Selection` and the current
//! time: resolve the period, fetch instrument closes and benchmark series
//! (through the session cache), then derive the chart, tiles and drawdowns.
//! No component failure escapes; each one becomes a `Notice` in the view.

use crate::analysis::{analyze, render_chart, summarize, ChartSpec, DrawdownResult, TableStyle, Tile, TileUnit};
use crate::config::DashboardConfig;
use crate::data::{
    BenchmarkSeriesFetcher, CacheStats, DataError, FetchCache, HttpFetch,
    PriceProvider, PriceSeriesFetcher, ReqwestFetcher, UniverseLoad, UniverseLoader,
    YahooProvider,
};
use crate::domain::{Instrument, Period, PeriodWindow, PriceTable};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// What the user has chosen to look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Instrument codes, in display order.
    pub codes: Vec<String>,
    pub period: Period,
    /// Benchmark names, in display order.
    pub benchmarks: Vec<String>,
    pub normalize: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            codes: Vec::new(),
            period: Period::default(),
            benchmarks: Vec::new(),
            normalize: true,
        }
    }
}

impl Selection {
    /// Nothing to fetch.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty() && self.benchmarks.is_empty()
    }

    /// Add `code` if absent, remove it otherwise.
    pub fn toggle_code(&mut self, code: &str) {
        toggle(&mut self.codes, code);
    }

    pub fn toggle_benchmark(&mut self, name: &str) {
        toggle(&mut self.benchmarks, name);
    }
}

fn toggle(list: &mut Vec<String>, item: &str) {
    if let Some(pos) = list.iter().position(|x| x == item) {
        list.remove(pos);
    } else {
        list.push(item.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    UniverseLoadFailure,
    PriceFetchFailure,
    BenchmarkParseFailure,
    UnknownSelection,
}

impl NoticeKind {
    pub fn label(self) -> &'static str {
        match self {
            NoticeKind::UniverseLoadFailure => "universe",
            NoticeKind::PriceFetchFailure => "prices",
            NoticeKind::BenchmarkParseFailure => "benchmark",
            NoticeKind::UnknownSelection => "selection",
        }
    }
}

/// A non-fatal problem surfaced to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// The benchmark name or code the notice is about, if any.
    pub context: Option<String>,
}

impl Notice {
    fn new(kind: NoticeKind, message: impl Into<String>, context: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "[{}] {ctx}: {}", self.kind.label(), self.message),
            None => write!(f, "[{}] {}", self.kind.label(), self.message),
        }
    }
}

/// Everything a front end needs to draw one dashboard state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub period: Period,
    pub window: PeriodWindow,
    /// `None` when nothing is plottable.
    pub chart: Option<ChartSpec>,
    pub instrument_tiles: Vec<Tile>,
    pub benchmark_tiles: Vec<Tile>,
    pub drawdowns: Vec<DrawdownResult>,
    pub notices: Vec<Notice>,
}

impl DashboardView {
    fn blank(period: Period, window: PeriodWindow) -> Self {
        Self {
            period,
            window,
            chart: None,
            instrument_tiles: Vec::new(),
            benchmark_tiles: Vec::new(),
            drawdowns: Vec::new(),
            notices: Vec::new(),
        }
    }
}

/// Session state behind the dashboard: config, universe, fetchers, cache.
pub struct Dashboard {
    config: DashboardConfig,
    universe: UniverseLoad,
    prices: PriceSeriesFetcher,
    benchmarks: BenchmarkSeriesFetcher,
    cache: FetchCache,
}

impl Dashboard {
    /// Live dashboard: reqwest for HTTP, Yahoo for prices, universe from the
    /// configured candidate paths.
    pub fn connect(config: DashboardConfig) -> Result<Self, DataError> {
        let http: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new(&config.http)?);
        let universe = UniverseLoader::new(config.universe_paths.clone()).load();
        let provider = Arc::new(YahooProvider::new(http.clone()));
        Ok(Self::with_parts(config, universe, provider, http))
    }

    /// Assemble from explicit parts.
    pub fn with_parts(
        config: DashboardConfig,
        universe: UniverseLoad,
        provider: Arc<dyn PriceProvider>,
        http: Arc<dyn HttpFetch>,
    ) -> Self {
        let prices = PriceSeriesFetcher::new(provider, config.market_suffix.clone());
        let benchmarks = BenchmarkSeriesFetcher::new(http, config.benchmarks.clone());
        Self {
            config,
            universe,
            prices,
            benchmarks,
            cache: FetchCache::new(),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn universe(&self) -> &UniverseLoad {
        &self.universe
    }

    /// Configured default codes that exist in the universe (exact code
    /// match, universe order), the default-on benchmarks, one year,
    /// normalized.
    pub fn default_selection(&self) -> Selection {
        let wanted: HashSet<&str> = self.config.default_codes.iter().map(String::as_str).collect();
        Selection {
            codes: self
                .universe
                .instruments
                .iter()
                .filter(|i| wanted.contains(i.code.as_str()))
                .map(|i| i.code.clone())
                .collect(),
            period: Period::default(),
            benchmarks: self.config.default_benchmarks(),
            normalize: true,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forget every cached fetch (session boundary).
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn render(&mut self, selection: &Selection, now: NaiveDateTime) -> DashboardView {
        let window = selection.period.resolve(now);
        let mut view = DashboardView::blank(selection.period, window);

        if let Some(msg) = &self.universe.notice {
            view.notices
                .push(Notice::new(NoticeKind::UniverseLoadFailure, msg.clone(), None));
        }
        if selection.is_empty() {
            return view;
        }

        let instruments = self.resolve_instruments(&selection.codes, &mut view.notices);
        let bench_names = self.resolve_benchmarks(&selection.benchmarks, &mut view.notices);

        let price_table = self.fetch_prices(&instruments, window, now, &mut view.notices);
        let bench_table = self.fetch_benchmarks(&bench_names, window, now, &mut view.notices);

        let chart = render_chart(
            &[
                (&price_table, TableStyle::instruments()),
                (&bench_table, TableStyle::benchmarks()),
            ],
            selection.normalize,
        );
        view.chart = (!chart.is_empty()).then_some(chart);

        let tiles = &self.config.tiles;
        view.instrument_tiles = summarize(&price_table, TileUnit::Yen, tiles.instrument_decimals);
        view.benchmark_tiles = summarize(&bench_table, TileUnit::Unitless, tiles.benchmark_decimals);

        let dd = &self.config.drawdown;
        view.drawdowns = analyze(&price_table, dd.window, dd.dip_threshold_pct);

        tracing::info!(
            period = selection.period.code(),
            instruments = instruments.len(),
            benchmarks = bench_names.len(),
            notices = view.notices.len(),
            "rendered dashboard"
        );
        view
    }

    fn resolve_instruments(&self, codes: &[String], notices: &mut Vec<Notice>) -> Vec<Instrument> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for code in codes {
            if !seen.insert(code.as_str()) {
                continue;
            }
            match self.universe.find(code) {
                Some(inst) => out.push(inst.clone()),
                None => notices.push(Notice::new(
                    NoticeKind::UnknownSelection,
                    "not in the instrument list",
                    Some(code.clone()),
                )),
            }
        }
        out
    }

    fn resolve_benchmarks(&self, names: &[String], notices: &mut Vec<Notice>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }
            if self.config.benchmark(name).is_some() {
                out.push(name.clone());
            } else {
                notices.push(Notice::new(
                    NoticeKind::UnknownSelection,
                    "unknown benchmark",
                    Some(name.clone()),
                ));
            }
        }
        out
    }

    fn fetch_prices(
        &mut self,
        instruments: &[Instrument],
        window: PeriodWindow,
        now: NaiveDateTime,
        notices: &mut Vec<Notice>,
    ) -> PriceTable {
        let fetched = self
            .prices
            .fetch(instruments, window.start, window.end, &mut self.cache, now.date());
        if let Some(e) = fetched.error {
            notices.push(Notice::new(NoticeKind::PriceFetchFailure, e.to_string(), None));
        }
        for code in fetched.missing {
            notices.push(Notice::new(
                NoticeKind::PriceFetchFailure,
                "no prices in the selected period",
                Some(code),
            ));
        }
        fetched.table
    }

    fn fetch_benchmarks(
        &mut self,
        names: &[String],
        window: PeriodWindow,
        now: NaiveDateTime,
        notices: &mut Vec<Notice>,
    ) -> PriceTable {
        if names.is_empty() {
            return PriceTable::empty();
        }
        let fetched = self
            .benchmarks
            .fetch(names, window.start.date(), &mut self.cache, now.date());
        for (name, e) in fetched.failures {
            notices.push(Notice::new(NoticeKind::BenchmarkParseFailure, e.to_string(), Some(name)));
        }
        fetched.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::provider::mock::MockHttp;
    use crate::data::yahoo::tests::chart_body;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn universe() -> UniverseLoad {
        UniverseLoad {
            instruments: vec![
                Instrument::new("8306", "MUFG"),
                Instrument::new("1802", "Obayashi"),
                Instrument::new("18020", "Not a default"),
            ],
            source: None,
            notice: None,
        }
    }

    fn config() -> DashboardConfig {
        let mut config = DashboardConfig::default();
        for b in &mut config.benchmarks {
            b.url = format!("http://bench/{}", b.name);
        }
        config
    }

    /// Dashboard whose HTTP mock serves MUFG closes and the S&P export.
    fn dashboard(period: Period) -> (Dashboard, Arc<MockHttp>) {
        let probe = YahooProvider::new(Arc::new(MockHttp::default()));
        let window = period.resolve(now());
        let http = Arc::new(
            MockHttp::default()
                .with(
                    &probe.chart_url("8306.T", window.start, window.end),
                    chart_body(&[Some(100.0), Some(120.0), Some(80.0)]),
                )
                .with("http://bench/S&P", "banner\ndate,nav\n2024/01/04,200\n2024/01/05,210\n"),
        );
        let provider = Arc::new(YahooProvider::new(http.clone()));
        let dash = Dashboard::with_parts(config(), universe(), provider, http.clone());
        (dash, http)
    }

    fn selection(codes: &[&str], benches: &[&str]) -> Selection {
        Selection {
            codes: codes.iter().map(|s| s.to_string()).collect(),
            period: Period::OneMonth,
            benchmarks: benches.iter().map(|s| s.to_string()).collect(),
            normalize: true,
        }
    }

    #[test]
    fn empty_selection_renders_nothing_and_fetches_nothing() {
        let (mut dash, http) = dashboard(Period::OneMonth);
        let view = dash.render(&Selection::default(), now());
        assert!(view.chart.is_none());
        assert!(view.instrument_tiles.is_empty());
        assert!(view.benchmark_tiles.is_empty());
        assert!(view.drawdowns.is_empty());
        assert!(view.notices.is_empty());
        assert_eq!(http.call_count(), 0);
    }

    #[test]
    fn full_render() {
        let (mut dash, _) = dashboard(Period::OneMonth);
        let view = dash.render(&selection(&["8306"], &["S&P"]), now());

        let chart = view.chart.expect("chart");
        let labels: Vec<&str> = chart.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["8306 MUFG", "S&P"]);
        assert_eq!(chart.series[0].points[0].1, 100.0);

        assert_eq!(view.instrument_tiles[0].value_text(), "80円");
        assert_eq!(view.benchmark_tiles[0].value_text(), "210.0");
        assert_eq!(view.drawdowns.len(), 1);
        assert!(view.notices.is_empty());
    }

    #[test]
    fn repeated_render_hits_cache() {
        let (mut dash, http) = dashboard(Period::OneMonth);
        let sel = selection(&["8306"], &["S&P"]);
        dash.render(&sel, now());
        let calls = http.call_count();
        dash.render(&sel, now());
        assert_eq!(http.call_count(), calls);
        assert_eq!(dash.cache_stats().hits, 2);

        dash.clear_cache();
        dash.render(&sel, now());
        assert_eq!(http.call_count(), calls * 2);
    }

    #[test]
    fn failures_become_notices() {
        let (mut dash, _) = dashboard(Period::OneMonth);
        // TOPIX has no mocked export; 9999 is not listed.
        let view = dash.render(&selection(&["8306", "9999"], &["S&P", "TOPIX", "Nope"]), now());

        let kinds: Vec<(NoticeKind, Option<&str>)> = view
            .notices
            .iter()
            .map(|n| (n.kind, n.context.as_deref()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (NoticeKind::UnknownSelection, Some("9999")),
                (NoticeKind::UnknownSelection, Some("Nope")),
                (NoticeKind::BenchmarkParseFailure, Some("TOPIX")),
            ]
        );
        // S&P survives the TOPIX failure.
        assert_eq!(view.benchmark_tiles.len(), 1);
        assert_eq!(view.chart.unwrap().series.len(), 2);
    }

    #[test]
    fn price_failure_keeps_benchmarks() {
        // 1802 has no mocked chart response, so Yahoo answers 404.
        let (mut dash, _) = dashboard(Period::OneMonth);
        let view = dash.render(&selection(&["1802"], &["S&P"]), now());
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, NoticeKind::PriceFetchFailure);
        assert_eq!(view.notices[0].context.as_deref(), Some("1802"));
        assert!(view.instrument_tiles.is_empty());
        assert!(view.drawdowns.is_empty());
        assert_eq!(view.benchmark_tiles.len(), 1);
    }

    #[test]
    fn unknown_symbol_only_loses_its_own_series() {
        let (mut dash, _) = dashboard(Period::OneMonth);
        let view = dash.render(&selection(&["8306", "1802"], &[]), now());

        assert_eq!(view.instrument_tiles.len(), 1);
        assert_eq!(view.instrument_tiles[0].label, "8306 MUFG");
        assert_eq!(view.drawdowns.len(), 1);
        let chart = view.chart.expect("MUFG still plotted");
        assert_eq!(chart.series.len(), 1);
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].kind, NoticeKind::PriceFetchFailure);
        assert_eq!(view.notices[0].context.as_deref(), Some("1802"));
    }

    #[test]
    fn default_selection_matches_codes_exactly() {
        let (dash, _) = dashboard(Period::OneYear);
        let sel = dash.default_selection();
        assert_eq!(sel.codes, vec!["8306", "1802"]);
        assert_eq!(sel.benchmarks, vec!["S&P"]);
        assert_eq!(sel.period, Period::OneYear);
        assert!(sel.normalize);
    }

    #[test]
    fn universe_notice_is_carried() {
        let mut u = universe();
        u.notice = Some("instrument list not found".into());
        let http: Arc<MockHttp> = Arc::new(MockHttp::default());
        let provider = Arc::new(YahooProvider::new(http.clone()));
        let mut dash = Dashboard::with_parts(config(), u, provider, http);
        let view = dash.render(&Selection::default(), now());
        assert_eq!(view.notices[0].kind, NoticeKind::UniverseLoadFailure);
    }

    #[test]
    fn toggles() {
        let mut sel = Selection::default();
        sel.toggle_code("8306");
        sel.toggle_code("1802");
        sel.toggle_code("8306");
        assert_eq!(sel.codes, vec!["1802"]);
        sel.toggle_benchmark("S&P");
        assert!(!sel.is_empty());
    }
}
