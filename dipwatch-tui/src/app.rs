//! Application state: single-owner, main-thread only.
//!
//! All TUI state lives here. The worker thread communicates via channels.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use dipwatch_core::data::CacheStats;
use dipwatch_core::domain::{Instrument, Period};
use dipwatch_core::{DashboardView, NoticeKind, Selection};

use crate::worker::{WorkerCommand, WorkerResponse};

const ERROR_HISTORY_CAP: usize = 50;

/// Which sidebar section has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    Instruments,
    Period,
    Benchmarks,
}

impl Focus {
    pub const ALL: [Focus; 3] = [Focus::Instruments, Focus::Period, Focus::Benchmarks];

    pub fn label(self) -> &'static str {
        match self {
            Focus::Instruments => "Instruments",
            Focus::Period => "Period",
            Focus::Benchmarks => "Benchmarks",
        }
    }

    pub fn next(self) -> Focus {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Focus {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// An entry in the error history overlay.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Selection,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Selection => "SEL",
            ErrorCategory::Other => "ERR",
        }
    }
}

impl From<NoticeKind> for ErrorCategory {
    fn from(kind: NoticeKind) -> Self {
        match kind {
            NoticeKind::PriceFetchFailure => ErrorCategory::Network,
            NoticeKind::BenchmarkParseFailure | NoticeKind::UniverseLoadFailure => {
                ErrorCategory::Data
            }
            NoticeKind::UnknownSelection => ErrorCategory::Selection,
        }
    }
}

/// Which overlay (if any) is shown on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    None,
    Help,
    ErrorHistory,
    Search,
}

/// Instrument list: the loaded universe, a search filter and a cursor.
#[derive(Debug)]
pub struct InstrumentListState {
    pub universe: Vec<Instrument>,
    pub query: String,
    /// Index into `visible()`.
    pub cursor: usize,
}

impl InstrumentListState {
    pub fn new(universe: Vec<Instrument>) -> Self {
        Self {
            universe,
            query: String::new(),
            cursor: 0,
        }
    }

    /// Instruments matching the search query, in universe order.
    pub fn visible(&self) -> Vec<&Instrument> {
        let q = self.query.trim().to_lowercase();
        self.universe
            .iter()
            .filter(|i| q.is_empty() || i.display_name().to_lowercase().contains(&q))
            .collect()
    }

    pub fn cursor_item(&self) -> Option<&Instrument> {
        self.visible().get(self.cursor).copied()
    }

    pub fn clamp_cursor(&mut self) {
        let len = self.visible().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    pub fn display_name(&self, code: &str) -> String {
        self.universe
            .iter()
            .find(|i| i.code == code)
            .map(Instrument::display_name)
            .unwrap_or_else(|| code.to_string())
    }
}

/// Top-level application state.
pub struct AppState {
    pub running: bool,
    pub focus: Focus,
    pub overlay: Overlay,

    /// What the user is looking at; sent to the worker on every change.
    pub selection: Selection,
    pub instruments: InstrumentListState,
    pub benchmark_names: Vec<String>,
    pub benchmark_cursor: usize,

    /// Latest view from the worker.
    pub view: Option<DashboardView>,
    pub cache: CacheStats,
    pub inverse_delta_colors: bool,
    pub tile_columns: usize,

    // Worker communication
    pub worker_tx: Sender<WorkerCommand>,
    pub worker_rx: Receiver<WorkerResponse>,
    pub request_seq: u64,
    pub pending_seq: Option<u64>,

    // Cross-cutting
    pub status_message: Option<(String, StatusLevel)>,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,

    pub state_path: PathBuf,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        worker_rx: Receiver<WorkerResponse>,
        universe: Vec<Instrument>,
        benchmark_names: Vec<String>,
        selection: Selection,
        state_path: PathBuf,
    ) -> Self {
        Self {
            running: true,
            focus: Focus::Instruments,
            overlay: Overlay::None,
            selection,
            instruments: InstrumentListState::new(universe),
            benchmark_names,
            benchmark_cursor: 0,
            view: None,
            cache: CacheStats::default(),
            inverse_delta_colors: true,
            tile_columns: 3,
            worker_tx,
            worker_rx,
            request_seq: 0,
            pending_seq: None,
            status_message: None,
            error_history: VecDeque::with_capacity(ERROR_HISTORY_CAP),
            error_scroll: 0,
            state_path,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_seq.is_some()
    }

    /// Ask the worker to render the current selection as of `now`.
    pub fn request_render(&mut self, now: NaiveDateTime) {
        self.request_seq += 1;
        let cmd = WorkerCommand::Render {
            seq: self.request_seq,
            selection: self.selection.clone(),
            now,
        };
        if self.worker_tx.send(cmd).is_ok() {
            self.pending_seq = Some(self.request_seq);
        } else {
            self.push_error(
                ErrorCategory::Other,
                "worker thread is not running".into(),
                String::new(),
            );
        }
    }

    /// Drop cached fetches, then re-render.
    pub fn refresh(&mut self, now: NaiveDateTime) {
        if self.worker_tx.send(WorkerCommand::ClearCache).is_ok() {
            self.set_status("Cache cleared, reloading");
        }
        self.request_render(now);
    }

    pub fn handle_response(&mut self, resp: WorkerResponse) {
        match resp {
            WorkerResponse::View { seq, view, cache } => {
                self.cache = cache;
                // A newer request is in flight; its view supersedes this one.
                if self.pending_seq.is_some_and(|p| p != seq) {
                    return;
                }
                self.pending_seq = None;
                // The universe notice repeats in every view; it is recorded
                // once at startup.
                let fresh: Vec<_> = view
                    .notices
                    .iter()
                    .filter(|n| n.kind != NoticeKind::UniverseLoadFailure)
                    .collect();
                for notice in &fresh {
                    self.push_error(
                        notice.kind.into(),
                        notice.message.clone(),
                        notice.context.clone().unwrap_or_default(),
                    );
                }
                if fresh.is_empty() {
                    self.set_status(format!("Updated: {}", view.period.label()));
                }
                self.view = Some(*view);
            }
            WorkerResponse::CacheCleared => {
                self.cache = CacheStats::default();
            }
        }
    }

    pub fn set_period(&mut self, period: Period, now: NaiveDateTime) {
        if self.selection.period != period {
            self.selection.period = period;
            self.request_render(now);
        }
    }

    pub fn toggle_normalize(&mut self, now: NaiveDateTime) {
        self.selection.normalize = !self.selection.normalize;
        self.request_render(now);
    }

    /// Toggle the instrument under the cursor.
    pub fn toggle_cursor_instrument(&mut self, now: NaiveDateTime) {
        if let Some(code) = self.instruments.cursor_item().map(|i| i.code.clone()) {
            self.selection.toggle_code(&code);
            self.request_render(now);
        }
    }

    /// Toggle the benchmark under the cursor.
    pub fn toggle_cursor_benchmark(&mut self, now: NaiveDateTime) {
        if let Some(name) = self.benchmark_names.get(self.benchmark_cursor).cloned() {
            self.selection.toggle_benchmark(&name);
            self.request_render(now);
        }
    }

    /// Push an error to the history, capping its length.
    pub fn push_error(&mut self, category: ErrorCategory, message: String, context: String) {
        let status = if context.is_empty() {
            message.clone()
        } else {
            format!("{context}: {message}")
        };
        self.error_history.push_front(ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message,
            context,
        });
        self.error_history.truncate(ERROR_HISTORY_CAP);
        self.status_message = Some((status, StatusLevel::Error));
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Info));
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = Some((msg.into(), StatusLevel::Warning));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use dipwatch_core::data::{DataError, HttpFetch, UniverseLoad, YahooProvider};
    use dipwatch_core::{Dashboard, DashboardConfig};

    use super::*;

    /// HTTP layer with no network at all.
    pub struct OfflineHttp;

    impl HttpFetch for OfflineHttp {
        fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError> {
            Err(DataError::NetworkUnreachable(format!("offline: {url}")))
        }
    }

    pub fn universe() -> Vec<Instrument> {
        vec![
            Instrument::new("8306", "三菱UFJ"),
            Instrument::new("1802", "大林組"),
            Instrument::new("6758", "ソニーグループ"),
        ]
    }

    pub fn offline_dashboard() -> Dashboard {
        let http = Arc::new(OfflineHttp);
        let universe = UniverseLoad {
            instruments: universe(),
            source: None,
            notice: None,
        };
        Dashboard::with_parts(
            DashboardConfig::default(),
            universe,
            Arc::new(YahooProvider::new(http.clone())),
            http,
        )
    }

    /// App wired to a channel pair whose worker end is returned, not spawned.
    pub fn app() -> (AppState, Receiver<WorkerCommand>, Sender<WorkerResponse>) {
        let (cmd_tx, cmd_rx) = std::sync::mpsc::channel();
        let (resp_tx, resp_rx) = std::sync::mpsc::channel();
        let app = AppState::new(
            cmd_tx,
            resp_rx,
            universe(),
            vec!["S&P".into(), "TOPIX".into()],
            Selection::default(),
            PathBuf::from("/nonexistent/state.json"),
        );
        (app, cmd_rx, resp_tx)
    }

    pub fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }
}
