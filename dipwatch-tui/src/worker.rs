//! Background worker thread: owns the `Dashboard` and runs the pipeline.
//!
//! Communication with the TUI main thread is via `mpsc` channels. One
//! `Render` command produces exactly one `View` response, tagged with the
//! request's sequence number so the UI can drop stale results.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use chrono::NaiveDateTime;

use dipwatch_core::data::CacheStats;
use dipwatch_core::{Dashboard, DashboardView, Selection};

/// Commands sent from the TUI to the worker.
#[derive(Debug)]
pub enum WorkerCommand {
    Render {
        seq: u64,
        selection: Selection,
        now: NaiveDateTime,
    },
    /// Forget cached fetches before the next render.
    ClearCache,
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    View {
        seq: u64,
        view: Box<DashboardView>,
        cache: CacheStats,
    },
    CacheCleared,
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    dashboard: Dashboard,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("dipwatch-worker".into())
        .spawn(move || worker_loop(dashboard, rx, tx))
}

fn worker_loop(mut dashboard: Dashboard, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(cmd) => {
                if let Some(resp) = handle_command(&mut dashboard, cmd) {
                    if tx.send(resp).is_err() {
                        break;
                    }
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}

fn handle_command(dashboard: &mut Dashboard, cmd: WorkerCommand) -> Option<WorkerResponse> {
    match cmd {
        WorkerCommand::Render { seq, selection, now } => {
            let view = dashboard.render(&selection, now);
            Some(WorkerResponse::View {
                seq,
                view: Box::new(view),
                cache: dashboard.cache_stats(),
            })
        }
        WorkerCommand::ClearCache => {
            dashboard.clear_cache();
            Some(WorkerResponse::CacheCleared)
        }
        WorkerCommand::Shutdown => None, // handled in loop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::offline_dashboard;
    use std::sync::mpsc;

    #[test]
    fn render_roundtrip_over_channels() {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let handle = spawn_worker(offline_dashboard(), cmd_rx, resp_tx).unwrap();

        let now = chrono::NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        cmd_tx
            .send(WorkerCommand::Render {
                seq: 7,
                selection: Selection::default(),
                now,
            })
            .unwrap();

        match resp_rx.recv().unwrap() {
            WorkerResponse::View { seq, view, .. } => {
                assert_eq!(seq, 7);
                assert!(view.chart.is_none());
            }
            other => panic!("unexpected response {other:?}"),
        }

        cmd_tx.send(WorkerCommand::ClearCache).unwrap();
        assert!(matches!(resp_rx.recv().unwrap(), WorkerResponse::CacheCleared));

        cmd_tx.send(WorkerCommand::Shutdown).unwrap();
        handle.join().unwrap();
    }
}
