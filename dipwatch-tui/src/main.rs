//! Dipwatch TUI: price comparison and buy-the-dip dashboard in the terminal.

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use dipwatch_core::{Dashboard, DashboardConfig};
use dipwatch_tui::worker::{self, WorkerCommand};
use dipwatch_tui::app::ErrorCategory;
use dipwatch_tui::{input, logging, persistence, ui, AppState};

#[derive(Parser)]
#[command(name = "dipwatch", about = "Dipwatch: Japanese equities vs. benchmarks in the terminal")]
struct Args {
    /// Path to a TOML config file. Defaults to <config_dir>/dipwatch/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let log_path = logging::init()?;
    tracing::info!(log = %log_path.display(), "dipwatch starting");

    let config = DashboardConfig::load_or_default(args.config.as_deref()).context("loading config")?;
    let dashboard = Dashboard::connect(config.clone()).context("building HTTP client")?;

    let universe = dashboard.universe().clone();
    let benchmark_names: Vec<String> = config.benchmarks.iter().map(|b| b.name.clone()).collect();

    let state_path = persistence::default_path();
    let persisted = persistence::load(&state_path);
    let selection = match &persisted {
        Some(p) => p.selection(),
        None => dashboard.default_selection(),
    };

    // Worker channels
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let worker_handle =
        worker::spawn_worker(dashboard, cmd_rx, resp_tx).context("spawning worker thread")?;

    let mut app = AppState::new(
        cmd_tx.clone(),
        resp_rx,
        universe.instruments,
        benchmark_names,
        selection,
        state_path.clone(),
    );
    app.inverse_delta_colors = config.tiles.inverse_delta_colors;
    app.tile_columns = config.tiles.columns;
    if let Some(p) = persisted {
        app.focus = p.focus;
    }
    if let Some(notice) = universe.notice {
        app.push_error(ErrorCategory::Data, notice.clone(), "instrument list".into());
        app.set_warning(notice);
    }
    app.request_render(Local::now().naive_local());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app);

    if let Err(e) = persistence::save(&state_path, &persistence::extract(&app)) {
        tracing::warn!(error = %e, "failed to save session state");
    }

    let _ = cmd_tx.send(WorkerCommand::Shutdown);
    let _ = worker_handle.join();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("dipwatch exiting");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        while let Ok(resp) = app.worker_rx.try_recv() {
            app.handle_response(resp);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key, Local::now().naive_local());
            }
        }

        if !app.running {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_flag_is_optional() {
        let args = Args::try_parse_from(["dipwatch"]).unwrap();
        assert!(args.config.is_none());

        let args = Args::try_parse_from(["dipwatch", "--config", "/tmp/dipwatch.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/dipwatch.toml")));
    }
}
