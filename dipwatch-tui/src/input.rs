//! Keyboard input dispatch: overlays → global keys → focused sidebar section.

use chrono::NaiveDateTime;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use dipwatch_core::domain::Period;

use crate::app::{AppState, Focus, Overlay};

/// Handle a key event. `now` stamps any render request it triggers.
pub fn handle_key(app: &mut AppState, key: KeyEvent, now: NaiveDateTime) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Help => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::Search => {
            handle_search_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            return;
        }
        KeyCode::Tab => {
            app.focus = app.focus.next();
            return;
        }
        KeyCode::BackTab => {
            app.focus = app.focus.prev();
            return;
        }
        KeyCode::Char('?') => {
            app.overlay = Overlay::Help;
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('/') => {
            app.focus = Focus::Instruments;
            app.overlay = Overlay::Search;
            return;
        }
        KeyCode::Char('n') => {
            app.toggle_normalize(now);
            return;
        }
        KeyCode::Char('r') => {
            app.refresh(now);
            return;
        }
        KeyCode::Char('[') => {
            let prev = app.selection.period.prev();
            app.set_period(prev, now);
            return;
        }
        KeyCode::Char(']') => {
            let next = app.selection.period.next();
            app.set_period(next, now);
            return;
        }
        _ => {}
    }

    // 3. Focused section.
    match app.focus {
        Focus::Instruments => handle_instruments_key(app, key, now),
        Focus::Period => handle_period_key(app, key, now),
        Focus::Benchmarks => handle_benchmarks_key(app, key, now),
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

/// The query filters the instrument list live; Enter keeps the filter,
/// Esc clears it.
fn handle_search_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.instruments.query.clear();
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => {
            app.overlay = Overlay::None;
        }
        KeyCode::Backspace => {
            app.instruments.query.pop();
        }
        KeyCode::Char(c) => {
            app.instruments.query.push(c);
        }
        _ => {}
    }
    app.instruments.cursor = 0;
    app.instruments.clamp_cursor();
}

fn handle_instruments_key(app: &mut AppState, key: KeyEvent, now: NaiveDateTime) {
    let len = app.instruments.visible().len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if app.instruments.cursor + 1 < len {
                app.instruments.cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.instruments.cursor = app.instruments.cursor.saturating_sub(1);
        }
        KeyCode::PageDown => {
            app.instruments.cursor = (app.instruments.cursor + 10).min(len.saturating_sub(1));
        }
        KeyCode::PageUp => {
            app.instruments.cursor = app.instruments.cursor.saturating_sub(10);
        }
        KeyCode::Char('g') | KeyCode::Home => app.instruments.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.instruments.cursor = len.saturating_sub(1),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_cursor_instrument(now),
        KeyCode::Char('x') => {
            if !app.selection.codes.is_empty() {
                app.selection.codes.clear();
                app.request_render(now);
            }
        }
        _ => {}
    }
}

fn handle_period_key(app: &mut AppState, key: KeyEvent, now: NaiveDateTime) {
    let period = match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.selection.period.next(),
        KeyCode::Char('k') | KeyCode::Up => app.selection.period.prev(),
        KeyCode::Char(c @ '1'..='7') => {
            let idx = c as usize - '1' as usize;
            Period::ALL[idx]
        }
        _ => return,
    };
    app.set_period(period, now);
}

fn handle_benchmarks_key(app: &mut AppState, key: KeyEvent, now: NaiveDateTime) {
    let len = app.benchmark_names.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if app.benchmark_cursor + 1 < len {
                app.benchmark_cursor += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.benchmark_cursor = app.benchmark_cursor.saturating_sub(1);
        }
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_cursor_benchmark(now),
        _ => {}
    }
}
