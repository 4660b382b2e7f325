//! Left-hand selector panel: instruments, period and benchmarks.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use dipwatch_core::domain::Period;

use crate::app::{AppState, Focus};
use crate::theme;

pub fn draw(f: &mut Frame, area: Rect, app: &AppState) {
    let bench_height = app.benchmark_names.len() as u16 + 3;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(Period::ALL.len() as u16 + 2),
            Constraint::Length(bench_height),
        ])
        .split(area);

    draw_instruments(f, chunks[0], app);
    draw_periods(f, chunks[1], app);
    draw_benchmarks(f, chunks[2], app);
}

fn section_block(title: String, active: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme::panel_border(active))
        .title(Span::styled(title, theme::panel_title(active)))
}

fn cursor_style(is_cursor: bool, active: bool) -> Style {
    if is_cursor && active {
        theme::accent().add_modifier(Modifier::REVERSED)
    } else if is_cursor {
        theme::accent()
    } else {
        Style::default()
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x] "
    } else {
        "[ ] "
    }
}

/// First row to show so that `cursor` stays inside a window of `height` rows.
pub fn scroll_offset(cursor: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    let half = height / 2;
    cursor.saturating_sub(half).min(len - height)
}

fn draw_instruments(f: &mut Frame, area: Rect, app: &AppState) {
    let active = app.focus == Focus::Instruments;
    let visible = app.instruments.visible();
    let mut title = format!(
        " Instruments ({}/{}) ",
        app.selection.codes.len(),
        app.instruments.universe.len()
    );
    if !app.instruments.query.is_empty() {
        title = format!(" Instruments /{} ", app.instruments.query);
    }
    let block = section_block(title, active);
    let inner_height = block.inner(area).height as usize;

    let offset = scroll_offset(app.instruments.cursor, visible.len(), inner_height);
    let lines: Vec<Line> = if visible.is_empty() {
        vec![Line::from(Span::styled("No matches", theme::muted()))]
    } else {
        visible
            .iter()
            .enumerate()
            .skip(offset)
            .take(inner_height)
            .map(|(i, inst)| {
                let checked = app.selection.codes.iter().any(|c| c == &inst.code);
                Line::from(vec![
                    Span::styled(checkbox(checked), if checked { theme::accent() } else { theme::muted() }),
                    Span::styled(inst.display_name(), cursor_style(i == app.instruments.cursor, active)),
                ])
            })
            .collect()
    };
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_periods(f: &mut Frame, area: Rect, app: &AppState) {
    let active = app.focus == Focus::Period;
    let lines: Vec<Line> = Period::ALL
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let chosen = *p == app.selection.period;
            let mark = if chosen { "(•) " } else { "( ) " };
            Line::from(vec![
                Span::styled(format!("{} ", i + 1), theme::muted()),
                Span::styled(mark, if chosen { theme::accent() } else { theme::muted() }),
                Span::styled(p.label(), cursor_style(chosen, active)),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(section_block(" Period ".into(), active)),
        area,
    );
}

fn draw_benchmarks(f: &mut Frame, area: Rect, app: &AppState) {
    let active = app.focus == Focus::Benchmarks;
    let mut lines: Vec<Line> = app
        .benchmark_names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let checked = app.selection.benchmarks.iter().any(|b| b == name);
            Line::from(vec![
                Span::styled(checkbox(checked), if checked { theme::accent() } else { theme::muted() }),
                Span::styled(name.clone(), cursor_style(i == app.benchmark_cursor, active)),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        Span::styled(checkbox(app.selection.normalize), theme::muted()),
        Span::styled("Normalize (n)", theme::muted()),
    ]));
    f.render_widget(
        Paragraph::new(lines).block(section_block(" Benchmarks ".into(), active)),
        area,
    );
}
