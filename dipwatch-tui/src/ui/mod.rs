//! Top-level UI layout: selector sidebar, chart over tiles, status bar.

pub mod chart_panel;
pub mod overlays;
pub mod sidebar;
pub mod status_bar;
pub mod tiles_panel;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::{AppState, Overlay};
use crate::theme::{self, Theme};

use chart_panel::ComparisonChart;
use tiles_panel::TilesPanel;

const SIDEBAR_WIDTH: u16 = 36;

/// Draw the entire UI.
pub fn draw(f: &mut Frame, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());
    let main_area = chunks[0];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(main_area);

    sidebar::draw(f, columns[0], app);
    draw_content(f, columns[1], app);
    status_bar::render(f, chunks[1], app);

    match app.overlay {
        Overlay::Help => overlays::render_help(f, main_area),
        Overlay::ErrorHistory => overlays::render_error_history(f, main_area, app),
        Overlay::Search => overlays::render_search(f, main_area, app),
        Overlay::None => {}
    }
}

fn draw_content(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(view) = &app.view else {
        let msg = if app.is_loading() { "Loading…" } else { "Nothing rendered yet" };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::panel_border(false));
        f.render_widget(Paragraph::new(Span::styled(msg, theme::muted())).block(block), area);
        return;
    };

    let theme = Theme::dark(app.inverse_delta_colors);
    let tiles = TilesPanel::new(view, &theme, app.tile_columns);
    let notice_height = if view.notices.is_empty() {
        0
    } else {
        view.notices.len().min(3) as u16 + 2
    };
    // The chart keeps at least half of the content area.
    let tiles_height = tiles.height().min(area.height / 2);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(notice_height),
            Constraint::Min(8),
            Constraint::Length(tiles_height),
        ])
        .split(area);

    if notice_height > 0 {
        let lines: Vec<Line> = view
            .notices
            .iter()
            .take(3)
            .map(|n| Line::from(Span::styled(n.to_string(), theme::warning())))
            .collect();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme::warning())
            .title(" Notices [e]history ");
        f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: true }), rows[0]);
    }

    let title = format!(
        " {} {} ~ {} ",
        view.period.label(),
        view.window.start.format("%Y/%m/%d"),
        view.window.end.format("%Y/%m/%d"),
    );
    match &view.chart {
        Some(spec) => f.render_widget(ComparisonChart::new(spec, title), rows[1]),
        None => {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme::panel_border(false))
                .title(title);
            let hint = if app.selection.is_empty() {
                "Select instruments or benchmarks in the sidebar"
            } else {
                "No data for this selection"
            };
            f.render_widget(Paragraph::new(Span::styled(hint, theme::muted())).block(block), rows[1]);
        }
    }

    f.render_widget(tiles, rows[2]);
}

/// Compute a centered rect for overlays.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
