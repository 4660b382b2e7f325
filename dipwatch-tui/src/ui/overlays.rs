//! Overlay widgets: help, error history, search.

use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::AppState;
use crate::theme;
use crate::ui::centered_rect;

const HELP: &[(&str, &str)] = &[
    ("Tab / S-Tab", "cycle focus"),
    ("j / k", "move cursor"),
    ("Space / Enter", "toggle item"),
    ("PgUp / PgDn / g / G", "page through instruments"),
    ("x", "clear selected instruments"),
    ("/", "search instruments"),
    ("1-7", "pick period (period focus)"),
    ("[ / ]", "previous / next period"),
    ("n", "toggle normalization"),
    ("r", "clear cache and reload"),
    ("e", "error history"),
    ("q / Ctrl-C", "quit"),
];

pub fn help_lines() -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for (keys, action) in HELP {
        lines.push(Line::from(vec![
            Span::styled(format!("  {keys:<22}"), theme::accent()),
            Span::styled(*action, theme::muted()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Press any key to close", theme::muted())));
    lines
}

pub fn render_help(f: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Keys ")
        .title_style(theme::accent_bold());

    let para = Paragraph::new(help_lines()).block(block).wrap(Wrap { trim: false });
    f.render_widget(para, popup);
}

/// Error history overlay.
pub fn render_error_history(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(80, 70, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::negative())
        .title(format!(
            " Error History ({}) [Esc]close [j/k]scroll ",
            app.error_history.len()
        ))
        .title_style(theme::negative());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    if app.error_history.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled("No errors recorded.", theme::muted())),
            inner,
        );
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (i, err) in app
        .error_history
        .iter()
        .enumerate()
        .skip(app.error_scroll)
        .take(inner.height as usize)
    {
        let style = if i == app.error_scroll {
            theme::negative().add_modifier(Modifier::BOLD)
        } else {
            theme::muted()
        };
        let mut spans = vec![
            Span::styled(format!("[{}] ", err.timestamp.format("%H:%M:%S")), theme::muted()),
            Span::styled(format!("[{}] ", err.category.label()), theme::warning()),
        ];
        if !err.context.is_empty() {
            spans.push(Span::styled(format!("{}: ", err.context), theme::muted()));
        }
        spans.push(Span::styled(err.message.as_str(), style));
        lines.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

/// Instrument search overlay.
pub fn render_search(f: &mut Frame, area: Rect, app: &AppState) {
    let popup = centered_rect(50, 20, area);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::accent())
        .title(" Search [Enter]keep [Esc]clear ")
        .title_style(theme::accent_bold());

    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let matches = app.instruments.visible().len();
    let text = vec![
        Line::from(Span::styled("Code or name:", theme::muted())),
        Line::from(vec![
            Span::styled("> ", theme::accent()),
            Span::styled(app.instruments.query.as_str(), theme::accent_bold()),
            Span::styled("_", theme::accent()),
        ]),
        Line::from(Span::styled(format!("{matches} matches"), theme::muted())),
    ];
    f.render_widget(Paragraph::new(text), inner);
}
