//! Bottom status bar: key hints, last status message, cache counters.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{AppState, StatusLevel};
use crate::theme;

pub fn status_line(app: &AppState) -> Line<'_> {
    let mut spans: Vec<Span> = Vec::new();

    if app.is_loading() {
        spans.push(Span::styled(" Loading… ", theme::warning()));
    }
    spans.push(Span::styled(
        format!(" {} | Tab:focus ?:help q:quit", app.focus.label()),
        theme::muted(),
    ));
    spans.push(Span::raw(" | "));

    if let Some((msg, level)) = &app.status_message {
        let style = match level {
            StatusLevel::Info => theme::accent(),
            StatusLevel::Warning => theme::warning(),
            StatusLevel::Error => theme::negative(),
        };
        spans.push(Span::styled(msg.as_str(), style));
        spans.push(Span::raw(" | "));
    }

    spans.push(Span::styled(
        format!(
            "cache {} hit / {} miss ({} entries)",
            app.cache.hits, app.cache.misses, app.cache.entries
        ),
        theme::muted(),
    ));
    Line::from(spans)
}

pub fn render(f: &mut Frame, area: Rect, app: &AppState) {
    f.render_widget(Paragraph::new(status_line(app)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{app, now};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn shows_cache_counters_and_status() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.cache.hits = 3;
        app.cache.misses = 2;
        app.cache.entries = 2;
        app.set_warning("universe fallback");

        let line = text(&status_line(&app));
        assert!(line.contains("cache 3 hit / 2 miss (2 entries)"));
        assert!(line.contains("universe fallback"));
        assert!(!line.contains("Loading"));
    }

    #[test]
    fn shows_loading_while_request_pending() {
        let (mut app, _cmd_rx, _resp_tx) = app();
        app.request_render(now());
        assert!(text(&status_line(&app)).contains("Loading"));
    }
}
