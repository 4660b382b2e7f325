//! Summary tiles: latest price and day-over-day change per series, plus the
//! drawdown tiles with their Dip/Stable badge.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use dipwatch_core::analysis::tiles::format_grouped;
use dipwatch_core::analysis::{DrawdownResult, Tile};
use dipwatch_core::DashboardView;

use crate::theme::{self, Theme};

/// Rows taken by one tile: border, two text lines, border.
const TILE_HEIGHT: u16 = 4;

/// Height a section of `count` tiles needs, including its one-line header.
pub fn section_height(count: usize, columns: usize) -> u16 {
    if count == 0 {
        return 0;
    }
    let rows = count.div_ceil(columns.max(1)) as u16;
    1 + rows * TILE_HEIGHT
}

pub struct TilesPanel<'a> {
    view: &'a DashboardView,
    theme: &'a Theme,
    columns: usize,
    yen_suffix: &'a str,
}

impl<'a> TilesPanel<'a> {
    pub fn new(view: &'a DashboardView, theme: &'a Theme, columns: usize) -> Self {
        Self {
            view,
            theme,
            columns: columns.max(1),
            yen_suffix: "円",
        }
    }

    /// Total height of all non-empty sections.
    pub fn height(&self) -> u16 {
        section_height(self.view.instrument_tiles.len(), self.columns)
            + section_height(self.view.benchmark_tiles.len(), self.columns)
            + section_height(self.view.drawdowns.len(), self.columns)
    }

    fn price_tile(&self, tile: &Tile) -> (String, Vec<Line<'static>>) {
        let delta_style = Style::default().fg(self.theme.trend_color(tile.trend()));
        let lines = vec![
            Line::from(Span::styled(
                tile.value_text(),
                Style::default()
                    .fg(self.theme.text_primary)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(tile.delta_text(), delta_style)),
        ];
        (tile.title(), lines)
    }

    fn drawdown_tile(&self, dd: &DrawdownResult) -> (String, Vec<Line<'static>>) {
        let price = format!(
            "{}{} / high {}{}",
            format_grouped(dd.current_price, 0),
            self.yen_suffix,
            format_grouped(dd.window_high, 0),
            self.yen_suffix,
        );
        let lines = vec![
            Line::from(Span::styled(price, Style::default().fg(self.theme.text_secondary))),
            Line::from(vec![
                Span::styled(
                    format!("{:.2}% ", dd.drop_rate_pct),
                    Style::default()
                        .fg(self.theme.text_primary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(" {} ", dd.category.label()),
                    self.theme.dip_badge(dd.category),
                ),
            ]),
        ];
        (dd.label.clone(), lines)
    }

    fn render_section(&self, header: &str, tiles: Vec<(String, Vec<Line<'static>>)>, area: Rect, buf: &mut Buffer) {
        if tiles.is_empty() || area.height == 0 {
            return;
        }
        Paragraph::new(Line::from(Span::styled(header.to_string(), theme::accent_bold())))
            .render(Rect { height: 1, ..area }, buf);

        let grid = Rect {
            y: area.y + 1,
            height: area.height.saturating_sub(1),
            ..area
        };
        let constraints = vec![Constraint::Ratio(1, self.columns as u32); self.columns];
        for (row_idx, row) in tiles.chunks(self.columns).enumerate() {
            let y = grid.y + row_idx as u16 * TILE_HEIGHT;
            if y + TILE_HEIGHT > grid.bottom() {
                break;
            }
            let row_area = Rect {
                y,
                height: TILE_HEIGHT,
                ..grid
            };
            let cells = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(constraints.clone())
                .split(row_area);
            for ((title, lines), cell) in row.iter().zip(cells.iter()) {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme::panel_border(false))
                    .title(Span::styled(format!(" {title} "), theme::muted()));
                Paragraph::new(lines.clone()).block(block).render(*cell, buf);
            }
        }
    }
}

impl Widget for TilesPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let prices: Vec<_> = self.view.instrument_tiles.iter().map(|t| self.price_tile(t)).collect();
        let benches: Vec<_> = self.view.benchmark_tiles.iter().map(|t| self.price_tile(t)).collect();
        let drawdowns: Vec<_> = self.view.drawdowns.iter().map(|d| self.drawdown_tile(d)).collect();

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(section_height(prices.len(), self.columns)),
                Constraint::Length(section_height(benches.len(), self.columns)),
                Constraint::Length(section_height(drawdowns.len(), self.columns)),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_section("Latest prices", prices, sections[0], buf);
        self.render_section("Benchmarks", benches, sections[1], buf);
        self.render_section("Drawdown", drawdowns, sections[2], buf);
    }
}
