//! Comparison chart: draws a core `ChartSpec` with ratatui's `Chart`.
//!
//! Layout inside the block: a centered legend header (`legend_columns` per
//! row), then the plot with y labels on both edges. Solid series are braille
//! lines; dashed series are braille scatter points. Grid lines are dim
//! dotted scatter datasets drawn underneath.

use chrono::NaiveDate;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use dipwatch_core::analysis::{ChartSpec, LineDash, PlotSeries};

use crate::theme::rgb;

const Y_TICKS: usize = 5;
const X_TICKS: usize = 3;
const GRID_POINTS: usize = 80;

pub struct ComparisonChart<'a> {
    spec: &'a ChartSpec,
    title: String,
}

impl<'a> ComparisonChart<'a> {
    pub fn new(spec: &'a ChartSpec, title: impl Into<String>) -> Self {
        Self {
            spec,
            title: title.into(),
        }
    }
}

/// Plot x coordinate: days since `origin`.
fn x_of(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn y_tick_values(lo: f64, hi: f64) -> Vec<f64> {
    (0..Y_TICKS)
        .map(|i| lo + (hi - lo) * i as f64 / (Y_TICKS - 1) as f64)
        .collect()
}

fn format_y(v: f64, normalized: bool) -> String {
    if normalized || v.abs() < 1_000.0 {
        format!("{v:.1}")
    } else {
        format!("{v:.0}")
    }
}

/// Padded y bounds so lines do not sit on the frame.
fn padded_bounds(lo: f64, hi: f64) -> (f64, f64) {
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad, hi + pad)
}

fn legend_lines(spec: &ChartSpec) -> Vec<Line<'_>> {
    let bg = spec.theme.background;
    spec.legend_rows()
        .into_iter()
        .map(|row| {
            let mut spans = Vec::new();
            for (i, s) in row.iter().enumerate() {
                if i > 0 {
                    spans.push(Span::raw("   "));
                }
                let swatch = match s.dash {
                    LineDash::Solid => "──",
                    LineDash::Dashed => "- -",
                    LineDash::Dotted => "···",
                };
                let color = rgb(s.color.over(bg, s.alpha));
                spans.push(Span::styled(swatch, Style::default().fg(color)));
                spans.push(Span::styled(
                    format!(" {}", s.label),
                    Style::default().fg(rgb(spec.theme.text)),
                ));
            }
            Line::from(spans).alignment(Alignment::Center)
        })
        .collect()
}

fn series_points(origin: NaiveDate, s: &PlotSeries) -> Vec<(f64, f64)> {
    s.points.iter().map(|(d, v)| (x_of(origin, *d), *v)).collect()
}

impl Widget for ComparisonChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let theme = &self.spec.theme;
        let bg = theme.background;
        let text_style = Style::default().fg(rgb(theme.text));
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(rgb(theme.spine)))
            .title(self.title.as_str())
            .title_style(text_style)
            .style(Style::default().bg(rgb(bg)));
        let inner = block.inner(area);
        block.render(area, buf);

        let (Some((d0, d1)), Some((lo, hi))) = (self.spec.x_bounds(), self.spec.y_bounds()) else {
            Paragraph::new("No data to plot").style(text_style).render(inner, buf);
            return;
        };

        let legend = legend_lines(self.spec);
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(legend.len() as u16), Constraint::Min(3)])
            .split(inner);
        Paragraph::new(legend).render(sections[0], buf);

        let (y_min, y_max) = padded_bounds(lo, hi);
        let x_max = x_of(d0, d1).max(1.0);
        let ticks = y_tick_values(y_min, y_max);
        let tick_labels: Vec<String> = ticks.iter().map(|v| format_y(*v, self.spec.normalized)).collect();
        let label_width = tick_labels.iter().map(|l| l.len()).max().unwrap_or(0) as u16 + 1;

        let plot_cols = if theme.labels_right {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(10), Constraint::Length(label_width)])
                .split(sections[1])
        } else {
            Layout::default()
                .constraints([Constraint::Min(10)])
                .split(sections[1])
        };

        // Grid: horizontal at inner y ticks, vertical at inner x ticks.
        let grid_color = rgb(theme.grid.over(bg, theme.grid_alpha));
        let mut grid: Vec<Vec<(f64, f64)>> = ticks[1..Y_TICKS - 1]
            .iter()
            .map(|y| {
                (0..=GRID_POINTS)
                    .map(|i| (x_max * i as f64 / GRID_POINTS as f64, *y))
                    .collect()
            })
            .collect();
        for i in 1..X_TICKS - 1 {
            let x = x_max * i as f64 / (X_TICKS - 1) as f64;
            grid.push(
                (0..=GRID_POINTS / 2)
                    .map(|j| (x, y_min + (y_max - y_min) * j as f64 / (GRID_POINTS / 2) as f64))
                    .collect(),
            );
        }
        let lines: Vec<Vec<(f64, f64)>> = self.spec.series.iter().map(|s| series_points(d0, s)).collect();

        let mut datasets: Vec<Dataset> = grid
            .iter()
            .map(|g| {
                Dataset::default()
                    .marker(symbols::Marker::Dot)
                    .graph_type(GraphType::Scatter)
                    .style(Style::default().fg(grid_color))
                    .data(g)
            })
            .collect();
        for (s, data) in self.spec.series.iter().zip(&lines) {
            let graph_type = match s.dash {
                LineDash::Solid => GraphType::Line,
                LineDash::Dashed | LineDash::Dotted => GraphType::Scatter,
            };
            datasets.push(
                Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(graph_type)
                    .style(Style::default().fg(rgb(s.color.over(bg, s.alpha))))
                    .data(data),
            );
        }

        let axis_style = Style::default().fg(rgb(theme.spine));
        let x_labels: Vec<Span> = (0..X_TICKS)
            .map(|i| {
                let days = (x_max * i as f64 / (X_TICKS - 1) as f64).round() as i64;
                let date = d0 + chrono::Duration::days(days);
                Span::styled(date.format("%Y/%m/%d").to_string(), text_style)
            })
            .collect();
        let y_axis = Axis::default()
            .title(Span::styled(self.spec.y_label.as_str(), text_style))
            .style(axis_style)
            .bounds([y_min, y_max]);
        let y_axis = if theme.labels_left {
            y_axis.labels(tick_labels.iter().map(|l| Span::styled(l.clone(), text_style)))
        } else {
            y_axis
        };

        let chart = Chart::new(datasets)
            .style(Style::default().bg(rgb(bg)))
            .legend_position(None)
            .x_axis(
                Axis::default()
                    .style(axis_style)
                    .bounds([0.0, x_max])
                    .labels(x_labels),
            )
            .y_axis(y_axis);
        chart.render(plot_cols[0], buf);

        if theme.labels_right {
            render_right_labels(plot_cols[0], plot_cols[1], &tick_labels, text_style, buf);
        }
    }
}

/// Paint y tick labels in `column`, on the rows the chart uses for its
/// left-hand labels. The chart's plot area stops two rows above the bottom
/// (x axis line and x labels).
fn render_right_labels(plot: Rect, column: Rect, labels: &[String], style: Style, buf: &mut Buffer) {
    if labels.len() < 2 || plot.height < 3 {
        return;
    }
    let graph_height = plot.height - 2;
    let graph_bottom = plot.y + graph_height;
    let n = labels.len() as u16;
    for (i, label) in labels.iter().enumerate() {
        let dy = i as u16 * (graph_height - 1) / (n - 1);
        let y = graph_bottom.saturating_sub(1).saturating_sub(dy);
        if y >= plot.y {
            buf.set_string(column.x + 1, y, label, style);
        }
    }
}
