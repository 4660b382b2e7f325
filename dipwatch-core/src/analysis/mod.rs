//! Derived views over price tables: chart spec, summary tiles, drawdown.

pub mod chart;
pub mod drawdown;
pub mod tiles;

pub use chart::{normalize, render_chart, ChartSpec, ChartTheme, LineDash, PlotSeries, Rgb, TableStyle};
pub use drawdown::{analyze, DipCategory, DrawdownResult};
pub use tiles::{summarize, Tile, TileUnit, Trend};
