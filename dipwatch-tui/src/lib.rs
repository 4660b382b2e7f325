//! Dipwatch TUI: terminal front end for the dipwatch dashboard pipeline.
//!
//! Layout:
//! - Sidebar: instrument multi-select with search, period radio, benchmark
//!   checkboxes, normalize toggle
//! - Main area: comparison chart, price tiles, benchmark tiles, buy-the-dip tiles
//! - Status bar: last notice, cache statistics, key hints
//!
//! The pipeline runs on a worker thread; the UI thread only draws.

pub mod app;
pub mod input;
pub mod logging;
pub mod persistence;
pub mod theme;
pub mod ui;
pub mod worker;

pub use app::AppState;
pub use theme::Theme;
