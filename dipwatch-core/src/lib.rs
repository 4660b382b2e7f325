//! Dipwatch core: Japanese equity and benchmark price dashboard.
//!
//! This crate holds everything below the user interface:
//! - Domain types (instruments, time series, price tables, periods)
//! - Configuration (TOML)
//! - Data acquisition (listing file, Yahoo chart API, fund CSV exports, fetch cache)
//! - Analysis (normalized comparison chart, summary tiles, drawdown)
//! - The `Dashboard` pipeline that turns a selection into a view model

pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod domain;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardView, Notice, NoticeKind, Selection};
