//! "Buy-the-dip" indicator: decline from the recent high.

use crate::domain::PriceTable;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DipCategory {
    Normal,
    Dip,
}

impl DipCategory {
    pub fn label(self) -> &'static str {
        match self {
            DipCategory::Normal => "Stable",
            DipCategory::Dip => "Dip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownResult {
    pub label: String,
    pub current_price: f64,
    pub window_high: f64,
    /// Percent below `window_high`; never positive.
    pub drop_rate_pct: f64,
    pub category: DipCategory,
}

/// Drawdown of each series' last close from the high of its trailing
/// `window` observations (fewer if the series is shorter).
///
/// The window includes the last close, so the rate is at most zero. A
/// series is a `Dip` when its rate is strictly below `dip_threshold_pct`.
/// Empty series are skipped.
pub fn analyze(table: &PriceTable, window: usize, dip_threshold_pct: f64) -> Vec<DrawdownResult> {
    table
        .all_series()
        .into_iter()
        .filter_map(|s| {
            let recent = s.tail(window.max(1));
            let &(_, current_price) = recent.last()?;
            let window_high = recent.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
            let drop_rate_pct = (current_price - window_high) / window_high * 100.0;
            if !drop_rate_pct.is_finite() {
                tracing::debug!(series = %s.label, "window high is zero, skipping drawdown");
                return None;
            }
            let category = if drop_rate_pct < dip_threshold_pct {
                DipCategory::Dip
            } else {
                DipCategory::Normal
            };
            Some(DrawdownResult {
                label: s.label,
                current_price,
                window_high,
                drop_rate_pct,
                category,
            })
        })
        .collect()
}
