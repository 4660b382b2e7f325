//! Instrument closing-price table.

use super::cache::{CacheKey, FetchCache};
use super::provider::{DataError, PriceProvider};
use crate::domain::{Instrument, PriceTable, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of an instrument price fetch. On failure the table is empty.
#[derive(Debug, Default)]
pub struct PriceFetch {
    pub table: PriceTable,
    pub error: Option<DataError>,
    /// Codes with no observations in the window; their columns are empty.
    pub missing: Vec<String>,
}

/// Fetches closes for a set of instruments and labels them for display.
pub struct PriceSeriesFetcher {
    provider: Arc<dyn PriceProvider>,
    market_suffix: String,
}

impl PriceSeriesFetcher {
    pub fn new(provider: Arc<dyn PriceProvider>, market_suffix: impl Into<String>) -> Self {
        Self {
            provider,
            market_suffix: market_suffix.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Exchange-qualified tickers in the caller's order.
    pub fn tickers(&self, instruments: &[Instrument]) -> Vec<String> {
        instruments
            .iter()
            .map(|i| i.ticker(&self.market_suffix))
            .collect()
    }

    /// One series per instrument, in the caller's order, labelled with the
    /// instrument's display name and limited to dates on or after `start`.
    ///
    /// An empty request returns immediately without touching the provider.
    /// A ticker the provider returned nothing for yields an empty series.
    pub fn fetch_series(
        &self,
        instruments: &[Instrument],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimeSeries>, DataError> {
        if instruments.is_empty() {
            return Ok(Vec::new());
        }

        let tickers = self.tickers(instruments);
        let mut seen = HashSet::new();
        if let Some(dup) = tickers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(DataError::InvalidRequest(format!("duplicate ticker {dup}")));
        }

        tracing::info!(
            provider = self.provider.name(),
            count = tickers.len(),
            start = %start.date(),
            "fetching closes"
        );
        let fetched = self.provider.fetch_closes(&tickers, start, end)?;
        let mut by_ticker: HashMap<String, TimeSeries> =
            fetched.into_iter().map(|s| (s.label.clone(), s)).collect();

        let start_date = start.date();
        Ok(tickers
            .iter()
            .zip(instruments)
            .map(|(ticker, inst)| {
                let label = inst.display_name();
                match by_ticker.remove(ticker) {
                    Some(s) => s.since(start_date).relabeled(label),
                    None => {
                        tracing::warn!(ticker = %ticker, "provider returned no series");
                        TimeSeries::empty(label)
                    }
                }
            })
            .collect())
    }

    /// `fetch_series` through `cache`, joined into a table. Any failure
    /// yields an empty table and the error. Results are cached per
    /// (tickers, start date, `day`); failures are not.
    pub fn fetch(
        &self,
        instruments: &[Instrument],
        start: NaiveDateTime,
        end: NaiveDateTime,
        cache: &mut FetchCache,
        day: NaiveDate,
    ) -> PriceFetch {
        if instruments.is_empty() {
            return PriceFetch::default();
        }
        let key = CacheKey::new("prices", &(self.tickers(instruments), start.date()), day);
        match cache.get_or_try_insert(key, || self.fetch_series(instruments, start, end)) {
            Ok(series) => {
                let missing = instruments
                    .iter()
                    .zip(&series)
                    .filter(|(_, s)| s.is_empty())
                    .map(|(i, _)| i.code.clone())
                    .collect();
                PriceFetch {
                    table: PriceTable::from_series(series),
                    error: None,
                    missing,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "price fetch failed");
                PriceFetch {
                    table: PriceTable::empty(),
                    error: Some(e),
                    missing: Vec::new(),
                }
            }
        }
    }
}
