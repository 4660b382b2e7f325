//! Yahoo Finance data provider.
//!
//! Fetches daily closes from Yahoo's v8 chart API, one request per ticker
//! inside a batch call. Adjusted closes are used when the response carries
//! them. There is no retry: a failed request fails the whole batch.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes, so parse failures surface as `ResponseFormatChanged`.

use super::provider::{DataError, HttpFetch, PriceProvider};
use crate::domain::TimeSeries;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::sync::Arc;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    /// Exchange offset from UTC in seconds (32400 for Tokyo).
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    http: Arc<dyn HttpFetch>,
    base_url: String,
}

impl YahooProvider {
    pub fn new(http: Arc<dyn HttpFetch>) -> Self {
        Self {
            http,
            base_url: "https://query2.finance.yahoo.com".into(),
        }
    }

    /// Point the provider at a different host (used by tests and mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the chart API URL for a ticker and time range.
    pub fn chart_url(&self, ticker: &str, start: NaiveDateTime, end: NaiveDateTime) -> String {
        let start_ts = start.and_utc().timestamp();
        let end_ts = end.and_utc().timestamp();
        format!(
            "{}/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true",
            self.base_url
        )
    }

    /// Parse a chart API response body into a close series labelled `ticker`.
    fn parse_response(ticker: &str, body: &[u8]) -> Result<TimeSeries, DataError> {
        let resp: ChartResponse = serde_json::from_slice(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        // A listed ticker with no trades in range has no timestamps at all.
        let timestamps = data.timestamp.unwrap_or_default();

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = trading_date(ts, offset).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .or_else(|| quote.close.get(i).copied().flatten());

            // Null closes are holidays / suspended sessions.
            if let Some(close) = close {
                points.push((date, close));
            }
        }

        Ok(TimeSeries::new(ticker, points))
    }

    fn fetch_one(
        &self,
        ticker: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<TimeSeries, DataError> {
        let url = self.chart_url(ticker, start, end);
        let body = self.http.get_bytes(&url).map_err(|e| match e {
            DataError::HttpStatus { status: 404, .. } => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            other => other,
        })?;
        let series = Self::parse_response(ticker, &body)?;
        tracing::debug!(ticker, rows = series.len(), "parsed chart response");
        Ok(series)
    }
}

/// Exchange-local calendar date of a session timestamp.
fn trading_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.naive_utc().date())
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_closes(
        &self,
        tickers: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimeSeries>, DataError> {
        let mut out = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            match self.fetch_one(ticker, start, end) {
                Ok(series) => out.push(series),
                // An unknown symbol only loses its own series.
                Err(DataError::SymbolNotFound { symbol }) => {
                    tracing::warn!(ticker = %symbol, "symbol not found, omitting");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
