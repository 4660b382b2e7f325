//! Provider traits and structured error types.
//!
//! `HttpFetch` is the only place bytes come off the network, so tests swap it
//! for an in-memory map. `PriceProvider` abstracts the market-data source.

use crate::config::HttpConfig;
use crate::domain::TimeSeries;
use chrono::NaiveDateTime;
use std::time::Duration;
use thiserror::Error;

/// Structured error types for data operations.
///
/// Displayable in both CLI and TUI contexts.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("could not decode content as UTF-8 or Shift_JIS")]
    Undecodable,

    #[error("CSV schema error: {0}")]
    Schema(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Fetches the body of a URL as raw bytes.
pub trait HttpFetch: Send + Sync {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError>;
}

/// Blocking reqwest client. One request per call, no retries.
pub struct ReqwestFetcher {
    client: reqwest::blocking::Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError> {
        tracing::debug!(url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|e| DataError::NetworkUnreachable(format!("read body from {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

/// Market-data source for daily closing prices.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Daily closes for every ticker from `start` to `end`, one series per
    /// ticker, labelled with the ticker and returned in request order.
    fn fetch_closes(
        &self,
        tickers: &[String],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<TimeSeries>, DataError>;
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory `HttpFetch`: exact URL → body, anything else → 404.
    #[derive(Default)]
    pub struct MockHttp {
        pub bodies: HashMap<String, Vec<u8>>,
        pub calls: AtomicUsize,
    }

    impl MockHttp {
        pub fn with(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
            self.bodies.insert(url.to_string(), body.into());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpFetch for MockHttp {
        fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.get(url).cloned().ok_or_else(|| DataError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
        }
    }
}
