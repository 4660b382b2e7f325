//! Session-scoped memo of successful fetches.
//!
//! Keys are a BLAKE3 digest of the canonical JSON of (call kind, arguments,
//! calendar day), so identical requests made on the same day are served
//! from memory and a new day naturally misses. Failures are never stored.

use crate::domain::TimeSeries;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Cache key: hex BLAKE3 digest of the canonical request encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key for `kind` with serializable `args`, bucketed by `day`.
    pub fn new<A: Serialize>(kind: &str, args: &A, day: NaiveDate) -> Self {
        // serde_json::Value maps are sorted, which keeps the encoding canonical.
        let args = serde_json::to_value(args).unwrap_or(serde_json::Value::Null);
        let canonical = serde_json::json!({
            "kind": kind,
            "args": args,
            "day": day.to_string(),
        });
        Self(blake3::hash(canonical.to_string().as_bytes()).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// Hit/miss counters since the last `clear`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<CacheKey, Vec<TimeSeries>>,
    hits: u64,
    misses: u64,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<TimeSeries>> {
        match self.entries.get(key) {
            Some(v) => {
                self.hits += 1;
                tracing::debug!(key = %key, "cache hit");
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                tracing::debug!(key = %key, "cache miss");
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, value: Vec<TimeSeries>) {
        self.entries.insert(key, value);
    }

    /// Return the cached value for `key`, or run `fetch` and store its
    /// result if it succeeds.
    pub fn get_or_try_insert<E>(
        &mut self,
        key: CacheKey,
        fetch: impl FnOnce() -> Result<Vec<TimeSeries>, E>,
    ) -> Result<Vec<TimeSeries>, E> {
        if let Some(v) = self.get(&key) {
            return Ok(v);
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        tracing::info!(entries = self.entries.len(), "clearing fetch cache");
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn key_is_deterministic_and_sensitive() {
        let a = CacheKey::new("prices", &vec!["8306.T"], day(1));
        assert_eq!(a, CacheKey::new("prices", &vec!["8306.T"], day(1)));
        assert_ne!(a, CacheKey::new("prices", &vec!["8306.T"], day(2)));
        assert_ne!(a, CacheKey::new("benchmark", &vec!["8306.T"], day(1)));
        assert_ne!(a, CacheKey::new("prices", &vec!["1802.T"], day(1)));
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn only_successes_are_stored() {
        let mut cache = FetchCache::new();
        let key = CacheKey::new("benchmark", &"S&P", day(1));

        let err: Result<_, &str> = cache.get_or_try_insert(key.clone(), || Err("boom"));
        assert!(err.is_err());
        assert!(cache.is_empty());

        let mut calls = 0;
        for _ in 0..3 {
            let v: Result<_, &str> = cache.get_or_try_insert(key.clone(), || {
                calls += 1;
                Ok(vec![TimeSeries::empty("S&P")])
            });
            assert_eq!(v.unwrap().len(), 1);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 2, entries: 1 });
    }

    #[test]
    fn clear_invalidates() {
        let mut cache = FetchCache::new();
        let key = CacheKey::new("prices", &(), day(1));
        cache.insert(key.clone(), Vec::new());
        cache.clear();
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 1, entries: 0 });
    }
}
