//! Data acquisition: instrument universe, market prices, benchmark CSVs, fetch cache.

pub mod benchmark;
pub mod cache;
pub mod decode;
pub mod prices;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use benchmark::{BenchmarkFetch, BenchmarkSeriesFetcher};
pub use cache::{CacheKey, CacheStats, FetchCache};
pub use prices::{PriceFetch, PriceSeriesFetcher};
pub use provider::{DataError, HttpFetch, PriceProvider, ReqwestFetcher};
pub use universe::{UniverseLoad, UniverseLoader};
pub use yahoo::YahooProvider;
