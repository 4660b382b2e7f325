//! Domain types for the dashboard: instruments, time series, price tables, periods.

pub mod instrument;
pub mod period;
pub mod series;

pub use instrument::Instrument;
pub use period::{Period, PeriodWindow};
pub use series::{Column, PriceTable, TimeSeries};
