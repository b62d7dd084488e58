//! Analysis modules.
//!
//! Aggregations over the joined sales data and the year filter that
//! drives the filtered time series.

pub mod aggregator;
pub mod filter;

pub use aggregator::*;
pub use filter::{filtered_sales_over_time, YearRange};
