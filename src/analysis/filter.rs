//! Year filter for the sales time series.

use super::aggregator::{sum_by_date, DatedTotal};
use crate::join::SalesLine;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Range used when the data contains no parseable order dates.
pub const FALLBACK_YEAR_RANGE: YearRange = YearRange {
    min: 1996,
    max: 1998,
    default: 1997,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("year {year} is outside the available range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("invalid year range {min}..={max} (default {default})")]
    InvalidRange { min: i32, max: i32, default: i32 },
}

/// Closed range of selectable years, with the year shown first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
    pub default: i32,
}

impl YearRange {
    /// Build a range whose default is the middle year.
    pub fn spanning(min: i32, max: i32) -> Self {
        Self {
            min,
            max,
            default: middle_year(min, max),
        }
    }

    /// The range of order years present in `sales`.
    pub fn observe(sales: &[SalesLine]) -> Self {
        let years = sales.iter().filter_map(|s| s.order_date.map(|d| d.year()));
        let bounds = years.fold(None, |acc: Option<(i32, i32)>, y| match acc {
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
            None => Some((y, y)),
        });

        match bounds {
            Some((min, max)) => Self::spanning(min, max),
            None => {
                debug!("No order dates found, using fallback year range");
                FALLBACK_YEAR_RANGE
            }
        }
    }

    /// Replace any bound or the default with an explicit value.
    ///
    /// When only the bounds change the default moves to the new middle.
    pub fn pinned(
        self,
        min: Option<i32>,
        max: Option<i32>,
        default: Option<i32>,
    ) -> Result<Self, FilterError> {
        let min = min.unwrap_or(self.min);
        let max = max.unwrap_or(self.max);
        let default = default.unwrap_or_else(|| middle_year(min, max));

        if min > max || !(min..=max).contains(&default) {
            return Err(FilterError::InvalidRange { min, max, default });
        }

        Ok(Self { min, max, default })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }

    /// Validate a selection against the range.
    pub fn check(&self, year: i32) -> Result<i32, FilterError> {
        if self.contains(year) {
            Ok(year)
        } else {
            Err(FilterError::YearOutOfRange {
                year,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Midpoint rounded toward `min`, computed wide so extreme bounds cannot
/// overflow.
fn middle_year(min: i32, max: i32) -> i32 {
    let (min, max) = (i64::from(min), i64::from(max));
    // Lies between the two inputs, so it fits back into i32.
    (min + (max - min) / 2) as i32
}

/// Lines whose order date falls within `year`.
pub fn filter_by_year(sales: &[SalesLine], year: i32) -> impl Iterator<Item = &SalesLine> {
    sales
        .iter()
        .filter(move |s| s.order_date.is_some_and(|d| d.year() == year))
}

/// Sales per order date restricted to one year.
pub fn filtered_sales_over_time(sales: &[SalesLine], year: i32) -> Vec<DatedTotal> {
    sum_by_date(filter_by_year(sales, year))
}
