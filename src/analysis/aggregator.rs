//! Sales aggregation and statistics.
//!
//! Group-by-reduce summaries over the joined relations. Groups iterate in
//! ascending key order unless noted, and every top-N uses a stable sort so
//! ties keep their input order.

use crate::join::{CountryProductLine, ProductSale, SalesLine, ShippedOrder};
use crate::models::{Customer, UNKNOWN_LABEL};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Sales summed for one order date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedTotal {
    pub date: NaiveDateTime,
    pub total_sales: f64,
}

/// Sales summed under a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTotal {
    pub name: String,
    pub total_sales: f64,
}

/// Rows counted under a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCount {
    pub name: String,
    pub count: usize,
}

/// Order-line count for a product within a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryProductCount {
    pub country: String,
    pub product_name: String,
    pub order_count: usize,
}

/// Sales attributed to one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSales {
    pub employee_name: String,
    /// Full-precision sum.
    pub total_sales: f64,
    /// `total_sales` rounded to two decimals, for display.
    pub label: String,
}

/// Sum sales per order date, ascending. Lines without a date are skipped.
pub fn sales_over_time(sales: &[SalesLine]) -> Vec<DatedTotal> {
    sum_by_date(sales.iter())
}

pub(crate) fn sum_by_date<'a>(lines: impl Iterator<Item = &'a SalesLine>) -> Vec<DatedTotal> {
    let mut by_date: BTreeMap<NaiveDateTime, f64> = BTreeMap::new();

    for line in lines {
        let Some(date) = line.order_date else {
            continue;
        };
        *by_date.entry(date).or_insert(0.0) += line.total_sales.unwrap_or(0.0);
    }

    by_date
        .into_iter()
        .map(|(date, total_sales)| DatedTotal { date, total_sales })
        .collect()
}

/// The `n` best-selling products by summed line totals.
pub fn top_products(lines: &[ProductSale], n: usize) -> Vec<NamedTotal> {
    let mut by_name: BTreeMap<&str, f64> = BTreeMap::new();

    for line in lines {
        let Some(name) = line.product_name.as_deref() else {
            continue;
        };
        *by_name.entry(name).or_insert(0.0) += line.total_sales.unwrap_or(0.0);
    }

    let mut totals: Vec<NamedTotal> = by_name
        .into_iter()
        .map(|(name, total_sales)| NamedTotal {
            name: name.to_string(),
            total_sales,
        })
        .collect();

    totals.sort_by(|a, b| b.total_sales.total_cmp(&a.total_sales));
    totals.truncate(n);
    totals
}

/// Customers per country, most common first.
pub fn customers_by_country(customers: &[Customer]) -> Vec<NamedCount> {
    count_values(customers.iter().map(|c| c.country.as_deref()), Missing::Bucket)
}

/// Orders per shipping company, most common first.
///
/// Orders without a matched shipper are left out; they are counted in
/// `JoinStats::orders_without_shipper` instead.
pub fn orders_by_shipper(orders: &[ShippedOrder]) -> Vec<NamedCount> {
    count_values(orders.iter().map(|o| o.company_name.as_deref()), Missing::Skip)
}

/// What [`count_values`] does with a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missing {
    /// Count it under [`UNKNOWN_LABEL`].
    Bucket,
    Skip,
}

/// Count occurrences of each value.
///
/// Buckets start in first-appearance order and are then stably sorted by
/// count, descending. Missing values never share a bucket with a present
/// value, even one spelled like [`UNKNOWN_LABEL`].
fn count_values<'a>(
    values: impl Iterator<Item = Option<&'a str>>,
    missing: Missing,
) -> Vec<NamedCount> {
    let mut counts: Vec<(Option<&str>, usize)> = Vec::new();
    let mut positions: HashMap<Option<&str>, usize> = HashMap::new();

    for value in values {
        if value.is_none() && missing == Missing::Skip {
            continue;
        }
        match positions.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                positions.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }

    counts.sort_by_key(|&(_, count)| Reverse(count));
    counts
        .into_iter()
        .map(|(value, count)| NamedCount {
            name: value.unwrap_or(UNKNOWN_LABEL).to_string(),
            count,
        })
        .collect()
}

/// The `n` most ordered products within each country.
///
/// Lines without a country or product name are skipped. Countries come out
/// in ascending order; within a country, counts descend and ties keep
/// product-name order.
pub fn top_products_by_country(
    lines: &[CountryProductLine],
    n: usize,
) -> Vec<CountryProductCount> {
    let mut pairs: BTreeMap<(&str, &str), usize> = BTreeMap::new();

    for line in lines {
        let (Some(country), Some(product)) =
            (line.country.as_deref(), line.product_name.as_deref())
        else {
            continue;
        };
        *pairs.entry((country, product)).or_default() += 1;
    }

    let mut by_country: BTreeMap<&str, Vec<(&str, usize)>> = BTreeMap::new();
    for ((country, product), count) in pairs {
        by_country.entry(country).or_default().push((product, count));
    }

    let mut result = Vec::new();
    for (country, mut products) in by_country {
        products.sort_by_key(|(_, count)| Reverse(*count));
        products.truncate(n);

        result.extend(products.into_iter().map(|(product, count)| CountryProductCount {
            country: country.to_string(),
            product_name: product.to_string(),
            order_count: count,
        }));
    }

    result
}

/// Sales per employee name, with unattributed lines under
/// [`UNKNOWN_LABEL`] at the end.
pub fn sales_by_employee(sales: &[SalesLine]) -> Vec<EmployeeSales> {
    let mut by_name: BTreeMap<&str, f64> = BTreeMap::new();
    let mut unknown: Option<f64> = None;

    for line in sales {
        let amount = line.total_sales.unwrap_or(0.0);
        match line.employee_name.as_deref() {
            Some(name) => *by_name.entry(name).or_insert(0.0) += amount,
            None => *unknown.get_or_insert(0.0) += amount,
        }
    }

    by_name
        .into_iter()
        .map(|(name, total)| (name.to_string(), total))
        .chain(unknown.map(|total| (UNKNOWN_LABEL.to_string(), total)))
        .map(|(employee_name, total_sales)| EmployeeSales {
            employee_name,
            total_sales,
            label: format!("{:.2}", total_sales),
        })
        .collect()
}

/// Total of all line values, skipping lines without one.
pub fn grand_total<'a>(lines: impl IntoIterator<Item = &'a SalesLine>) -> f64 {
    lines.into_iter().filter_map(|l| l.total_sales).sum()
}
