//! Data models for the Northwind dashboard.
//!
//! This module contains the typed rows read from the CSV export, the
//! bookkeeping produced while loading them, and the final report
//! structure handed to the renderers.

use crate::analysis::YearRange;
use crate::dashboard::Dashboard;
use crate::join::JoinStats;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label used for rows whose grouping value is missing.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// The six input tables of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Orders,
    OrderDetails,
    Products,
    Customers,
    Shippers,
    Employees,
}

impl TableKind {
    /// All tables in load order.
    pub const ALL: [TableKind; 6] = [
        TableKind::Orders,
        TableKind::OrderDetails,
        TableKind::Products,
        TableKind::Customers,
        TableKind::Shippers,
        TableKind::Employees,
    ];

    /// What happens to a row whose key column cannot be coerced.
    ///
    /// Shippers and employees fail the whole load; the other keyed tables
    /// drop the row and record it.
    pub fn key_policy(&self) -> KeyPolicy {
        match self {
            TableKind::Shippers | TableKind::Employees => KeyPolicy::Fail,
            _ => KeyPolicy::Drop,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Orders => write!(f, "orders"),
            TableKind::OrderDetails => write!(f, "order-details"),
            TableKind::Products => write!(f, "products"),
            TableKind::Customers => write!(f, "customers"),
            TableKind::Shippers => write!(f, "shippers"),
            TableKind::Employees => write!(f, "employees"),
        }
    }
}

/// Failure policy for identifier coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Remove the row and record it as rejected.
    Drop,
    /// Abort the load.
    Fail,
}

/// A row of `orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: Option<String>,
    pub employee_id: Option<i64>,
    pub order_date: Option<NaiveDateTime>,
    /// Shipper reference, resolved to a company name by the join step.
    pub ship_via: Option<i64>,
}

/// A row of `order-details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_id: i64,
    pub product_id: Option<i64>,
    pub unit_price: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
}

impl OrderDetail {
    /// Discounted value of this line.
    ///
    /// Returns `None` when any factor is missing; such lines contribute
    /// nothing to sums.
    pub fn total_sales(&self) -> Option<f64> {
        line_total(self.unit_price, self.quantity, self.discount)
    }
}

/// `unit_price * quantity * (1 - discount)` for a single order line.
pub fn line_total(
    unit_price: Option<f64>,
    quantity: Option<f64>,
    discount: Option<f64>,
) -> Option<f64> {
    Some(unit_price? * quantity? * (1.0 - discount?))
}

/// A row of `products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: Option<String>,
    /// Catalogue price; order lines carry their own price.
    pub unit_price: Option<f64>,
}

/// A row of `customers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: Option<String>,
    pub country: Option<String>,
}

/// A row of `shippers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipper {
    pub shipper_id: i64,
    pub company_name: Option<String>,
}

/// A row of `employees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Employee {
    /// "First Last", or `None` if either part is missing.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            _ => None,
        }
    }
}

/// All six tables after coercion.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub orders: Vec<Order>,
    pub order_details: Vec<OrderDetail>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub shippers: Vec<Shipper>,
    pub employees: Vec<Employee>,
}

/// A row removed because its key column failed coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Line number in the source file (the header is line 1).
    pub line: u64,
    pub column: String,
    pub value: String,
}

/// A table's rows plus whatever was rejected on the way in.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub rejected: Vec<RejectedRow>,
}

/// Per-table load statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: TableKind,
    /// Rows kept after coercion.
    pub rows: usize,
    pub rejected: Vec<RejectedRow>,
}

/// Statistics for a complete load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    pub tables: Vec<TableSummary>,
}

impl LoadReport {
    /// Record the outcome of loading one table.
    pub fn record<T>(&mut self, table: TableKind, loaded: &Loaded<T>) {
        self.tables.push(TableSummary {
            table,
            rows: loaded.rows.len(),
            rejected: loaded.rejected.clone(),
        });
    }

    /// Total rows dropped across all tables.
    pub fn total_rejected(&self) -> usize {
        self.tables.iter().map(|t| t.rejected.len()).sum()
    }
}

/// Data-quality findings shown alongside the charts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataQuality {
    pub load: LoadReport,
    pub joins: JoinStats,
}

/// Metadata about the generated dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub title: String,
    /// Directory the CSV files were read from.
    pub data_dir: String,
    pub generated_at: DateTime<Utc>,
    pub selected_year: i32,
    pub year_range: YearRange,
    /// Sum of all sales line totals.
    pub total_sales: f64,
    pub duration_seconds: f64,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub dashboard: Dashboard,
    pub data_quality: DataQuality,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(unit_price: f64, quantity: f64, discount: f64) -> OrderDetail {
        OrderDetail {
            order_id: 1,
            product_id: Some(1),
            unit_price: Some(unit_price),
            quantity: Some(quantity),
            discount: Some(discount),
        }
    }

    #[test]
    fn test_line_total_applies_discount_once() {
        let total = detail(10.0, 3.0, 0.1).total_sales().unwrap();
        assert!((total - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_total_missing_factor() {
        let mut line = detail(10.0, 3.0, 0.0);
        line.discount = None;
        assert_eq!(line.total_sales(), None);
    }

    #[test]
    fn test_employee_full_name() {
        let employee = Employee {
            employee_id: 1,
            first_name: Some("Nancy".to_string()),
            last_name: Some("Davolio".to_string()),
        };
        assert_eq!(employee.full_name().as_deref(), Some("Nancy Davolio"));

        let partial = Employee {
            last_name: None,
            ..employee
        };
        assert_eq!(partial.full_name(), None);
    }

    #[test]
    fn test_key_policy_asymmetry() {
        assert_eq!(TableKind::Orders.key_policy(), KeyPolicy::Drop);
        assert_eq!(TableKind::OrderDetails.key_policy(), KeyPolicy::Drop);
        assert_eq!(TableKind::Products.key_policy(), KeyPolicy::Drop);
        assert_eq!(TableKind::Shippers.key_policy(), KeyPolicy::Fail);
        assert_eq!(TableKind::Employees.key_policy(), KeyPolicy::Fail);
    }

    #[test]
    fn test_load_report_totals() {
        let mut report = LoadReport::default();
        let loaded = Loaded {
            rows: vec![1, 2, 3],
            rejected: vec![RejectedRow {
                line: 4,
                column: "orderID".to_string(),
                value: "abc".to_string(),
            }],
        };
        report.record(TableKind::Orders, &loaded);

        assert_eq!(report.total_rejected(), 1);
        assert_eq!(report.tables[0].table, TableKind::Orders);
        assert_eq!(report.tables[0].rows, 3);
    }
}
