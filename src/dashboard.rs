//! Chart assembly for the dashboard page.
//!
//! [`Dashboard::build`] is a pure function from the joined data and the
//! selected year to chart data. Only the last chart depends on the year;
//! [`Dashboard::with_year`] recomputes it and leaves the rest untouched.

use crate::analysis::{
    customers_by_country, filtered_sales_over_time, orders_by_shipper, sales_by_employee,
    sales_over_time, top_products, top_products_by_country, DatedTotal,
};
use crate::join::{JoinedData, SalesLine};
use crate::models::Customer;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Page title.
pub const DASHBOARD_TITLE: &str = "Northwind Traders Dashboard";

/// How a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    /// Bars grouped by `x`, one per `group`.
    GroupedBar,
}

/// How values are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    Currency,
    Count,
}

impl ValueFormat {
    pub fn format(&self, value: f64) -> String {
        match self {
            ValueFormat::Currency => format!("{:.2}", value),
            ValueFormat::Count => format!("{:.0}", value),
        }
    }
}

/// A single plotted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Text drawn on the mark.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ChartPoint {
    fn new(x: impl Into<String>, y: f64) -> Self {
        Self {
            x: x.into(),
            y,
            group: None,
            text: None,
        }
    }
}

/// One chart with its section heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub heading: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub value_format: ValueFormat,
    pub points: Vec<ChartPoint>,
}

/// Sizes of the top-N charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartLimits {
    pub top_products: usize,
    pub top_per_country: usize,
}

impl Default for ChartLimits {
    fn default() -> Self {
        Self {
            top_products: 10,
            top_per_country: 5,
        }
    }
}

/// All charts on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub title: String,
    /// The six charts that ignore the year filter.
    pub charts: Vec<Chart>,
    pub selected_year: i32,
    /// Sales for `selected_year`.
    pub filtered: Chart,
}

impl Dashboard {
    /// Build every chart.
    pub fn build(
        joined: &JoinedData,
        customers: &[Customer],
        limits: ChartLimits,
        year: i32,
    ) -> Self {
        let charts = vec![
            sales_trend_chart(&joined.sales),
            top_products_chart(joined, limits.top_products),
            customers_by_country_chart(customers),
            products_by_country_chart(joined, limits.top_per_country),
            employee_sales_chart(&joined.sales),
            shipper_chart(joined),
        ];

        Self {
            title: DASHBOARD_TITLE.to_string(),
            charts,
            selected_year: year,
            filtered: year_chart(&joined.sales, year),
        }
    }

    /// Re-run the year filter only.
    pub fn with_year(mut self, sales: &[SalesLine], year: i32) -> Self {
        self.selected_year = year;
        self.filtered = year_chart(sales, year);
        self
    }

    /// Charts in page order, the filtered one last.
    pub fn all_charts(&self) -> impl Iterator<Item = &Chart> {
        self.charts.iter().chain(std::iter::once(&self.filtered))
    }
}

/// Chart of sales for a single year.
pub fn year_chart(sales: &[SalesLine], year: i32) -> Chart {
    Chart {
        heading: format!("Sales in {}", year),
        title: None,
        kind: ChartKind::Line,
        x_label: "orderDate".to_string(),
        y_label: "totalSales".to_string(),
        value_format: ValueFormat::Currency,
        points: date_points(&filtered_sales_over_time(sales, year)),
    }
}

fn sales_trend_chart(sales: &[SalesLine]) -> Chart {
    Chart {
        heading: "Total Sales Over Time".to_string(),
        title: Some("Sales Trend".to_string()),
        kind: ChartKind::Line,
        x_label: "orderDate".to_string(),
        y_label: "totalSales".to_string(),
        value_format: ValueFormat::Currency,
        points: date_points(&sales_over_time(sales)),
    }
}

fn top_products_chart(joined: &JoinedData, n: usize) -> Chart {
    Chart {
        heading: format!("Top {} Products by Sales", n),
        title: Some("Top Products by Sales".to_string()),
        kind: ChartKind::Bar,
        x_label: "productName".to_string(),
        y_label: "totalSales".to_string(),
        value_format: ValueFormat::Currency,
        points: top_products(&joined.product_sales, n)
            .into_iter()
            .map(|p| ChartPoint::new(p.name, p.total_sales))
            .collect(),
    }
}

fn customers_by_country_chart(customers: &[Customer]) -> Chart {
    Chart {
        heading: "Customer Distribution by Country".to_string(),
        title: Some("Customers by Country".to_string()),
        kind: ChartKind::Pie,
        x_label: "country".to_string(),
        y_label: "customerCount".to_string(),
        value_format: ValueFormat::Count,
        points: customers_by_country(customers)
            .into_iter()
            .map(|c| ChartPoint::new(c.name, c.count as f64))
            .collect(),
    }
}

fn products_by_country_chart(joined: &JoinedData, n: usize) -> Chart {
    Chart {
        heading: "Most Ordered Products by Customer Country".to_string(),
        title: Some(format!("Top {} Most Ordered Products by Country", n)),
        kind: ChartKind::GroupedBar,
        x_label: "country".to_string(),
        y_label: "orderCount".to_string(),
        value_format: ValueFormat::Count,
        points: top_products_by_country(&joined.country_products, n)
            .into_iter()
            .map(|c| ChartPoint {
                group: Some(c.product_name),
                ..ChartPoint::new(c.country, c.order_count as f64)
            })
            .collect(),
    }
}

fn employee_sales_chart(sales: &[SalesLine]) -> Chart {
    Chart {
        heading: "Sales by Employee".to_string(),
        title: Some("Total Sales by Employee".to_string()),
        kind: ChartKind::Bar,
        x_label: "employeeName".to_string(),
        y_label: "totalSales".to_string(),
        value_format: ValueFormat::Currency,
        points: sales_by_employee(sales)
            .into_iter()
            .map(|e| ChartPoint {
                text: Some(e.label),
                ..ChartPoint::new(e.employee_name, e.total_sales)
            })
            .collect(),
    }
}

fn shipper_chart(joined: &JoinedData) -> Chart {
    Chart {
        heading: "Order Distribution by Shipping Company".to_string(),
        title: Some("Orders by Shipping Company".to_string()),
        kind: ChartKind::Pie,
        x_label: "companyName".to_string(),
        y_label: "orderCount".to_string(),
        value_format: ValueFormat::Count,
        points: orders_by_shipper(&joined.orders)
            .into_iter()
            .map(|c| ChartPoint::new(c.name, c.count as f64))
            .collect(),
    }
}

fn date_points(series: &[DatedTotal]) -> Vec<ChartPoint> {
    series
        .iter()
        .map(|p| ChartPoint::new(date_label(p.date), p.total_sales))
        .collect()
}

/// `YYYY-MM-DD`, with the time only when it is not midnight.
pub fn date_label(date: NaiveDateTime) -> String {
    if date.num_seconds_from_midnight() == 0 && date.nanosecond() == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::join_tables;
    use crate::models::{Employee, Order, OrderDetail, Product, Shipper, Tables};
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn tables() -> Tables {
        let order = |order_id, date| Order {
            order_id,
            customer_id: Some("ALFKI".to_string()),
            employee_id: Some(1),
            order_date: date,
            ship_via: Some(1),
        };
        let detail = |order_id, unit_price| OrderDetail {
            order_id,
            product_id: Some(11),
            unit_price: Some(unit_price),
            quantity: Some(1.0),
            discount: Some(0.0),
        };

        Tables {
            orders: vec![order(1, at(1996, 7, 4)), order(2, at(1997, 3, 1))],
            order_details: vec![detail(1, 10.0), detail(2, 20.0)],
            products: vec![Product {
                product_id: 11,
                product_name: Some("Queso Cabrales".to_string()),
                unit_price: Some(21.0),
            }],
            customers: vec![Customer {
                customer_id: Some("ALFKI".to_string()),
                country: Some("Germany".to_string()),
            }],
            shippers: vec![Shipper {
                shipper_id: 1,
                company_name: Some("Speedy Express".to_string()),
            }],
            employees: vec![Employee {
                employee_id: 1,
                first_name: Some("Nancy".to_string()),
                last_name: Some("Davolio".to_string()),
            }],
        }
    }

    #[test]
    fn test_build_has_all_charts() {
        let t = tables();
        let joined = join_tables(&t);
        let dashboard = Dashboard::build(&joined, &t.customers, ChartLimits::default(), 1997);

        let headings: Vec<&str> = dashboard.all_charts().map(|c| c.heading.as_str()).collect();
        assert_eq!(
            headings,
            vec![
                "Total Sales Over Time",
                "Top 10 Products by Sales",
                "Customer Distribution by Country",
                "Most Ordered Products by Customer Country",
                "Sales by Employee",
                "Order Distribution by Shipping Company",
                "Sales in 1997",
            ]
        );
        assert_eq!(dashboard.filtered.points.len(), 1);
        assert_eq!(dashboard.filtered.points[0].x, "1997-03-01");
        assert_eq!(dashboard.charts[4].points[0].text.as_deref(), Some("30.00"));
        assert_eq!(dashboard.charts[3].points[0].group.as_deref(), Some("Queso Cabrales"));
    }

    #[test]
    fn test_with_year_only_touches_filtered_chart() {
        let t = tables();
        let joined = join_tables(&t);
        let dashboard = Dashboard::build(&joined, &t.customers, ChartLimits::default(), 1997);
        let before = dashboard.charts.clone();

        let updated = dashboard.with_year(&joined.sales, 1996);

        assert_eq!(updated.charts, before);
        assert_eq!(updated.selected_year, 1996);
        assert_eq!(updated.filtered.heading, "Sales in 1996");
        assert_eq!(updated.filtered.points[0].y, 10.0);
    }

    #[test]
    fn test_date_label() {
        assert_eq!(date_label(at(1996, 7, 4).unwrap()), "1996-07-04");
        let noon = NaiveDate::from_ymd_opt(1996, 7, 4)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .unwrap();
        assert_eq!(date_label(noon), "1996-07-04 12:30:00");
    }

    #[test]
    fn test_value_format() {
        assert_eq!(ValueFormat::Currency.format(1234.5), "1234.50");
        assert_eq!(ValueFormat::Count.format(12.0), "12");
    }
}
