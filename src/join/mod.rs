//! Derived relations built from the loaded tables.
//!
//! The join sequence is fixed:
//!
//! - orders ⟕ shippers (shipVia = shipperID) gives [`ShippedOrder`]
//! - shipped orders ⋈ order details ⟕ employees gives [`SalesLine`]
//! - order details ⋈ products gives [`ProductSale`]
//! - shipped orders ⋈ customers ⋈ order details ⋈ products gives
//!   [`CountryProductLine`]

pub mod relational;

use crate::models::{
    line_total, Customer, Employee, Order, OrderDetail, Product, Shipper, Tables,
};
use chrono::NaiveDateTime;
use relational::{inner_join, left_join};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// An order with its shipper resolved to a company name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippedOrder {
    pub order_id: i64,
    pub customer_id: Option<String>,
    pub employee_id: Option<i64>,
    pub order_date: Option<NaiveDateTime>,
    /// `None` when `shipVia` matched no shipper.
    pub company_name: Option<String>,
}

/// One order line with employee and shipper attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesLine {
    pub order_id: i64,
    pub customer_id: Option<String>,
    pub employee_id: Option<i64>,
    pub order_date: Option<NaiveDateTime>,
    pub company_name: Option<String>,
    pub product_id: Option<i64>,
    pub unit_price: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
    pub employee_name: Option<String>,
    pub total_sales: Option<f64>,
}

/// One order line joined to its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSale {
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: Option<String>,
    /// Price charged on the order line.
    pub unit_price: Option<f64>,
    /// Catalogue price from `products`.
    pub list_price: Option<f64>,
    pub quantity: Option<f64>,
    pub discount: Option<f64>,
    pub total_sales: Option<f64>,
}

/// One order line attributed to the customer's country and the product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProductLine {
    pub order_id: i64,
    pub customer_id: String,
    pub country: Option<String>,
    pub product_id: i64,
    pub product_name: Option<String>,
}

/// Rows that the joins left unmatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    /// Orders whose `shipVia` matched no shipper.
    pub orders_without_shipper: usize,
    /// Sales lines whose `employeeID` matched no employee.
    pub lines_without_employee: usize,
    /// Order details whose order is absent from `orders`.
    pub details_without_order: usize,
    /// Order details whose product is absent from `products`.
    pub details_without_product: usize,
}

/// Every derived relation needed by the dashboard.
#[derive(Debug, Clone, Default)]
pub struct JoinedData {
    pub orders: Vec<ShippedOrder>,
    pub sales: Vec<SalesLine>,
    pub product_sales: Vec<ProductSale>,
    pub country_products: Vec<CountryProductLine>,
    pub stats: JoinStats,
}

/// Run the full join sequence.
pub fn join_tables(tables: &Tables) -> JoinedData {
    let orders = orders_with_shipper(&tables.orders, &tables.shippers);
    let sales = sales_data(&orders, &tables.order_details, &tables.employees);
    let product_sales = product_sales(&tables.order_details, &tables.products);
    let country_products = order_customer_product(
        &orders,
        &tables.customers,
        &tables.order_details,
        &tables.products,
    );

    let order_ids: HashSet<i64> = tables.orders.iter().map(|o| o.order_id).collect();
    let product_ids: HashSet<i64> = tables.products.iter().map(|p| p.product_id).collect();
    let shipper_ids: HashSet<i64> = tables.shippers.iter().map(|s| s.shipper_id).collect();
    let employee_ids: HashSet<i64> = tables.employees.iter().map(|e| e.employee_id).collect();
    let matches = |ids: &HashSet<i64>, key: Option<i64>| key.is_some_and(|k| ids.contains(&k));

    let stats = JoinStats {
        orders_without_shipper: tables
            .orders
            .iter()
            .filter(|o| !matches(&shipper_ids, o.ship_via))
            .count(),
        lines_without_employee: sales
            .iter()
            .filter(|s| !matches(&employee_ids, s.employee_id))
            .count(),
        details_without_order: tables
            .order_details
            .iter()
            .filter(|d| !order_ids.contains(&d.order_id))
            .count(),
        details_without_product: tables
            .order_details
            .iter()
            .filter(|d| !matches(&product_ids, d.product_id))
            .count(),
    };

    debug!(
        "Joined {} orders, {} sales lines, {} product lines, {} country lines",
        orders.len(),
        sales.len(),
        product_sales.len(),
        country_products.len()
    );

    JoinedData {
        orders,
        sales,
        product_sales,
        country_products,
        stats,
    }
}

/// Left join orders to shippers on `shipVia = shipperID`.
pub fn orders_with_shipper(orders: &[Order], shippers: &[Shipper]) -> Vec<ShippedOrder> {
    left_join(
        orders,
        shippers,
        |o| o.ship_via,
        |s| Some(s.shipper_id),
        |o, s| ShippedOrder {
            order_id: o.order_id,
            customer_id: o.customer_id.clone(),
            employee_id: o.employee_id,
            order_date: o.order_date,
            company_name: s.and_then(|s| s.company_name.clone()),
        },
    )
}

/// Inner join shipped orders to order details, then left join employees.
pub fn sales_data(
    orders: &[ShippedOrder],
    details: &[OrderDetail],
    employees: &[Employee],
) -> Vec<SalesLine> {
    let order_lines = inner_join(
        orders,
        details,
        |o| Some(o.order_id),
        |d| Some(d.order_id),
        |o, d| (o, d),
    );

    left_join(
        &order_lines,
        employees,
        |(o, _)| o.employee_id,
        |e| Some(e.employee_id),
        |(o, d), e| SalesLine {
            order_id: o.order_id,
            customer_id: o.customer_id.clone(),
            employee_id: o.employee_id,
            order_date: o.order_date,
            company_name: o.company_name.clone(),
            product_id: d.product_id,
            unit_price: d.unit_price,
            quantity: d.quantity,
            discount: d.discount,
            employee_name: e.and_then(Employee::full_name),
            total_sales: d.total_sales(),
        },
    )
}

/// Inner join order details to products on `productID`.
///
/// Line totals use the order-line price, not the catalogue price.
pub fn product_sales(details: &[OrderDetail], products: &[Product]) -> Vec<ProductSale> {
    inner_join(
        details,
        products,
        |d| d.product_id,
        |p| Some(p.product_id),
        |d, p| ProductSale {
            order_id: d.order_id,
            product_id: p.product_id,
            product_name: p.product_name.clone(),
            unit_price: d.unit_price,
            list_price: p.unit_price,
            quantity: d.quantity,
            discount: d.discount,
            total_sales: line_total(d.unit_price, d.quantity, d.discount),
        },
    )
}

/// Inner join shipped orders to customers, order details and products.
pub fn order_customer_product(
    orders: &[ShippedOrder],
    customers: &[Customer],
    details: &[OrderDetail],
    products: &[Product],
) -> Vec<CountryProductLine> {
    let order_customers = inner_join(
        orders,
        customers,
        |o| o.customer_id.clone(),
        |c| c.customer_id.clone(),
        |o, c| (o, c),
    );

    let order_lines = inner_join(
        &order_customers,
        details,
        |(o, _)| Some(o.order_id),
        |d| Some(d.order_id),
        |&(o, c), d| (o, c, d),
    );

    inner_join(
        &order_lines,
        products,
        |(_, _, d)| d.product_id,
        |p| Some(p.product_id),
        |(o, c, _), p| CountryProductLine {
            order_id: o.order_id,
            customer_id: c.customer_id.clone().unwrap_or_default(),
            country: c.country.clone(),
            product_id: p.product_id,
            product_name: p.product_name.clone(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn order(
        order_id: i64,
        customer: &str,
        employee: Option<i64>,
        ship_via: Option<i64>,
    ) -> Order {
        Order {
            order_id,
            customer_id: Some(customer.to_string()),
            employee_id: employee,
            order_date: date(1997, 1, 1),
            ship_via,
        }
    }

    fn detail(
        order_id: i64,
        product_id: i64,
        unit_price: f64,
        quantity: f64,
        discount: f64,
    ) -> OrderDetail {
        OrderDetail {
            order_id,
            product_id: Some(product_id),
            unit_price: Some(unit_price),
            quantity: Some(quantity),
            discount: Some(discount),
        }
    }

    fn tables() -> Tables {
        Tables {
            orders: vec![
                order(1, "ALFKI", Some(1), Some(1)),
                order(2, "BONAP", Some(99), Some(7)),
                order(3, "NOBODY", Some(1), Some(2)),
            ],
            order_details: vec![
                detail(1, 10, 10.0, 3.0, 0.1),
                detail(1, 20, 5.0, 2.0, 0.0),
                detail(2, 10, 12.0, 1.0, 0.0),
                detail(3, 20, 4.0, 1.0, 0.0),
                detail(4, 10, 1.0, 1.0, 0.0),
            ],
            products: vec![
                Product {
                    product_id: 10,
                    product_name: Some("Chai".to_string()),
                    unit_price: Some(18.0),
                },
                Product {
                    product_id: 20,
                    product_name: Some("Chang".to_string()),
                    unit_price: Some(19.0),
                },
            ],
            customers: vec![
                Customer {
                    customer_id: Some("ALFKI".to_string()),
                    country: Some("Germany".to_string()),
                },
                Customer {
                    customer_id: Some("BONAP".to_string()),
                    country: Some("France".to_string()),
                },
            ],
            shippers: vec![
                Shipper {
                    shipper_id: 1,
                    company_name: Some("Speedy Express".to_string()),
                },
                Shipper {
                    shipper_id: 2,
                    company_name: Some("United Package".to_string()),
                },
            ],
            employees: vec![Employee {
                employee_id: 1,
                first_name: Some("Nancy".to_string()),
                last_name: Some("Davolio".to_string()),
            }],
        }
    }

    #[test]
    fn test_orders_with_shipper_is_left_join() {
        let t = tables();
        let shipped = orders_with_shipper(&t.orders, &t.shippers);

        assert_eq!(shipped.len(), 3);
        assert_eq!(shipped[0].company_name.as_deref(), Some("Speedy Express"));
        assert_eq!(shipped[1].company_name, None);
        assert_eq!(shipped[2].company_name.as_deref(), Some("United Package"));
    }

    #[test]
    fn test_sales_data_attribution() {
        let t = tables();
        let shipped = orders_with_shipper(&t.orders, &t.shippers);
        let sales = sales_data(&shipped, &t.order_details, &t.employees);

        // detail for order 4 has no order and is dropped
        assert_eq!(sales.len(), 4);
        assert_eq!(sales[0].employee_name.as_deref(), Some("Nancy Davolio"));
        assert!((sales[0].total_sales.unwrap() - 27.0).abs() < 1e-9);
        assert_eq!(sales[2].order_id, 2);
        assert_eq!(sales[2].employee_name, None);
        assert_eq!(sales[2].company_name, None);
    }

    #[test]
    fn test_product_sales_uses_line_price() {
        let t = tables();
        let lines = product_sales(&t.order_details, &t.products);

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].unit_price, Some(10.0));
        assert_eq!(lines[0].list_price, Some(18.0));
        assert!((lines[0].total_sales.unwrap() - 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_order_customer_product_is_inner() {
        let t = tables();
        let shipped = orders_with_shipper(&t.orders, &t.shippers);
        let lines =
            order_customer_product(&shipped, &t.customers, &t.order_details, &t.products);

        // order 3's customer is unknown
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.order_id != 3));
        assert_eq!(lines[0].country.as_deref(), Some("Germany"));
        assert_eq!(lines[2].country.as_deref(), Some("France"));
        assert_eq!(lines[2].product_name.as_deref(), Some("Chai"));
    }

    #[test]
    fn test_join_stats() {
        let joined = join_tables(&tables());

        assert_eq!(joined.stats.orders_without_shipper, 1);
        assert_eq!(joined.stats.lines_without_employee, 1);
        assert_eq!(joined.stats.details_without_order, 1);
        assert_eq!(joined.stats.details_without_product, 0);
    }

    #[test]
    fn test_join_stats_count_key_mismatches_only() {
        let mut t = tables();
        t.shippers[0].company_name = None;
        t.employees[0].last_name = None;

        let joined = join_tables(&t);

        // matched rows with a missing name are not mismatches
        assert!(joined.sales.iter().all(|s| s.employee_name.is_none()));
        assert_eq!(joined.stats.lines_without_employee, 1);
        assert_eq!(joined.orders.iter().filter(|o| o.company_name.is_none()).count(), 2);
        assert_eq!(joined.stats.orders_without_shipper, 1);
    }
}
