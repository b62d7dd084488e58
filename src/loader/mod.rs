//! CSV loading for the six Northwind tables.
//!
//! Columns are located by header name. Identifier columns are coerced to
//! integers under the table's [`KeyPolicy`]: orders, order details and
//! products drop bad rows and report them, shippers and employees abort
//! the load.

pub mod coerce;

use crate::models::{
    Customer, Employee, KeyPolicy, LoadReport, Loaded, Order, OrderDetail, Product, RejectedRow,
    Shipper, TableKind, Tables,
};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised while loading the input tables.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {table}: {source}")]
    Csv {
        table: TableKind,
        #[source]
        source: csv::Error,
    },

    #[error("{table} is missing required column `{column}`")]
    MissingColumn {
        table: TableKind,
        column: &'static str,
    },

    #[error("{table} line {line}: `{column}` value {value:?} is not a valid identifier")]
    InvalidKey {
        table: TableKind,
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// Locations of the six input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePaths {
    pub orders: PathBuf,
    pub order_details: PathBuf,
    pub products: PathBuf,
    pub customers: PathBuf,
    pub shippers: PathBuf,
    pub employees: PathBuf,
}

impl TablePaths {
    pub fn path(&self, table: TableKind) -> &Path {
        match table {
            TableKind::Orders => &self.orders,
            TableKind::OrderDetails => &self.order_details,
            TableKind::Products => &self.products,
            TableKind::Customers => &self.customers,
            TableKind::Shippers => &self.shippers,
            TableKind::Employees => &self.employees,
        }
    }
}

/// Load all six tables from disk.
///
/// `on_loaded` is invoked after each table so callers can report progress.
pub fn load_tables(
    paths: &TablePaths,
    delimiter: u8,
    mut on_loaded: impl FnMut(TableKind),
) -> Result<(Tables, LoadReport), LoadError> {
    let mut report = LoadReport::default();

    let orders = read_orders(open(paths, TableKind::Orders)?, delimiter)?;
    let orders = track(TableKind::Orders, orders, &mut report, &mut on_loaded);

    let order_details = read_order_details(open(paths, TableKind::OrderDetails)?, delimiter)?;
    let order_details = track(
        TableKind::OrderDetails,
        order_details,
        &mut report,
        &mut on_loaded,
    );

    let products = read_products(open(paths, TableKind::Products)?, delimiter)?;
    let products = track(TableKind::Products, products, &mut report, &mut on_loaded);

    let customers = read_customers(open(paths, TableKind::Customers)?, delimiter)?;
    let customers = track(TableKind::Customers, customers, &mut report, &mut on_loaded);

    let shippers = read_shippers(open(paths, TableKind::Shippers)?, delimiter)?;
    let shippers = track(TableKind::Shippers, shippers, &mut report, &mut on_loaded);

    let employees = read_employees(open(paths, TableKind::Employees)?, delimiter)?;
    let employees = track(TableKind::Employees, employees, &mut report, &mut on_loaded);

    Ok((
        Tables {
            orders,
            order_details,
            products,
            customers,
            shippers,
            employees,
        },
        report,
    ))
}

fn open(paths: &TablePaths, table: TableKind) -> Result<File, LoadError> {
    let path = paths.path(table);
    debug!("Opening {} at {}", table, path.display());
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn track<T>(
    table: TableKind,
    loaded: Loaded<T>,
    report: &mut LoadReport,
    on_loaded: &mut impl FnMut(TableKind),
) -> Vec<T> {
    report.record(table, &loaded);

    if loaded.rejected.is_empty() {
        info!("Loaded {} rows from {}", loaded.rows.len(), table);
    } else {
        warn!(
            "Loaded {} rows from {}, dropped {} with invalid identifiers",
            loaded.rows.len(),
            table,
            loaded.rejected.len()
        );
    }

    on_loaded(table);
    loaded.rows
}

/// Read `orders`. Rows with a bad `orderID` are dropped.
pub fn read_orders<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<Order>, LoadError> {
    let table = TableKind::Orders;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let order_id = columns.required("orderID")?;
    let customer_id = columns.optional("customerID");
    let employee_id = columns.optional("employeeID");
    let order_date = columns.optional("orderDate");
    let ship_via = columns.optional("shipVia");

    collect_rows(table, csv, |record| {
        let order_id = match coerce_key(table, record, order_id, "orderID")? {
            Outcome::Row(id) => id,
            Outcome::Rejected(row) => return Ok(Outcome::Rejected(row)),
        };

        Ok(Outcome::Row(Order {
            order_id,
            customer_id: coerce::text(field(record, customer_id)),
            employee_id: coerce::identifier(field(record, employee_id)),
            order_date: coerce::timestamp(field(record, order_date)),
            ship_via: coerce::identifier(field(record, ship_via)),
        }))
    })
}

/// Read `order-details`. Rows with a bad `orderID` are dropped.
pub fn read_order_details<R: Read>(
    reader: R,
    delimiter: u8,
) -> Result<Loaded<OrderDetail>, LoadError> {
    let table = TableKind::OrderDetails;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let order_id = columns.required("orderID")?;
    let product_id = columns.required("productID")?;
    let unit_price = columns.required("unitPrice")?;
    let quantity = columns.required("quantity")?;
    let discount = columns.required("discount")?;

    collect_rows(table, csv, |record| {
        let order_id = match coerce_key(table, record, order_id, "orderID")? {
            Outcome::Row(id) => id,
            Outcome::Rejected(row) => return Ok(Outcome::Rejected(row)),
        };

        Ok(Outcome::Row(OrderDetail {
            order_id,
            product_id: coerce::identifier(field(record, Some(product_id))),
            unit_price: coerce::number(field(record, Some(unit_price))),
            quantity: coerce::number(field(record, Some(quantity))),
            discount: coerce::number(field(record, Some(discount))),
        }))
    })
}

/// Read `products`. Rows with a bad `productID` are dropped.
pub fn read_products<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<Product>, LoadError> {
    let table = TableKind::Products;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let product_id = columns.required("productID")?;
    let product_name = columns.required("productName")?;
    let unit_price = columns.optional("unitPrice");

    collect_rows(table, csv, |record| {
        let product_id = match coerce_key(table, record, product_id, "productID")? {
            Outcome::Row(id) => id,
            Outcome::Rejected(row) => return Ok(Outcome::Rejected(row)),
        };

        Ok(Outcome::Row(Product {
            product_id,
            product_name: coerce::text(field(record, Some(product_name))),
            unit_price: coerce::number(field(record, unit_price)),
        }))
    })
}

/// Read `customers`. Customers are keyed by text and never rejected.
pub fn read_customers<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<Customer>, LoadError> {
    let table = TableKind::Customers;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let customer_id = columns.required("customerID")?;
    let country = columns.required("country")?;

    collect_rows(table, csv, |record| {
        Ok(Outcome::Row(Customer {
            customer_id: coerce::text(field(record, Some(customer_id))),
            country: coerce::text(field(record, Some(country))),
        }))
    })
}

/// Read `shippers`. A bad `shipperID` fails the load.
pub fn read_shippers<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<Shipper>, LoadError> {
    let table = TableKind::Shippers;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let shipper_id = columns.required("shipperID")?;
    let company_name = columns.required("companyName")?;

    collect_rows(table, csv, |record| {
        let shipper_id = match coerce_key(table, record, shipper_id, "shipperID")? {
            Outcome::Row(id) => id,
            Outcome::Rejected(row) => return Ok(Outcome::Rejected(row)),
        };

        Ok(Outcome::Row(Shipper {
            shipper_id,
            company_name: coerce::text(field(record, Some(company_name))),
        }))
    })
}

/// Read `employees`. A bad `employeeID` fails the load.
pub fn read_employees<R: Read>(reader: R, delimiter: u8) -> Result<Loaded<Employee>, LoadError> {
    let table = TableKind::Employees;
    let mut csv = csv_reader(reader, delimiter);
    let columns = Columns::from_reader(table, &mut csv)?;

    let employee_id = columns.required("employeeID")?;
    let first_name = columns.required("firstName")?;
    let last_name = columns.required("lastName")?;

    collect_rows(table, csv, |record| {
        let employee_id = match coerce_key(table, record, employee_id, "employeeID")? {
            Outcome::Row(id) => id,
            Outcome::Rejected(row) => return Ok(Outcome::Rejected(row)),
        };

        Ok(Outcome::Row(Employee {
            employee_id,
            first_name: coerce::text(field(record, Some(first_name))),
            last_name: coerce::text(field(record, Some(last_name))),
        }))
    })
}

/// Result of parsing one record.
enum Outcome<T> {
    Row(T),
    Rejected(RejectedRow),
}

/// Header lookup for one table.
struct Columns {
    table: TableKind,
    headers: Vec<String>,
}

impl Columns {
    fn from_reader<R: Read>(
        table: TableKind,
        reader: &mut csv::Reader<R>,
    ) -> Result<Self, LoadError> {
        let headers = reader
            .headers()
            .map_err(|source| LoadError::Csv { table, source })?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        Ok(Self { table, headers })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn required(&self, name: &'static str) -> Result<usize, LoadError> {
        self.optional(name).ok_or(LoadError::MissingColumn {
            table: self.table,
            column: name,
        })
    }
}

fn csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn collect_rows<R: Read, T>(
    table: TableKind,
    mut reader: csv::Reader<R>,
    mut parse: impl FnMut(&StringRecord) -> Result<Outcome<T>, LoadError>,
) -> Result<Loaded<T>, LoadError> {
    let mut rows = Vec::new();
    let mut rejected = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| LoadError::Csv { table, source })?;
        match parse(&record)? {
            Outcome::Row(row) => rows.push(row),
            Outcome::Rejected(row) => {
                debug!(
                    "Dropping {} line {}: {} = {:?}",
                    table, row.line, row.column, row.value
                );
                rejected.push(row);
            }
        }
    }

    Ok(Loaded { rows, rejected })
}

/// Raw text of a column, empty when the column or field is absent.
fn field(record: &StringRecord, index: Option<usize>) -> &str {
    index.and_then(|i| record.get(i)).unwrap_or("")
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn coerce_key(
    table: TableKind,
    record: &StringRecord,
    index: usize,
    column: &'static str,
) -> Result<Outcome<i64>, LoadError> {
    let raw = field(record, Some(index));
    if let Some(id) = coerce::identifier(raw) {
        return Ok(Outcome::Row(id));
    }

    let line = record_line(record);
    match table.key_policy() {
        KeyPolicy::Drop => Ok(Outcome::Rejected(RejectedRow {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })),
        KeyPolicy::Fail => Err(LoadError::InvalidKey {
            table,
            line,
            column,
            value: raw.to_string(),
        }),
    }
}
