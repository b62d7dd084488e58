//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.northwind.toml` files.

use crate::cli::OutputFormat;
use crate::dashboard::{ChartLimits, DASHBOARD_TITLE};
use crate::loader::TablePaths;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up by default.
pub const CONFIG_FILE_NAME: &str = ".northwind.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Chart settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Location and format of the CSV export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV files.
    #[serde(default = "default_dir")]
    pub dir: String,

    #[serde(default = "default_orders")]
    pub orders: String,

    #[serde(default = "default_order_details")]
    pub order_details: String,

    #[serde(default = "default_products")]
    pub products: String,

    #[serde(default = "default_customers")]
    pub customers: String,

    #[serde(default = "default_shippers")]
    pub shippers: String,

    #[serde(default = "default_employees")]
    pub employees: String,

    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            orders: default_orders(),
            order_details: default_order_details(),
            products: default_products(),
            customers: default_customers(),
            shippers: default_shippers(),
            employees: default_employees(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_dir() -> String {
    ".".to_string()
}

fn default_orders() -> String {
    "orders.csv".to_string()
}

fn default_order_details() -> String {
    "order-details.csv".to_string()
}

fn default_products() -> String {
    "products.csv".to_string()
}

fn default_customers() -> String {
    "customers.csv".to_string()
}

fn default_shippers() -> String {
    "shippers.csv".to_string()
}

fn default_employees() -> String {
    "employees.csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl DataConfig {
    /// Resolve the six file paths against `dir`.
    pub fn table_paths(&self) -> TablePaths {
        let dir = Path::new(&self.dir);
        TablePaths {
            orders: dir.join(&self.orders),
            order_details: dir.join(&self.order_details),
            products: dir.join(&self.products),
            customers: dir.join(&self.customers),
            shippers: dir.join(&self.shippers),
            employees: dir.join(&self.employees),
        }
    }

    /// The delimiter as a byte.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter must be ASCII, got {:?}", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }
}

/// Chart settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Products shown in the top-products chart.
    #[serde(default = "default_top_products")]
    pub top_products: usize,

    /// Products shown per country.
    #[serde(default = "default_top_per_country")]
    pub top_per_country: usize,

    /// Lowest selectable year. Defaults to the earliest order year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i32>,

    /// Highest selectable year. Defaults to the latest order year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i32>,

    /// Year selected when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_year: Option<i32>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_products: default_top_products(),
            top_per_country: default_top_per_country(),
            year_min: None,
            year_max: None,
            default_year: None,
        }
    }
}

fn default_top_products() -> usize {
    10
}

fn default_top_per_country() -> usize {
    5
}

impl DashboardConfig {
    pub fn limits(&self) -> ChartLimits {
        ChartLimits {
            top_products: self.top_products,
            top_per_country: self.top_per_country,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Report title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Width of the text bars.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
            title: default_title(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_output() -> String {
    "northwind_dashboard.md".to_string()
}

fn default_title() -> String {
    DASHBOARD_TITLE.to_string()
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory, e.g. the data directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.data.dir = dir.to_string_lossy().to_string();
        }
        if let Some(delimiter) = args.delimiter {
            self.data.delimiter = delimiter;
        }

        if let Some(ref output) = args.output {
            self.report.output = output.to_string_lossy().to_string();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(width) = args.bar_width {
            self.report.bar_width = width;
        }
    }

    /// Output path, or `None` for stdout.
    pub fn output_path(&self) -> Option<PathBuf> {
        (self.report.output != "-").then(|| PathBuf::from(&self.report.output))
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
