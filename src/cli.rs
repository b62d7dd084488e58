//! Command-line arguments.
//!
//! Flags left unset fall back to `.northwind.toml`, then to built-in
//! defaults.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Northwind Dashboard - sales charts from the Northwind Traders CSV export
///
/// Loads orders, order details, products, customers, shippers and
/// employees, joins them, and renders seven charts as a Markdown or JSON
/// report. The sales-by-year chart follows --year, or the years typed at
/// the --interactive prompt.
///
/// Examples:
///   northwind --data-dir ./northwind
///   northwind --data-dir ./northwind --year 1998 --output -
///   northwind --data-dir ./northwind --format json --output dashboard.json
///   northwind --data-dir ./northwind --interactive
///   northwind --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory containing the six CSV files
    ///
    /// Defaults to the `[data] dir` config value, or the current directory.
    #[arg(short, long, value_name = "DIR", env = "NORTHWIND_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Year shown in the "Sales in <year>" chart
    ///
    /// Must lie within the years present in the data. Defaults to the
    /// middle year of that range.
    #[arg(short, long, value_name = "YEAR")]
    pub year: Option<i32>,

    /// Output file path for the report (`-` for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .northwind.toml in the data directory,
    /// then in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Field delimiter of the CSV files
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Width of the text bars, in characters
    #[arg(long, value_name = "COLS")]
    pub bar_width: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Prompt for years after writing the report
    ///
    /// Each year entered re-renders the sales-by-year chart to stdout.
    /// Enter `q` to exit.
    #[arg(short, long)]
    pub interactive: bool,

    /// Generate a default .northwind.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.data_dir {
            if !dir.is_dir() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
        }

        if let Some(delimiter) = self.delimiter {
            if !delimiter.is_ascii() {
                return Err("Delimiter must be a single ASCII character".to_string());
            }
        }

        if self.bar_width == Some(0) {
            return Err("Bar width must be at least 1".to_string());
        }

        if self.interactive && self.writes_to_stdout() && self.format == Some(OutputFormat::Json) {
            return Err("Cannot combine --interactive with JSON output to stdout".to_string());
        }

        Ok(())
    }

    /// Whether the report goes to stdout rather than a file.
    pub fn writes_to_stdout(&self) -> bool {
        self.output.as_deref().is_some_and(|p| p.as_os_str() == "-")
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
