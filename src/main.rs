//! Northwind Dashboard - sales charts from the Northwind Traders export
//!
//! A CLI tool that loads the six Northwind CSV tables, joins them in
//! memory, and renders seven descriptive charts as a Markdown or JSON
//! report, with an optional interactive year selector.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, missing or malformed input, invalid year)

mod analysis;
mod cli;
mod config;
mod dashboard;
mod interactive;
mod join;
mod loader;
mod models;
mod report;

use analysis::YearRange;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use dashboard::Dashboard;
use indicatif::{ProgressBar, ProgressStyle};
use models::{DataQuality, Report, ReportMetadata, TableKind};
use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Northwind Dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_dashboard(args) {
        error!("Dashboard failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .northwind.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the data directory, file names, and chart sizes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so the report can be written to stdout.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete load, join, aggregate and render workflow.
fn run_dashboard(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Step 1: Load the tables
    let paths = config.data.table_paths();
    let delimiter = config.data.delimiter_byte()?;
    info!("Loading tables from {}", config.data.dir);

    let progress = load_progress(args.quiet);
    let (tables, load_report) = loader::load_tables(&paths, delimiter, |table| {
        progress.set_message(table.to_string());
        progress.inc(1);
    })
    .with_context(|| format!("Failed to load data from {}", config.data.dir))?;
    progress.finish_and_clear();

    if load_report.total_rejected() > 0 {
        warn!(
            "{} rows were dropped for invalid identifiers; see the Data Quality section",
            load_report.total_rejected()
        );
    }

    // Step 2: Join
    let joined = join::join_tables(&tables);
    info!(
        "Joined {} sales lines from {} orders",
        joined.sales.len(),
        joined.orders.len()
    );

    // Step 3: Resolve the year selection
    let dashboard_config = &config.dashboard;
    let range = YearRange::observe(&joined.sales).pinned(
        dashboard_config.year_min,
        dashboard_config.year_max,
        dashboard_config.default_year,
    )?;
    let year = range.check(args.year.unwrap_or(range.default))?;
    debug!("Year range {:?}, selected {}", range, year);

    // Step 4: Aggregate and build the charts
    let dashboard = Dashboard::build(&joined, &tables.customers, dashboard_config.limits(), year);

    let report = Report {
        metadata: ReportMetadata {
            title: config.report.title.clone(),
            data_dir: config.data.dir.clone(),
            generated_at: Utc::now(),
            selected_year: year,
            year_range: range,
            total_sales: analysis::grand_total(&joined.sales),
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        dashboard,
        data_quality: DataQuality {
            load: load_report,
            joins: joined.stats.clone(),
        },
    };

    // Step 5: Render and write
    let output = report::render_report(&report, config.report.format, config.report.bar_width)?;

    match config.output_path() {
        Some(path) => {
            std::fs::write(&path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !args.quiet {
                println!("✅ Dashboard written to: {}", path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    // Step 6: Optional year selector
    if args.interactive {
        let stdin = io::stdin();
        interactive::run_year_prompt(
            stdin.lock(),
            io::stdout(),
            report.dashboard,
            &joined.sales,
            &range,
            config.report.bar_width,
        )?;
    }

    Ok(())
}

/// Progress bar over the six table loads, hidden in quiet mode.
fn load_progress(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let progress = ProgressBar::new(TableKind::ALL.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    progress
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Then the data directory, then the working directory
    if let Some(ref data_dir) = args.data_dir {
        match Config::load_from_dir(data_dir) {
            Ok(Some(config)) => {
                info!("Loaded config from {}", data_dir.join(CONFIG_FILE_NAME).display());
                return Ok(config);
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to load config: {}", e),
        }
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DataConfig;
    use crate::dashboard::ChartLimits;
    use clap::Parser;
    use tempfile::TempDir;

    fn fixture_config() -> DataConfig {
        DataConfig {
            dir: format!("{}/fixtures/northwind", env!("CARGO_MANIFEST_DIR")),
            ..DataConfig::default()
        }
    }

    fn rows_for(report: &models::LoadReport, table: TableKind) -> (usize, usize) {
        report
            .tables
            .iter()
            .find(|summary| summary.table == table)
            .map(|summary| (summary.rows, summary.rejected.len()))
            .unwrap()
    }

    #[test]
    fn test_fixture_dashboard_end_to_end() {
        let data = fixture_config();
        let mut loaded = Vec::new();
        let (tables, load_report) =
            loader::load_tables(&data.table_paths(), b',', |table| loaded.push(table)).unwrap();

        assert_eq!(loaded.len(), TableKind::ALL.len());
        assert_eq!(rows_for(&load_report, TableKind::Orders), (12, 1));
        assert_eq!(rows_for(&load_report, TableKind::OrderDetails), (27, 1));
        assert_eq!(rows_for(&load_report, TableKind::Products), (21, 1));
        assert_eq!(load_report.total_rejected(), 3);

        let joined = join::join_tables(&tables);
        assert_eq!(joined.sales.len(), 26);
        assert_eq!(joined.stats.details_without_order, 1);
        assert_eq!(joined.stats.orders_without_shipper, 1);
        assert_eq!(joined.stats.lines_without_employee, 1);

        let range = YearRange::observe(&joined.sales);
        assert_eq!(range, YearRange { min: 1996, max: 1998, default: 1997 });

        let dashboard = Dashboard::build(
            &joined,
            &tables.customers,
            ChartLimits::default(),
            range.default,
        );
        assert_eq!(dashboard.all_charts().count(), 7);
        assert!(dashboard
            .filtered
            .points
            .iter()
            .all(|p| p.x.starts_with("1997")));

        let report = Report {
            metadata: ReportMetadata {
                title: dashboard::DASHBOARD_TITLE.to_string(),
                data_dir: data.dir.clone(),
                generated_at: Utc::now(),
                selected_year: range.default,
                year_range: range,
                total_sales: analysis::grand_total(&joined.sales),
                duration_seconds: 0.0,
            },
            dashboard,
            data_quality: DataQuality {
                load: load_report,
                joins: joined.stats.clone(),
            },
        };

        let markdown = report::render_report(&report, cli::OutputFormat::Markdown, 20).unwrap();
        for heading in [
            "## Total Sales Over Time",
            "## Top 10 Products by Sales",
            "## Customer Distribution by Country",
            "## Most Ordered Products by Customer Country",
            "## Sales by Employee",
            "## Order Distribution by Shipping Company",
            "## Sales in 1997",
        ] {
            assert!(markdown.contains(heading), "missing {}", heading);
        }

        let json = report::render_report(&report, cli::OutputFormat::Json, 20).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["selected_year"], 1997);
    }

    #[test]
    fn test_load_config_prefers_data_dir_file() {
        let data_dir = TempDir::new().unwrap();
        std::fs::write(
            data_dir.path().join(CONFIG_FILE_NAME),
            "[dashboard]\ntop_per_country = 3\n",
        )
        .unwrap();
        let dir_arg = data_dir.path().to_string_lossy().to_string();

        let args = Args::parse_from(["northwind", "-d", dir_arg.as_str()]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.dashboard.top_per_country, 3);

        // an explicit --config wins over the data directory
        let other = TempDir::new().unwrap();
        let explicit = other.path().join("custom.toml");
        std::fs::write(&explicit, "[dashboard]\ntop_per_country = 7\n").unwrap();
        let explicit_arg = explicit.to_string_lossy().to_string();

        let args = Args::parse_from([
            "northwind",
            "-d",
            dir_arg.as_str(),
            "-c",
            explicit_arg.as_str(),
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.dashboard.top_per_country, 7);
    }
}
