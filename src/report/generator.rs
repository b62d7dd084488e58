//! Markdown and JSON rendering of the dashboard.
//!
//! Charts are drawn as Markdown tables with unicode bars; line charts also
//! get a sparkline so the trend is visible at a glance.

use crate::cli::OutputFormat;
use crate::dashboard::{Chart, ChartKind};
use crate::models::{DataQuality, Report, ReportMetadata, TableSummary};
use anyhow::Result;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Rejected rows listed per table before the list is cut short.
const MAX_LISTED_REJECTIONS: usize = 20;

/// Render the report in the requested format.
pub fn render_report(report: &Report, format: OutputFormat, bar_width: usize) -> Result<String> {
    match format {
        OutputFormat::Markdown => Ok(generate_markdown_report(report, bar_width)),
        OutputFormat::Json => generate_json_report(report),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, bar_width: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", report.metadata.title));
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    for chart in report.dashboard.all_charts() {
        output.push_str(&render_chart(chart, bar_width));
    }

    output.push_str(&generate_data_quality_section(&report.data_quality));
    output.push_str(&generate_footer());

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Data Directory:** `{}`\n", metadata.data_dir));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Selected Year:** {} (available {}-{})\n",
        metadata.selected_year, metadata.year_range.min, metadata.year_range.max
    ));
    section.push_str(&format!("- **Total Sales:** {:.2}\n", metadata.total_sales));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for chart in report.dashboard.all_charts() {
        toc.push_str(&format!("- [{}](#{})\n", chart.heading, anchor(&chart.heading)));
    }
    toc.push_str("- [Data Quality](#data-quality)\n\n");

    toc
}

/// Render one chart as a Markdown section.
pub fn render_chart(chart: &Chart, bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", chart.heading));
    if let Some(ref title) = chart.title {
        section.push_str(&format!("*{}*\n\n", title));
    }

    if chart.points.is_empty() {
        section.push_str("No data.\n\n");
        return section;
    }

    match chart.kind {
        ChartKind::Line => section.push_str(&render_line(chart, bar_width)),
        ChartKind::Bar => section.push_str(&render_bar(chart, bar_width)),
        ChartKind::Pie => section.push_str(&render_pie(chart, bar_width)),
        ChartKind::GroupedBar => section.push_str(&render_grouped_bar(chart, bar_width)),
    }
    section.push('\n');

    section
}

fn render_line(chart: &Chart, bar_width: usize) -> String {
    let values: Vec<f64> = chart.points.iter().map(|p| p.y).collect();
    let mut out = format!("`{}`\n\n", sparkline(&values));

    out.push_str(&format!("| {} | {} | |\n", chart.x_label, chart.y_label));
    out.push_str("|:---|---:|:---|\n");

    let max = max_value(&values);
    for point in &chart.points {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            point.x,
            chart.value_format.format(point.y),
            bar(point.y, max, bar_width)
        ));
    }

    out
}

fn render_bar(chart: &Chart, bar_width: usize) -> String {
    let mut out = format!("| {} | {} | |\n", chart.x_label, chart.y_label);
    out.push_str("|:---|---:|:---|\n");

    let max = max_value(&chart.points.iter().map(|p| p.y).collect::<Vec<_>>());
    for point in &chart.points {
        let value = point
            .text
            .clone()
            .unwrap_or_else(|| chart.value_format.format(point.y));
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            point.x,
            value,
            bar(point.y, max, bar_width)
        ));
    }

    out
}

fn render_pie(chart: &Chart, bar_width: usize) -> String {
    let mut out = format!("| {} | {} | Share | |\n", chart.x_label, chart.y_label);
    out.push_str("|:---|---:|---:|:---|\n");

    let total: f64 = chart.points.iter().map(|p| p.y).sum();
    for point in &chart.points {
        let share = if total > 0.0 { point.y / total } else { 0.0 };
        out.push_str(&format!(
            "| {} | {} | {:.1}% | {} |\n",
            point.x,
            chart.value_format.format(point.y),
            share * 100.0,
            bar(share, 1.0, bar_width)
        ));
    }

    out
}

fn render_grouped_bar(chart: &Chart, bar_width: usize) -> String {
    let mut out = format!("| {} | Product | {} | |\n", chart.x_label, chart.y_label);
    out.push_str("|:---|:---|---:|:---|\n");

    let max = max_value(&chart.points.iter().map(|p| p.y).collect::<Vec<_>>());
    let mut previous: Option<&str> = None;
    for point in &chart.points {
        // print each group label once
        let x = if previous == Some(point.x.as_str()) {
            ""
        } else {
            point.x.as_str()
        };
        previous = Some(point.x.as_str());

        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            x,
            point.group.as_deref().unwrap_or(""),
            chart.value_format.format(point.y),
            bar(point.y, max, bar_width)
        ));
    }

    out
}

fn generate_data_quality_section(quality: &DataQuality) -> String {
    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str("| Table | Rows | Rejected |\n");
    section.push_str("|:---|---:|---:|\n");
    for table in &quality.load.tables {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            table.table,
            table.rows,
            table.rejected.len()
        ));
    }
    section.push('\n');

    for table in quality.load.tables.iter().filter(|t| !t.rejected.is_empty()) {
        section.push_str(&generate_rejections_block(table));
    }

    let joins = &quality.joins;
    section.push_str("### Unmatched Rows\n\n");
    section.push_str(&format!(
        "- Orders without a shipper: {}\n",
        joins.orders_without_shipper
    ));
    section.push_str(&format!(
        "- Sales lines without an employee: {}\n",
        joins.lines_without_employee
    ));
    section.push_str(&format!(
        "- Order details without an order: {}\n",
        joins.details_without_order
    ));
    section.push_str(&format!(
        "- Order details without a product: {}\n\n",
        joins.details_without_product
    ));

    section
}

fn generate_rejections_block(table: &TableSummary) -> String {
    let mut block = format!("### Rejected rows in {}\n\n", table.table);
    block.push_str("| Line | Column | Value |\n");
    block.push_str("|---:|:---|:---|\n");

    for row in table.rejected.iter().take(MAX_LISTED_REJECTIONS) {
        block.push_str(&format!("| {} | {} | `{}` |\n", row.line, row.column, row.value));
    }
    if table.rejected.len() > MAX_LISTED_REJECTIONS {
        block.push_str(&format!(
            "\n*... and {} more*\n",
            table.rejected.len() - MAX_LISTED_REJECTIONS
        ));
    }
    block.push('\n');

    block
}

fn generate_footer() -> String {
    "---\n\n*Generated by northwind-dashboard*\n".to_string()
}

fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}

/// A bar of `width` cells scaled so that `max` fills it.
fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let cells = ((value / max) * width as f64).round() as usize;
    "█".repeat(cells.clamp(1, width.max(1)))
}

/// One block character per value, scaled between the series min and max.
fn sparkline(values: &[f64]) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let top = (SPARK_LEVELS.len() - 1) as f64;

    values
        .iter()
        .map(|v| {
            let level = if span > 0.0 {
                (((v - min) / span) * top).round() as usize
            } else {
                0
            };
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

/// GitHub-style heading anchor.
fn anchor(heading: &str) -> String {
    heading
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}
