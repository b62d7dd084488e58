//! Interactive year selector.
//!
//! Reads one year per line and re-renders the filtered sales chart for
//! each valid selection. The other charts are never recomputed.

use crate::analysis::YearRange;
use crate::dashboard::Dashboard;
use crate::join::SalesLine;
use crate::report::render_chart;
use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::debug;

/// Run the prompt until `q`, `quit` or end of input.
///
/// Returns the dashboard as of the last valid selection.
pub fn run_year_prompt<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    mut dashboard: Dashboard,
    sales: &[SalesLine],
    range: &YearRange,
    bar_width: usize,
) -> Result<Dashboard> {
    let mut line = String::new();

    loop {
        write!(
            output,
            "Select year [{}-{}] (q to quit): ",
            range.min, range.max
        )?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let answer = line.trim();
        match answer {
            "" => continue,
            "q" | "quit" | "exit" => break,
            _ => {}
        }

        let year = match answer.parse::<i32>() {
            Ok(year) => year,
            Err(_) => {
                writeln!(output, "Not a year: {}", answer)?;
                continue;
            }
        };

        if let Err(e) = range.check(year) {
            writeln!(output, "{}", e)?;
            continue;
        }

        debug!("Re-rendering sales for {}", year);
        dashboard = dashboard.with_year(sales, year);
        writeln!(output)?;
        write!(output, "{}", render_chart(&dashboard.filtered, bar_width))?;
    }

    Ok(dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{year_chart, DASHBOARD_TITLE};
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn sales() -> Vec<SalesLine> {
        [(1996, 10.0), (1997, 20.0), (1998, 30.0)]
            .into_iter()
            .map(|(year, total)| SalesLine {
                order_id: 1,
                customer_id: None,
                employee_id: None,
                order_date: NaiveDate::from_ymd_opt(year, 6, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0)),
                company_name: None,
                product_id: None,
                unit_price: None,
                quantity: None,
                discount: None,
                employee_name: None,
                total_sales: Some(total),
            })
            .collect()
    }

    fn dashboard(sales: &[SalesLine]) -> Dashboard {
        Dashboard {
            title: DASHBOARD_TITLE.to_string(),
            charts: Vec::new(),
            selected_year: 1997,
            filtered: year_chart(sales, 1997),
        }
    }

    #[test]
    fn test_prompt_renders_each_valid_year() {
        let sales = sales();
        let range = YearRange::spanning(1996, 1998);
        let input = Cursor::new("1996\nabc\n2001\n\n1998\nq\n1997\n");
        let mut output = Vec::new();

        let last = run_year_prompt(input, &mut output, dashboard(&sales), &sales, &range, 10)
            .unwrap();
        let text = String::from_utf8(output).unwrap();

        assert_eq!(last.selected_year, 1998);
        assert!(text.contains("## Sales in 1996"));
        assert!(text.contains("Not a year: abc"));
        assert!(text.contains("year 2001 is outside the available range 1996..=1998"));
        assert!(text.contains("## Sales in 1998"));
        assert!(!text.contains("## Sales in 1997"));
    }

    #[test]
    fn test_prompt_stops_at_eof() {
        let sales = sales();
        let range = YearRange::spanning(1996, 1998);
        let mut output = Vec::new();

        let last = run_year_prompt(
            Cursor::new(""),
            &mut output,
            dashboard(&sales),
            &sales,
            &range,
            10,
        )
        .unwrap();

        assert_eq!(last.selected_year, 1997);
        assert!(String::from_utf8(output).unwrap().starts_with("Select year [1996-1998]"));
    }
}
