//! Field coercion from raw CSV text to typed values.
//!
//! Every function returns `None` for the "missing" marker: empty fields,
//! the literal `NULL`, and anything that does not parse.

use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

fn present(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed)
    }
}

/// Coerce to a non-negative integer identifier.
///
/// Float text is truncated (`"7.0"` -> 7), matching a numeric parse
/// followed by an integer cast.
pub fn identifier(raw: &str) -> Option<i64> {
    let text = present(raw)?;
    let value = match text.parse::<i64>() {
        Ok(v) => v,
        Err(_) => {
            let float = text.parse::<f64>().ok().filter(|f| f.is_finite())?;
            if float.abs() >= i64::MAX as f64 {
                return None;
            }
            float.trunc() as i64
        }
    };
    (value >= 0).then_some(value)
}

/// Coerce to a finite float.
pub fn number(raw: &str) -> Option<f64> {
    present(raw)?.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Keep non-missing text, trimmed.
pub fn text(raw: &str) -> Option<String> {
    present(raw).map(str::to_string)
}

/// Parse an order timestamp. Date-only values land on midnight.
pub fn timestamp(raw: &str) -> Option<NaiveDateTime> {
    let text = present(raw)?;

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
