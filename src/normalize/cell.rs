//! Raw cell values and the coercion rules applied to them
//!
//! Every coercion is total over `CellValue`: bad input falls back to a
//! documented default (0 for numbers, `None` for dates) and never yields NaN.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One untyped cell as read from a carrier file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

/// A parsed data row: observed (or canonical, after mapping) column name to cell
pub type RawRow = BTreeMap<String, CellValue>;

impl CellValue {
    /// Wrap a raw CSV field; blank or whitespace-only fields become `Empty`
    pub fn from_raw(field: &str) -> Self {
        if field.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(field.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// Trimmed text form, `None` when blank
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            CellValue::Number(n) => Some(n.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Empty => Ok(()),
        }
    }
}

/// Strip currency decoration: `$`, `,`, `%` and surrounding whitespace
fn strip_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '$' | ',' | '%'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Numeric value of a currency-like cell, `None` if blank or not a finite number
pub fn try_parse_currency(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => strip_numeric(s).parse::<f64>().ok()?,
        CellValue::Empty => return None,
    };
    value.is_finite().then_some(value)
}

/// Currency coercion: non-numeric or empty becomes 0
pub fn parse_currency(cell: &CellValue) -> f64 {
    try_parse_currency(cell).unwrap_or(0.0)
}

/// Percentage coercion: "12%" becomes 0.12, then clamped to `range` when given
pub fn parse_percentage(cell: &CellValue, range: Option<(f64, f64)>) -> f64 {
    clamp_to(parse_currency(cell) / 100.0, range)
}

/// Count coercion (head counts, member months): currency rules plus clamp
pub fn parse_count(cell: &CellValue, range: Option<(f64, f64)>) -> f64 {
    clamp_to(parse_currency(cell), range)
}

fn clamp_to(value: f64, range: Option<(f64, f64)>) -> f64 {
    match range {
        Some((lo, hi)) => value.max(lo).min(hi),
        None => value,
    }
}

const DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%m-%d-%y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%Y%m%d",
];

/// Years outside this window are treated as parse failures (catches "24" read as year 24)
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

fn parse_with_formats(text: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .find(|d| PLAUSIBLE_YEARS.contains(&d.year()))
}

/// Calendar-aware date parse; invalid or missing input is `None`, never a default date
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    let text = match cell {
        CellValue::Text(s) => s.trim(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    if let Some(date) = parse_with_formats(text, DATE_FORMATS) {
        return Some(date);
    }

    // Timestamps such as "2024-01-15T00:00:00" or "01/15/2024 12:00 AM"
    let date_part = text.split(|c: char| c == 'T' || c.is_whitespace()).next()?;
    if date_part.len() < text.len() {
        return parse_with_formats(date_part, DATE_FORMATS);
    }

    None
}

/// Parse a reporting-month cell to the first day of that month
///
/// Accepts anything `parse_date` does plus month-only forms:
/// `2024-01`, `01/2024`, `Jan 2024`, `January 2024`, `Jan-24`.
pub fn parse_month(cell: &CellValue) -> Option<NaiveDate> {
    if let Some(date) = parse_date(cell) {
        return NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
    }

    let text = match cell {
        CellValue::Text(s) => s.trim(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }

    let candidates = [
        (format!("{}-01", text), "%Y-%m-%d"),
        (format!("{}/01", text), "%Y/%m/%d"),
        (format!("01/{}", text), "%d/%m/%Y"),
        (format!("01 {}", text), "%d %b %Y"),
        (format!("01 {}", text), "%d %B %Y"),
        (format!("01-{}", text), "%d-%b-%y"),
        (format!("01-{}", text), "%d-%b-%Y"),
    ];

    candidates
        .iter()
        .filter_map(|(s, fmt)| NaiveDate::parse_from_str(s, fmt).ok())
        .find(|d| PLAUSIBLE_YEARS.contains(&d.year()))
}

/// `YYYY-MM` bucket key for a date
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
