use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::ImportError;

/// Collapse runs of whitespace to single spaces and trim the ends. Statement
/// exports pad descriptions to fixed widths; matching and dedup want the
/// cleaned form.
pub fn prepare_source(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn parse_date(s: &str, format: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(s.trim(), format)
        .map_err(|_| ImportError::InvalidDate(s.trim().to_string()))
}

/// Parse a statement amount: currency symbols and thousands separators are
/// stripped, accounting parentheses mean negative.
pub fn parse_amount(s: &str) -> Result<Decimal, ImportError> {
    let s = s.trim();
    let (negative, s) = if s.starts_with('(') && s.ends_with(')') {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };
    let cleaned = s.replace([',', '$', ' '], "");
    let mut amount =
        Decimal::from_str(&cleaned).map_err(|_| ImportError::InvalidAmount(s.to_string()))?;
    if negative {
        amount = -amount;
    }
    Ok(amount)
}

/// Resolve a named column in the header row.
pub fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, ImportError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| ImportError::MissingColumn(name.to_string()))
}
