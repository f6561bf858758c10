//! Lenient conversions between sheet cell text and typed values.
//!
//! Cells are whatever a person typed into the spreadsheet, so parsing never
//! fails: unreadable numbers become zero and are logged.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use stockbook_shared::{DATE_FORMAT, TIMESTAMP_FORMAT};
use tracing::warn;

fn clean_number(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '₱'))
        .collect()
}

pub fn parse_decimal(raw: &str) -> Decimal {
    let cleaned = clean_number(raw);
    if cleaned.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .unwrap_or_else(|_| {
            warn!("Unreadable amount '{}' treated as 0", raw);
            Decimal::ZERO
        })
}

pub fn parse_optional_decimal(raw: Option<&str>) -> Option<Decimal> {
    raw.filter(|v| !v.trim().is_empty()).map(parse_decimal)
}

/// Whole quantity; accepts `3`, `3.0` and `"3"`. Fractions are truncated.
pub fn parse_quantity(raw: &str) -> i64 {
    let cleaned = clean_number(raw);
    if cleaned.is_empty() {
        return 0;
    }
    cleaned
        .parse::<i64>()
        .ok()
        .or_else(|| Decimal::from_str(&cleaned).ok().and_then(|d| d.trunc().to_i64()))
        .unwrap_or_else(|| {
            warn!("Unreadable quantity '{}' treated as 0", raw);
            0
        })
}

pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "y" | "x"
    )
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn format_flag(value: bool) -> String {
    let text = if value { "TRUE" } else { "FALSE" };
    text.to_string()
}

pub fn format_timestamp(value: NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}
