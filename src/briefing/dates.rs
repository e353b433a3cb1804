//! Date formatting for briefing documents

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ExportError, Result};

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// Parse a `YYYY-MM-DD` date, ignoring any trailing time part
pub fn parse_date(date: &str) -> Result<NaiveDate> {
    let trimmed = date.trim();
    trimmed
        .get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .ok_or_else(|| ExportError::InvalidDate(trimmed.to_string()))
}

/// `2026-01-15` → `Thursday, January 15, 2026`
pub fn format_date_long(date: &str) -> Result<String> {
    Ok(parse_date(date)?.format("%A, %B %-d, %Y").to_string())
}

/// `2026-01-20T05:00:00.000Z` → `January 20, 2026`
///
/// Source dates are free text; anything without a recognisable date is
/// returned unchanged.
pub fn format_source_date(date: &str) -> String {
    ISO_DATE
        .find(date)
        .and_then(|found| NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d").ok())
        .map(|day| day.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| date.trim().to_string())
}

/// Footer timestamp, e.g. `1/15/2026, 9:05 AM`
pub fn format_exported_at(at: NaiveDateTime) -> String {
    at.format("%-m/%-d/%Y, %-I:%M %p").to_string()
}

/// Download name, e.g. `MM 251212 Friday 12 December.docx`
pub fn export_filename(date: &str) -> Result<String> {
    let day = parse_date(date)?;
    Ok(format!(
        "MM {} {} {} {}.docx",
        day.format("%y%m%d"),
        day.format("%A"),
        day.day(),
        day.format("%B")
    ))
}
