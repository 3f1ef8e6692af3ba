//! Utility functions shared across the HR ops crates

use crate::constants::{DATABASE_FILENAME, DATE_FORMATS};
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

/// Get the default database path (`$HOME/.hrops/hrops.sqlite`)
#[must_use]
pub fn get_default_database_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
    PathBuf::from(home).join(".hrops").join(DATABASE_FILENAME)
}

/// Format a date for storage and display
#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a timestamp the way it is stored in `created_at`/`updated_at`
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a date in any of the supported [`DATE_FORMATS`]
#[must_use]
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_str.trim(), fmt).ok())
}

/// Today's date in UTC
#[must_use]
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
