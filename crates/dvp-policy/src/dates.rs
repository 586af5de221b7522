//! Document date parsing
//!
//! Accepts `dd.mm.yyyy`, `yyyy-mm-dd` and `dd/mm/yyyy`. Dates that do not
//! exist on the calendar are rejected, never clamped.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static DMY_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$").expect("valid regex"));
static DMY_SLASHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid regex"));
static ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateParseError {
    #[error("unrecognized date format: '{0}'")]
    UnrecognizedFormat(String),

    #[error("date does not exist: '{0}'")]
    InvalidCalendarDate(String),
}

pub fn parse_document_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let text = raw.trim();

    let dmy = DMY_DOTTED
        .captures(text)
        .or_else(|| DMY_SLASHED.captures(text));

    // (year, month, day) capture indices
    let (caps, (y, m, d)) = match dmy {
        Some(caps) => (caps, (3, 2, 1)),
        None => match ISO.captures(text) {
            Some(caps) => (caps, (1, 2, 3)),
            None => return Err(DateParseError::UnrecognizedFormat(text.to_string())),
        },
    };

    let year = caps[y].parse::<i32>();
    let month = caps[m].parse::<u32>();
    let day = caps[d].parse::<u32>();

    match (year, month, day) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| DateParseError::InvalidCalendarDate(text.to_string())),
        _ => Err(DateParseError::UnrecognizedFormat(text.to_string())),
    }
}

/// Parse an optional raw date; absent or blank input is `Ok(None)`
pub fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, DateParseError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_document_date(text).map(Some),
    }
}
