//! ISO-8601 calendar dates at the serialization boundary.
//!
//! The record store keeps dates as `YYYY-MM-DD` text columns, so parsing is
//! strict: exactly ten characters, zero padded, no time or zone suffix.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{DeadlineError, DeadlineResult};

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_iso_date(input: &str) -> DeadlineResult<NaiveDate> {
    let bytes = input.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(idx, b)| idx == 4 || idx == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(DeadlineError::invalid(format!(
            "malformed date '{input}' (expected YYYY-MM-DD)"
        )));
    }
    NaiveDate::parse_from_str(input, ISO_DATE_FORMAT)
        .map_err(|err| DeadlineError::invalid(format!("malformed date '{input}': {err}")))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Drops the time-of-day so comparisons happen on whole calendar days.
pub fn calendar_date(moment: NaiveDateTime) -> NaiveDate {
    moment.date()
}

/// Parses a comma separated list of ISO dates, ignoring blank entries.
pub fn parse_iso_date_list(input: &str) -> DeadlineResult<Vec<NaiveDate>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_iso_date)
        .collect()
}
