//! Parsing of entry start timestamps and `HH:MM:SS[.ffffff]` durations.

use chrono::{NaiveDateTime, TimeDelta};

use crate::db::TIMESTAMP_FORMAT;
use crate::error::{Result, ShopfloorError};

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        ShopfloorError::validation(format!(
            "Invalid datetime '{}' (expected YYYY-MM-DD HH:MM:SS): {}",
            value, e
        ))
    })
}

/// Parses an `HH:MM:SS` duration with an optional decimal fraction of a
/// second. Hours may exceed 24.
pub fn parse_duration(value: &str) -> Result<TimeDelta> {
    let invalid = || {
        ShopfloorError::validation(format!(
            "Invalid duration '{}' (expected HH:MM:SS[.ffffff])",
            value
        ))
    };

    let parts: Vec<&str> = value.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };

    let (whole_seconds, fraction) = match seconds.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (*seconds, None),
    };

    let hours = parse_digits(hours).ok_or_else(invalid)?;
    let minutes = parse_digits(minutes).ok_or_else(invalid)?;
    let whole_seconds = parse_digits(whole_seconds).ok_or_else(invalid)?;
    let nanos = match fraction {
        Some(f) => parse_fraction_nanos(f).ok_or_else(invalid)?,
        None => 0,
    };

    TimeDelta::try_hours(hours)
        .and_then(|h| h.checked_add(&TimeDelta::try_minutes(minutes)?))
        .and_then(|d| d.checked_add(&TimeDelta::try_seconds(whole_seconds)?))
        .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
        .ok_or_else(invalid)
}

/// Returns `(start, start + duration)`.
pub fn calc_end_datetime(start: &str, duration: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start_at = parse_datetime(start)?;
    let delta = parse_duration(duration)?;
    let end_at = start_at.checked_add_signed(delta).ok_or_else(|| {
        ShopfloorError::validation(format!("Duration '{}' is out of range", duration))
    })?;
    Ok((start_at, end_at))
}

fn parse_digits(s: &str) -> Option<i64> {
    if s.is_empty() || s.len() > 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// `"5"` is half a second, `"000250"` is 250 microseconds.
fn parse_fraction_nanos(s: &str) -> Option<i64> {
    if s.is_empty() || s.len() > 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<9}", s);
    padded.parse().ok()
}
