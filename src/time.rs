// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conversions between the time representations of the logging data and FITS
//! time strings.
//!
//! Logging data stamp times as "ASCII times" (YYYYmmddHHMMSS.ffffff); the
//! readout stamps times as UNIX timestamps. Both are UTC.

use chrono::{
    format::{Item, StrftimeItems},
    DateTime, NaiveDateTime, Utc,
};
use thiserror::Error;

use crate::constants::{FORM_ASCIITIME, FORM_FITSTIME_P};

fn check_format(form: &str) -> Result<(), TimeError> {
    if StrftimeItems::new(form).any(|item| matches!(item, Item::Error)) {
        return Err(TimeError::BadFormat(form.to_string()));
    }
    Ok(())
}

/// Parse an ASCII time (YYYYmmddHHMMSS.ffffff) given as a string. Log readers
/// use this directly so that no precision is lost to floating point.
pub fn parse_asciitime(s: &str) -> Result<NaiveDateTime, TimeError> {
    NaiveDateTime::parse_from_str(s.trim(), FORM_ASCIITIME)
        .map_err(|_| TimeError::AsciiTime(s.to_string()))
}

/// Convert ASCII times given as numbers (e.g. 20171102123456.5) into strings
/// with the format `form`.
pub fn convert_asciitime(asciitime: &[f64], form: &str) -> Result<Vec<String>, TimeError> {
    check_format(form)?;
    asciitime
        .iter()
        .map(|t| {
            let t = parse_asciitime(&format!("{t:14.6}"))?;
            Ok(t.format(form).to_string())
        })
        .collect()
}

/// A UNIX timestamp as a UTC date and time, rounded to the microsecond.
pub fn timestamp_to_datetime(timestamp: f64) -> Result<DateTime<Utc>, TimeError> {
    // `timestamp - secs` is exact; half-microsecond ties round to even.
    let mut secs = timestamp.floor();
    if !secs.is_finite() || secs.abs() >= i64::MAX as f64 {
        return Err(TimeError::Timestamp(timestamp));
    }
    let mut micros = ((timestamp - secs) * 1e6).round_ties_even();
    if micros >= 1e6 {
        secs += 1.0;
        micros = 0.0;
    }
    DateTime::from_timestamp(secs as i64, micros as u32 * 1000)
        .ok_or(TimeError::Timestamp(timestamp))
}

/// A UTC date and time as a UNIX timestamp.
pub fn datetime_to_timestamp(datetime: &NaiveDateTime) -> f64 {
    let utc = datetime.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) / 1e6
}

/// Convert UNIX timestamps into strings with the format
/// [`FORM_FITSTIME_P`].
pub fn convert_timestamp(timestamp: &[f64]) -> Result<Vec<String>, TimeError> {
    timestamp
        .iter()
        .map(|&t| Ok(timestamp_to_datetime(t)?.format(FORM_FITSTIME_P).to_string()))
        .collect()
}

#[derive(Error, Debug)]
pub enum TimeError {
    #[error("Couldn't parse '{0}' as an ASCII time (YYYYmmddHHMMSS.ffffff)")]
    AsciiTime(String),

    #[error("{0} isn't a representable UNIX timestamp")]
    Timestamp(f64),

    #[error("'{0}' isn't a valid time format")]
    BadFormat(String),
}
