//! Filename date tokens and CF temporal coordinates.
//!
//! Input rasters carry their acquisition date as a leading `YYYYMMDD` token
//! (e.g. `20230101_classification.tif`). Archives store time as hours since
//! 0001-01-01 on the CF `gregorian` calendar, which is Julian before
//! 1582-10-15 and Gregorian from then on.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// CF units string for every time axis written by this workspace.
pub const TIME_UNITS: &str = "hours since 0001-01-01 00:00:00";

/// CF calendar name matching [`TIME_UNITS`].
pub const TIME_CALENDAR: &str = "gregorian";

/// Length of the leading date token.
const DATE_TOKEN_LEN: usize = 8;

/// Julian day number of 0001-01-01 on the Julian calendar.
const EPOCH_JDN: i64 = 1_721_424;

/// Julian day number of 1582-10-15, the first Gregorian day.
const GREGORIAN_SWITCH_JDN: i64 = 2_299_161;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("file name '{0}' has no leading YYYYMMDD date token")]
    MissingToken(String),

    #[error("date token '{token}' in '{name}' is not a valid calendar date")]
    InvalidDate { name: String, token: String },

    #[error("date {0} falls in the 1582 Julian-Gregorian calendar gap")]
    CalendarGap(String),
}

/// Parse the leading `YYYYMMDD` token of a file name.
///
/// The token must be exactly eight ASCII digits followed by either the end of
/// the name or a non-digit, so `202301015_x.tif` is rejected instead of being
/// silently truncated.
pub fn parse_date_token(file_name: &str) -> Result<NaiveDate, DateParseError> {
    let bytes = file_name.as_bytes();
    if bytes.len() < DATE_TOKEN_LEN || !bytes[..DATE_TOKEN_LEN].iter().all(u8::is_ascii_digit) {
        return Err(DateParseError::MissingToken(file_name.to_string()));
    }
    if bytes.get(DATE_TOKEN_LEN).is_some_and(u8::is_ascii_digit) {
        return Err(DateParseError::MissingToken(file_name.to_string()));
    }

    let token = &file_name[..DATE_TOKEN_LEN];
    let invalid = || DateParseError::InvalidDate {
        name: file_name.to_string(),
        token: token.to_string(),
    };

    let year: i32 = token[0..4].parse().map_err(|_| invalid())?;
    let month: u32 = token[4..6].parse().map_err(|_| invalid())?;
    let day: u32 = token[6..8].parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}

/// Parse the date token from the final component of a path.
pub fn date_from_path(path: &Path) -> Result<NaiveDate, DateParseError> {
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| DateParseError::MissingToken(path.display().to_string()))?;
    parse_date_token(name)
}

/// Format a date back into its `YYYYMMDD` token form.
pub fn format_date_token(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// One time-axis value, in hours since 0001-01-01 (CF gregorian calendar).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TemporalCoordinate(pub f64);

impl TemporalCoordinate {
    /// Encode a calendar date at 00:00.
    pub fn from_date(date: NaiveDate) -> Result<Self, DateParseError> {
        let (y, m, d) = (date.year() as i64, date.month() as i64, date.day() as i64);

        let jdn = if (y, m, d) >= (1582, 10, 15) {
            gregorian_jdn(y, m, d)
        } else if (y, m, d) >= (1582, 10, 5) {
            return Err(DateParseError::CalendarGap(format_date_token(date)));
        } else {
            julian_jdn(y, m, d)
        };

        Ok(Self(((jdn - EPOCH_JDN) * 24) as f64))
    }

    /// Parse the date token of a path and encode it.
    pub fn from_path(path: &Path) -> Result<Self, DateParseError> {
        Self::from_date(date_from_path(path)?)
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// Calendar date of the day containing this coordinate.
    ///
    /// Returns `None` for non-finite values or dates outside chrono's range.
    pub fn to_date(&self) -> Option<NaiveDate> {
        if !self.0.is_finite() {
            return None;
        }
        let jdn = (self.0 / 24.0).floor() as i64 + EPOCH_JDN;
        let (y, m, d) = if jdn >= GREGORIAN_SWITCH_JDN {
            gregorian_ymd(jdn)
        } else {
            julian_ymd(jdn)
        };
        NaiveDate::from_ymd_opt(i32::try_from(y).ok()?, m as u32, d as u32)
    }
}

fn gregorian_jdn(y: i64, m: i64, d: i64) -> i64 {
    let a = (14 - m) / 12;
    let y = y + 4800 - a;
    let m = m + 12 * a - 3;
    d + (153 * m + 2) / 5 + 365 * y + y / 4 - y / 100 + y / 400 - 32045
}

fn julian_jdn(y: i64, m: i64, d: i64) -> i64 {
    let a = (14 - m) / 12;
    let y = y + 4800 - a;
    let m = m + 12 * a - 3;
    d + (153 * m + 2) / 5 + 365 * y + y / 4 - 32083
}

fn gregorian_ymd(jdn: i64) -> (i64, i64, i64) {
    let a = jdn + 32044;
    let b = (4 * a + 3) / 146_097;
    let c = a - 146_097 * b / 4;
    let d = (4 * c + 3) / 1461;
    let e = c - 1461 * d / 4;
    let m = (5 * e + 2) / 153;
    (
        100 * b + d - 4800 + m / 10,
        m + 3 - 12 * (m / 10),
        e - (153 * m + 2) / 5 + 1,
    )
}

fn julian_ymd(jdn: i64) -> (i64, i64, i64) {
    let c = jdn + 32082;
    let d = (4 * c + 3) / 1461;
    let e = c - 1461 * d / 4;
    let m = (5 * e + 2) / 153;
    (
        d - 4800 + m / 10,
        m + 3 - 12 * (m / 10),
        e - (153 * m + 2) / 5 + 1,
    )
}
