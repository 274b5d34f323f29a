//! DateTime type for Tally
//!
//! Millisecond-precision UTC instants, enough to bucket business records
//! (which arrive as ISO strings or JavaScript-style epoch milliseconds).
//!
//! Design principles:
//! - No external datetime crates (keeps tally-core minimal)
//! - Gregorian proleptic calendar
//! - UTC-first: parsed offsets are folded into the instant, the original
//!   offset is kept only for display

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

pub const MIN_YEAR: i32 = -9999;
pub const MAX_YEAR: i32 = 9999;

/// -9999-01-01T00:00:00.000Z
pub const MIN_UNIX_MILLIS: i64 = -377_705_203_200_000;
/// 9999-12-31T23:59:59.999Z
pub const MAX_UNIX_MILLIS: i64 = 253_402_300_799_999;

/// Days in each month (non-leap year)
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Days from year 0 to 1970-01-01
const UNIX_EPOCH_DAYS: i64 = 719_468;

// ============================================================================
// TallyDateTime
// ============================================================================

/// A UTC instant with millisecond precision
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TallyDateTime {
    /// Milliseconds since Unix epoch (negative for pre-1970 dates)
    millis: i64,
    /// Offset in seconds the value was written with (None = UTC)
    #[serde(skip_serializing_if = "Option::is_none")]
    tz_offset: Option<i32>,
}

impl TallyDateTime {
    // ========== Construction ==========

    fn from_millis(millis: i64) -> Self {
        Self { millis, tz_offset: None }
    }

    /// Create a datetime from milliseconds since Unix epoch
    pub fn from_unix_millis(millis: i64) -> Result<Self, DateTimeError> {
        if !(MIN_UNIX_MILLIS..=MAX_UNIX_MILLIS).contains(&millis) {
            return Err(DateTimeError::OutOfRange(millis.to_string()));
        }
        Ok(Self::from_millis(millis))
    }

    /// Fractional milliseconds are truncated toward zero
    pub fn from_unix_millis_f64(millis: f64) -> Result<Self, DateTimeError> {
        if !millis.is_finite() || millis < MIN_UNIX_MILLIS as f64 || millis > MAX_UNIX_MILLIS as f64 {
            return Err(DateTimeError::OutOfRange(millis.to_string()));
        }
        Self::from_unix_millis(millis.trunc() as i64)
    }

    /// Create a date (time = 00:00:00)
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateTimeError> {
        Self::from_ymd_hms_milli(year, month, day, 0, 0, 0, 0)
    }

    /// Create a datetime from components
    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self, DateTimeError> {
        Self::from_ymd_hms_milli(year, month, day, hour, minute, second, 0)
    }

    /// Create a datetime from components with milliseconds
    pub fn from_ymd_hms_milli(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        milli: u32,
    ) -> Result<Self, DateTimeError> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(DateTimeError::InvalidYear(year));
        }
        if !(1..=12).contains(&month) {
            return Err(DateTimeError::InvalidMonth(month));
        }
        let max_day = days_in_month(year, month);
        if day < 1 || day > max_day {
            return Err(DateTimeError::InvalidDay(day, month, year));
        }
        if hour > 23 {
            return Err(DateTimeError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(DateTimeError::InvalidMinute(minute));
        }
        if second > 59 {
            return Err(DateTimeError::InvalidSecond(second));
        }
        if milli >= 1_000 {
            return Err(DateTimeError::InvalidMilli(milli));
        }

        let days = days_from_civil(year, month, day);
        let time_millis = hour as i64 * MILLIS_PER_HOUR
            + minute as i64 * MILLIS_PER_MINUTE
            + second as i64 * MILLIS_PER_SECOND
            + milli as i64;

        Ok(Self {
            millis: days * MILLIS_PER_DAY + time_millis,
            tz_offset: None,
        })
    }

    // ========== Accessors ==========

    /// Milliseconds since Unix epoch
    pub fn as_unix_millis(&self) -> i64 {
        self.millis
    }

    /// Offset in seconds the value was written with (None = UTC)
    pub fn tz_offset(&self) -> Option<i32> {
        self.tz_offset
    }

    pub fn year(&self) -> i32 {
        self.to_ymd().0
    }

    /// Month (1-12)
    pub fn month(&self) -> u32 {
        self.to_ymd().1
    }

    /// Day of month (1-31)
    pub fn day(&self) -> u32 {
        self.to_ymd().2
    }

    /// Hour (0-23, UTC)
    pub fn hour(&self) -> u32 {
        (self.millis.rem_euclid(MILLIS_PER_DAY) / MILLIS_PER_HOUR) as u32
    }

    /// Minute (0-59)
    pub fn minute(&self) -> u32 {
        (self.millis.rem_euclid(MILLIS_PER_HOUR) / MILLIS_PER_MINUTE) as u32
    }

    /// Second (0-59)
    pub fn second(&self) -> u32 {
        (self.millis.rem_euclid(MILLIS_PER_MINUTE) / MILLIS_PER_SECOND) as u32
    }

    /// Millisecond (0-999)
    pub fn millisecond(&self) -> u32 {
        self.millis.rem_euclid(MILLIS_PER_SECOND) as u32
    }

    /// Day of week (1=Monday, 7=Sunday, ISO 8601)
    pub fn weekday(&self) -> u32 {
        let days = self.millis.div_euclid(MILLIS_PER_DAY);
        // 1970-01-01 was a Thursday
        let dow = (days + 4).rem_euclid(7);
        if dow == 0 { 7 } else { dow as u32 }
    }

    /// Decompose into year, month, day (UTC)
    pub fn to_ymd(&self) -> (i32, u32, u32) {
        civil_from_days(self.millis.div_euclid(MILLIS_PER_DAY))
    }

    // ========== Arithmetic ==========

    pub fn add_days(&self, days: i64) -> Self {
        Self {
            millis: self.millis + days * MILLIS_PER_DAY,
            tz_offset: self.tz_offset,
        }
    }

    // ========== Period Start Methods ==========

    /// Truncate to the start of the hour
    pub fn start_of_hour(&self) -> Self {
        Self::from_millis(self.millis.div_euclid(MILLIS_PER_HOUR) * MILLIS_PER_HOUR)
    }

    /// Truncate to 00:00:00.000
    pub fn start_of_day(&self) -> Self {
        Self::from_millis(self.millis.div_euclid(MILLIS_PER_DAY) * MILLIS_PER_DAY)
    }

    /// Start of the week containing this instant.
    /// week_start: 1=Monday (ISO), 7=Sunday (US)
    pub fn start_of_week(&self, week_start: u32) -> Self {
        let dow = self.weekday();
        let target_start = if week_start == 7 { 7 } else { 1 };

        let days_since_start = if dow >= target_start {
            (dow - target_start) as i64
        } else {
            (7 - target_start + dow) as i64
        };

        self.start_of_day().add_days(-days_since_start)
    }

    pub fn start_of_month(&self) -> Self {
        let (year, month, _) = self.to_ymd();
        Self::from_millis(days_from_civil(year, month, 1) * MILLIS_PER_DAY)
    }

    pub fn start_of_year(&self) -> Self {
        Self::from_millis(days_from_civil(self.year(), 1, 1) * MILLIS_PER_DAY)
    }

    // ========== Formatting ==========

    /// Calendar date as `YYYY-MM-DD` (UTC)
    pub fn to_date_string(&self) -> String {
        let (year, month, day) = self.to_ymd();
        format!("{:04}-{:02}-{:02}", year, month, day)
    }

    /// Format as ISO 8601, in the offset the value was written with
    pub fn to_iso_string(&self) -> String {
        match self.tz_offset {
            Some(offset) if offset != 0 => {
                let local = Self::from_millis(self.millis + offset as i64 * MILLIS_PER_SECOND);
                let (sign, abs_offset) = if offset < 0 { ('-', -offset) } else { ('+', offset) };
                format!(
                    "{}T{:02}:{:02}:{:02}{}{:02}:{:02}",
                    local.to_date_string(), local.hour(), local.minute(), local.second(),
                    sign, abs_offset / 3600, (abs_offset % 3600) / 60
                )
            }
            _ => format!(
                "{}T{:02}:{:02}:{:02}Z",
                self.to_date_string(), self.hour(), self.minute(), self.second()
            ),
        }
    }
}

impl fmt::Display for TallyDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

// ============================================================================
// DateTimeError
// ============================================================================

/// Errors that can occur with datetime construction and parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateTimeError {
    #[error("Invalid year: {0} (must be -9999 to 9999)")]
    InvalidYear(i32),

    #[error("Invalid month: {0} (must be 1-12)")]
    InvalidMonth(u32),

    #[error("Invalid day: {0} for {1}/{2}")]
    InvalidDay(u32, u32, i32),

    #[error("Invalid hour: {0} (must be 0-23)")]
    InvalidHour(u32),

    #[error("Invalid minute: {0} (must be 0-59)")]
    InvalidMinute(u32),

    #[error("Invalid second: {0} (must be 0-59)")]
    InvalidSecond(u32),

    #[error("Invalid millisecond: {0}")]
    InvalidMilli(u32),

    #[error("Timestamp {0} ms is outside years -9999 to 9999")]
    OutOfRange(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

// ============================================================================
// Calendar Utilities (Gregorian proleptic)
// ============================================================================

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        m @ 1..=12 => DAYS_IN_MONTH[(m - 1) as usize],
        _ => 0,
    }
}

/// Convert civil date to days since Unix epoch
/// Algorithm from Howard Hinnant: http://howardhinnant.github.io/date_algorithms.html
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year } as i64;
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // [0, 399]
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146097 + doe - UNIX_EPOCH_DAYS
}

/// Convert days since Unix epoch to civil date
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + UNIX_EPOCH_DAYS;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let d = doy - (153 * mp + 2) / 5 + 1; // [1, 31]
    let m = if mp < 10 { mp + 3 } else { mp - 9 }; // [1, 12]
    let year = if m <= 2 { y + 1 } else { y };
    (year as i32, m as u32, d as u32)
}

// ============================================================================
// Parsing
// ============================================================================

impl TallyDateTime {
    /// Parse ISO 8601 datetime string
    ///
    /// Supported formats:
    /// - 2025-06-15
    /// - 2025-06-15T14:30 / 2025-06-15 14:30:00
    /// - 2025-06-15T14:30:00Z
    /// - 2025-06-15T14:30:00+05:30
    /// - 2025-06-15T14:30:00.123Z
    pub fn parse(s: &str) -> Result<Self, DateTimeError> {
        let s = s.trim();

        if s.len() == 10 && s.as_bytes().get(4) == Some(&b'-') && s.as_bytes().get(7) == Some(&b'-') {
            let (year, month, day) = parse_date_part(s)?;
            return Self::from_ymd(year, month, day);
        }

        let split = s.find('T').or_else(|| s.find(' '));
        match split {
            Some(pos) => Self::parse_datetime(&s[..pos], &s[pos + 1..]),
            None => Err(DateTimeError::ParseError(format!("Unrecognized format: {}", s))),
        }
    }

    fn parse_datetime(date_part: &str, time_part: &str) -> Result<Self, DateTimeError> {
        let (year, month, day) = parse_date_part(date_part)?;
        let (time_str, tz_offset) = extract_timezone(time_part)?;

        let (time_no_frac, millis) = match time_str.find('.') {
            Some(dot_pos) => (&time_str[..dot_pos], parse_fractional_millis(&time_str[dot_pos + 1..])?),
            None => (time_str, 0),
        };

        let time_parts: Vec<&str> = time_no_frac.split(':').collect();
        if time_parts.len() < 2 {
            return Err(DateTimeError::ParseError("Expected HH:MM[:SS]".to_string()));
        }
        let hour = parse_component(time_parts[0], "hour")?;
        let minute = parse_component(time_parts[1], "minute")?;
        let second = match time_parts.get(2) {
            Some(part) => parse_component(part, "second")?,
            None => 0,
        };

        let local = Self::from_ymd_hms_milli(year, month, day, hour, minute, second, millis)?;
        Ok(match tz_offset {
            Some(offset) => Self {
                millis: local.millis - offset as i64 * MILLIS_PER_SECOND,
                tz_offset: Some(offset),
            },
            None => local,
        })
    }
}

fn parse_component<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, DateTimeError> {
    s.parse()
        .map_err(|_| DateTimeError::ParseError(format!("Invalid {}", what)))
}

fn parse_date_part(s: &str) -> Result<(i32, u32, u32), DateTimeError> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return Err(DateTimeError::ParseError("Expected YYYY-MM-DD".to_string()));
    }
    Ok((
        parse_component(parts[0], "year")?,
        parse_component(parts[1], "month")?,
        parse_component(parts[2], "day")?,
    ))
}

fn extract_timezone(time_part: &str) -> Result<(&str, Option<i32>), DateTimeError> {
    if let Some(stripped) = time_part.strip_suffix('Z') {
        return Ok((stripped, Some(0)));
    }

    if let Some(plus_pos) = time_part.rfind('+') {
        let offset = parse_tz_offset(&time_part[plus_pos + 1..])?;
        return Ok((&time_part[..plus_pos], Some(offset)));
    }

    // A '-' only starts an offset after HH:MM
    if let Some(minus_pos) = time_part.rfind('-') {
        if minus_pos >= 5 {
            let offset = -parse_tz_offset(&time_part[minus_pos + 1..])?;
            return Ok((&time_part[..minus_pos], Some(offset)));
        }
    }

    Ok((time_part, None))
}

fn parse_tz_offset(s: &str) -> Result<i32, DateTimeError> {
    let mut parts = s.split(':');
    let hours: i32 = parse_component(parts.next().unwrap_or(""), "timezone hours")?;
    let minutes: i32 = match parts.next() {
        Some(m) => parse_component(m, "timezone minutes")?,
        None => 0,
    };
    if !(-23..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(DateTimeError::ParseError(format!("Invalid timezone offset: {}", s)));
    }
    Ok(hours * 3600 + minutes * 60)
}

fn parse_fractional_millis(s: &str) -> Result<u32, DateTimeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DateTimeError::ParseError("Invalid fractional seconds".to_string()));
    }
    // Pad or truncate to 3 digits
    let padded = format!("{:0<3}", &s[..s.len().min(3)]);
    parse_component(&padded, "fractional seconds")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ymd_hms() {
        let dt = TallyDateTime::from_ymd_hms(2025, 6, 15, 14, 30, 45).unwrap();
        assert_eq!(dt.to_ymd(), (2025, 6, 15));
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 45);
    }

    #[test]
    fn test_unix_epoch() {
        let dt = TallyDateTime::from_ymd(1970, 1, 1).unwrap();
        assert_eq!(dt.as_unix_millis(), 0);
    }

    #[test]
    fn test_pre_epoch() {
        let dt = TallyDateTime::from_ymd(1969, 12, 31).unwrap();
        assert!(dt.as_unix_millis() < 0);
        assert_eq!(dt.to_ymd(), (1969, 12, 31));
    }

    #[test]
    fn test_unix_millis_range() {
        assert_eq!(TallyDateTime::from_unix_millis(0).unwrap().to_date_string(), "1970-01-01");
        let last = TallyDateTime::from_unix_millis(MAX_UNIX_MILLIS).unwrap();
        assert_eq!(last.to_iso_string(), "9999-12-31T23:59:59Z");
        let first = TallyDateTime::from_unix_millis(MIN_UNIX_MILLIS).unwrap();
        assert_eq!(first.to_ymd(), (-9999, 1, 1));
        assert_eq!(first.start_of_week(7).weekday(), 7);

        assert!(TallyDateTime::from_unix_millis(MAX_UNIX_MILLIS + 1).is_err());
        assert!(TallyDateTime::from_unix_millis(i64::MIN).is_err());
        assert!(matches!(
            TallyDateTime::from_unix_millis_f64(-1e300),
            Err(DateTimeError::OutOfRange(_))
        ));
        assert!(TallyDateTime::from_unix_millis_f64(1e300).is_err());
        assert!(TallyDateTime::from_unix_millis_f64(f64::NAN).is_err());
        assert_eq!(
            TallyDateTime::from_unix_millis_f64(1_500.9).map(|d| d.as_unix_millis()),
            Ok(1_500)
        );
    }

    #[test]
    fn test_leap_year() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 13), 0);
    }

    #[test]
    fn test_weekday() {
        // 1970-01-01 was Thursday
        assert_eq!(TallyDateTime::from_ymd(1970, 1, 1).unwrap().weekday(), 4);
        // 2025-06-15 is Sunday
        assert_eq!(TallyDateTime::from_ymd(2025, 6, 15).unwrap().weekday(), 7);
    }

    #[test]
    fn test_start_of_week_sunday() {
        // Wednesday 2025-06-18 -> Sunday 2025-06-15
        let dt = TallyDateTime::from_ymd_hms(2025, 6, 18, 9, 0, 0).unwrap();
        assert_eq!(dt.start_of_week(7).to_date_string(), "2025-06-15");
        // A Sunday is its own week start
        let sunday = TallyDateTime::from_ymd_hms(2025, 6, 15, 23, 59, 0).unwrap();
        assert_eq!(sunday.start_of_week(7).to_date_string(), "2025-06-15");
        // ISO week starts Monday
        assert_eq!(dt.start_of_week(1).to_date_string(), "2025-06-16");
    }

    #[test]
    fn test_period_starts() {
        let dt = TallyDateTime::from_ymd_hms(2024, 2, 29, 17, 45, 12).unwrap();
        assert_eq!(dt.start_of_hour().to_iso_string(), "2024-02-29T17:00:00Z");
        assert_eq!(dt.start_of_day().to_iso_string(), "2024-02-29T00:00:00Z");
        assert_eq!(dt.start_of_month().to_date_string(), "2024-02-01");
        assert_eq!(dt.start_of_year().to_date_string(), "2024-01-01");
    }

    #[test]
    fn test_parse_iso() {
        let dt = TallyDateTime::parse("2025-06-15T14:30:00Z").unwrap();
        assert_eq!(dt.to_ymd(), (2025, 6, 15));
        assert_eq!(dt.hour(), 14);
        assert_eq!(dt.tz_offset(), Some(0));
    }

    #[test]
    fn test_parse_offset_folds_into_utc() {
        let dt = TallyDateTime::parse("2025-06-15T01:30:00+05:30").unwrap();
        assert_eq!(dt.to_ymd(), (2025, 6, 14));
        assert_eq!(dt.hour(), 20);
        assert_eq!(dt.to_iso_string(), "2025-06-15T01:30:00+05:30");
    }

    #[test]
    fn test_parse_fraction_and_space() {
        let dt = TallyDateTime::parse("2025-06-15 08:05:09.25").unwrap();
        assert_eq!(dt.millisecond(), 250);
        assert_eq!(dt.second(), 9);
        assert!(TallyDateTime::parse("2025-06-15T08:05:09.x").is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(TallyDateTime::parse("yesterday").is_err());
        assert!(TallyDateTime::parse("2025-13-01").is_err());
        assert!(TallyDateTime::parse("2025-02-30").is_err());
        assert!(TallyDateTime::parse("2025-01-01T25:00").is_err());
        assert_eq!(TallyDateTime::parse("999999-01-01T00:00"), Err(DateTimeError::InvalidYear(999_999)));
        assert!(TallyDateTime::parse("2025-01-01T00:00+99999999").is_err());
        assert!(TallyDateTime::parse("2025-01-01T00:00+05:75").is_err());
    }

    #[test]
    fn test_invalid_components() {
        assert_eq!(TallyDateTime::from_ymd(2025, 0, 1), Err(DateTimeError::InvalidMonth(0)));
        assert!(TallyDateTime::from_ymd_hms(2025, 1, 1, 0, 60, 0).is_err());
        assert!(TallyDateTime::from_ymd_hms_milli(2025, 1, 1, 0, 0, 0, 1000).is_err());
    }
}
