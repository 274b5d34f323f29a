//! Tally Core - Fundamental types
//!
//! This crate provides the core types used throughout Tally:
//! - `Value`: Runtime values (numbers, text, datetimes, objects, errors)
//! - `Record`: a business record as a field map
//! - `TallyDateTime`: UTC instants for time bucketing
//! - `AnalyticsConfig`: defaults for the analytics functions
//! - `TallyError`: Structured errors for registry callers

mod config;
mod datetime;
mod error;
mod value;

pub use config::{AnalyticsConfig, ConfigError};
pub use datetime::{
    days_in_month, is_leap_year, DateTimeError, TallyDateTime, MAX_UNIX_MILLIS, MAX_YEAR, MILLIS_PER_DAY,
    MILLIS_PER_HOUR, MILLIS_PER_MINUTE, MILLIS_PER_SECOND, MIN_UNIX_MILLIS, MIN_YEAR,
};
pub use error::{codes, ErrorContext, Severity, TallyError};
pub use value::{Record, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::codes;
    pub use crate::{AnalyticsConfig, Record, Severity, TallyDateTime, TallyError, Value};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_value_round_trips_through_json() {
        let value = Value::Error(TallyError::length_mismatch(2, 3).in_function("pearson"));
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_record_with_timestamp_text() {
        let mut record = Record::new();
        record.insert("date".to_string(), Value::from("2025-03-04"));
        record.insert("amount".to_string(), Value::from("1200.50"));

        let date = record["date"].to_datetime();
        assert_eq!(date.as_datetime().map(|d| d.month()), Some(3));
        assert_eq!(record["amount"].to_number(), Value::Number(1200.5));
    }
}
