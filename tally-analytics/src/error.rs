//! Errors for contract violations in the analytics engine.
//!
//! Degenerate numeric input never produces an error; it yields the documented
//! default instead. These variants cover caller mistakes only.

use tally_core::{codes, TallyError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    #[error("series must have equal length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("record {index}: missing field '{field}'")]
    MissingField { index: usize, field: String },

    #[error("record {index}: field '{field}' expected {expected}, found {found}")]
    FieldType {
        index: usize,
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("record {index}: invalid timestamp in '{field}': {reason}")]
    InvalidTimestamp {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("unknown forecast method '{0}'")]
    UnknownMethod(String),

    #[error("unknown time interval '{0}'")]
    InvalidInterval(String),

    #[error("cannot forecast {requested} periods, at most {max} allowed")]
    TooManyPeriods { requested: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl From<AnalyticsError> for TallyError {
    fn from(err: AnalyticsError) -> Self {
        let message = err.to_string();
        match err {
            AnalyticsError::LengthMismatch { left, right } => TallyError::length_mismatch(left, right),
            AnalyticsError::MissingField { index, field } => {
                TallyError::new(codes::UNDEFINED_FIELD, message)
                    .with_suggestion("Every record needs the value and grouping fields")
                    .at_record(index, field)
            }
            AnalyticsError::FieldType { index, field, expected, .. } => {
                TallyError::new(codes::TYPE_ERROR, message)
                    .with_suggestion(format!("Convert value to {}", expected))
                    .at_record(index, field)
            }
            AnalyticsError::InvalidTimestamp { index, field, .. } => {
                TallyError::date_parse_error(message).at_record(index, field)
            }
            AnalyticsError::UnknownMethod(_) => TallyError::new(codes::ARG_TYPE, message)
                .with_suggestion("Use one of: linear, moving_average, exponential_smoothing"),
            AnalyticsError::InvalidInterval(_) => TallyError::new(codes::ARG_TYPE, message)
                .with_suggestion("Use one of: hour, day, week, month, year"),
            AnalyticsError::TooManyPeriods { max, .. } => TallyError::new(codes::DOMAIN_ERROR, message)
                .with_suggestion(format!("Request at most {} periods", max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_errors_carry_context() {
        let err: TallyError = AnalyticsError::MissingField {
            index: 4,
            field: "amount".to_string(),
        }
        .into();
        assert_eq!(err.code, codes::UNDEFINED_FIELD);
        let ctx = err.context.unwrap();
        assert_eq!(ctx.record, Some(4));
        assert_eq!(ctx.field.as_deref(), Some("amount"));
    }

    #[test]
    fn test_length_mismatch_code() {
        let err: TallyError = AnalyticsError::LengthMismatch { left: 3, right: 2 }.into();
        assert_eq!(err.code, codes::LENGTH_MISMATCH);
        assert!(err.message.contains("3 vs 2"));
    }

    #[test]
    fn test_too_many_periods_is_domain_error() {
        let err: TallyError = AnalyticsError::TooManyPeriods { requested: 20_000, max: 10_000 }.into();
        assert_eq!(err.code, codes::DOMAIN_ERROR);
        assert!(err.message.contains("20000"));
    }

    #[test]
    fn test_display() {
        let err = AnalyticsError::UnknownMethod("arima".to_string());
        assert_eq!(err.to_string(), "unknown forecast method 'arima'");
    }
}
