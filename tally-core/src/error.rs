//! Structured errors for callers of the function registry
//!
//! Errors never crash the system. They are values that propagate through
//! calls and carry a machine-readable code plus a hint for fixing the input.

use crate::{ConfigError, DateTimeError};
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const UNDEFINED_FUNC: &str = "UNDEFINED_FUNC";
    pub const UNDEFINED_FIELD: &str = "UNDEFINED_FIELD";
    pub const TYPE_ERROR: &str = "TYPE_ERROR";
    pub const ARG_COUNT: &str = "ARG_COUNT";
    pub const ARG_TYPE: &str = "ARG_TYPE";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const LENGTH_MISMATCH: &str = "LENGTH_MISMATCH";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
    // DateTime-specific error codes
    pub const INVALID_DATE: &str = "INVALID_DATE";
    pub const INVALID_TIME: &str = "INVALID_TIME";
    pub const DATE_PARSE_ERROR: &str = "DATE_PARSE_ERROR";
}

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Call failed
    Error,
    /// Server cannot continue
    Fatal,
}

/// Context about where an error occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Function that produced the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,

    /// Record field involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Position of the offending record in its input list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<usize>,

    /// Propagation notes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured error carried inside `Value::Error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Where the error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,

    /// Severity level
    pub severity: Severity,
}

impl TallyError {
    /// Create a new error
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            context: None,
            severity: Severity::Error,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set function context
    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.function = Some(function.into());
        self
    }

    /// Builder: set record context
    pub fn at_record(mut self, index: usize, field: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.record = Some(index);
        ctx.field = Some(field.into());
        self
    }

    /// Builder: add propagation note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    /// Builder: set severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    // ========== Common Error Constructors ==========

    pub fn parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details.into()))
            .with_suggestion("Check the request JSON")
    }

    pub fn undefined_func(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FUNC, format!("Unknown function: {}", name))
            .with_suggestion("Use list_functions to see what is available")
    }

    pub fn undefined_field(name: &str) -> Self {
        Self::new(codes::UNDEFINED_FIELD, format!("Undefined field: {}", name))
            .with_suggestion("Check the record field names")
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        Self::new(codes::TYPE_ERROR, format!("Expected {}, got {}", expected, got))
            .with_suggestion(format!("Convert value to {}", expected))
    }

    pub fn arg_count(func: &str, expected: usize, got: usize) -> Self {
        Self::new(codes::ARG_COUNT,
            format!("{}() expects {} arguments, got {}", func, expected, got))
            .with_suggestion(format!("Use help('{}') for usage", func))
    }

    pub fn arg_type(func: &str, arg: &str, expected: &str, got: &str) -> Self {
        Self::new(codes::ARG_TYPE,
            format!("{}() argument '{}': expected {}, got {}", func, arg, expected, got))
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn length_mismatch(left: usize, right: usize) -> Self {
        Self::new(codes::LENGTH_MISMATCH,
            format!("Series must have equal length: {} vs {}", left, right))
            .with_suggestion("Pair each x value with exactly one y value")
    }

    pub fn not_found(name: &str) -> Self {
        Self::new(codes::NOT_FOUND, format!("No function named '{}'", name))
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL, format!("Internal error: {}", details.into()))
            .with_suggestion("This is a bug, please report it")
            .with_severity(Severity::Fatal)
    }

    // ========== DateTime Error Constructors ==========

    pub fn invalid_date(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_DATE, format!("Invalid date: {}", details.into()))
            .with_suggestion("Check date components (year, month 1-12, day 1-31)")
    }

    pub fn invalid_time(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_TIME, format!("Invalid time: {}", details.into()))
            .with_suggestion("Check time components (hour 0-23, minute 0-59, second 0-59)")
    }

    pub fn date_parse_error(details: impl Into<String>) -> Self {
        Self::new(codes::DATE_PARSE_ERROR, format!("DateTime parse error: {}", details.into()))
            .with_suggestion("Use ISO 8601 format (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")
    }
}

impl std::fmt::Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for TallyError {}

impl From<DateTimeError> for TallyError {
    fn from(err: DateTimeError) -> Self {
        match err {
            DateTimeError::InvalidYear(y) => Self::invalid_date(format!("year {} out of range -9999 to 9999", y)),
            DateTimeError::InvalidMonth(m) => Self::invalid_date(format!("month {} out of range 1-12", m)),
            DateTimeError::InvalidDay(d, m, y) => Self::invalid_date(format!("day {} invalid for {}/{}", d, m, y)),
            DateTimeError::InvalidHour(h) => Self::invalid_time(format!("hour {} out of range 0-23", h)),
            DateTimeError::InvalidMinute(m) => Self::invalid_time(format!("minute {} out of range 0-59", m)),
            DateTimeError::InvalidSecond(s) => Self::invalid_time(format!("second {} out of range 0-59", s)),
            DateTimeError::InvalidMilli(n) => Self::invalid_time(format!("millisecond {} out of range", n)),
            DateTimeError::OutOfRange(ms) => Self::invalid_date(format!("{} ms is outside years -9999 to 9999", ms)),
            DateTimeError::ParseError(s) => Self::date_parse_error(s),
        }
    }
}

impl From<ConfigError> for TallyError {
    fn from(err: ConfigError) -> Self {
        Self::new(codes::CONFIG_ERROR, err.to_string())
            .with_suggestion("Fix the configuration file or unset TALLY_CONFIG")
            .with_severity(Severity::Fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_suggestion() {
        let err = TallyError::length_mismatch(3, 4);
        let text = err.to_string();
        assert!(text.starts_with("[LENGTH_MISMATCH]"));
        assert!(text.contains("3 vs 4"));
        assert!(text.contains("suggestion"));
    }

    #[test]
    fn test_context_builders() {
        let err = TallyError::undefined_field("amount")
            .in_function("group_by_category")
            .at_record(2, "amount")
            .with_note("while aggregating");
        let ctx = err.context.unwrap();
        assert_eq!(ctx.function.as_deref(), Some("group_by_category"));
        assert_eq!(ctx.record, Some(2));
        assert_eq!(ctx.field.as_deref(), Some("amount"));
        assert_eq!(ctx.notes.len(), 1);
    }

    #[test]
    fn test_from_datetime_error() {
        let err: TallyError = DateTimeError::InvalidMonth(13).into();
        assert_eq!(err.code, codes::INVALID_DATE);
        let err: TallyError = DateTimeError::ParseError("bad".to_string()).into();
        assert_eq!(err.code, codes::DATE_PARSE_ERROR);
    }

    #[test]
    fn test_serializes_lowercase_severity() {
        let err = TallyError::internal("boom");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["severity"], "fatal");
        assert!(json.get("context").is_none());
    }
}
