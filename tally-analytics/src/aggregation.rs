//! Group records by time bucket or category and summarize each group.
//!
//! Bucket keys are computed in UTC and the buckets come back sorted by key.

use crate::error::{AnalyticsError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tally_core::{Record, TallyDateTime, Value};

/// Bucket used for records without a category label.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Hour,
    Day,
    /// Weeks start on Sunday
    Week,
    Month,
    Year,
}

impl TimeInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInterval::Hour => "hour",
            TimeInterval::Day => "day",
            TimeInterval::Week => "week",
            TimeInterval::Month => "month",
            TimeInterval::Year => "year",
        }
    }

    /// Bucket key of the interval containing `dt`
    pub fn key(&self, dt: &TallyDateTime) -> String {
        match self {
            TimeInterval::Hour => format!("{}T{:02}:00", dt.to_date_string(), dt.hour()),
            TimeInterval::Day => dt.to_date_string(),
            TimeInterval::Week => dt.start_of_week(7).to_date_string(),
            TimeInterval::Month => format!("{:04}-{:02}", dt.year(), dt.month()),
            TimeInterval::Year => format!("{:04}", dt.year()),
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeInterval {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hour" | "hourly" => Ok(TimeInterval::Hour),
            "day" | "daily" => Ok(TimeInterval::Day),
            "week" | "weekly" => Ok(TimeInterval::Week),
            "month" | "monthly" => Ok(TimeInterval::Month),
            "year" | "yearly" => Ok(TimeInterval::Year),
            _ => Err(AnalyticsError::InvalidInterval(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub key: String,
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Running totals for one bucket
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new(value: f64) -> Self {
        Self { count: 1, sum: value, min: value, max: value }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn finish(self, key: String) -> AggregateBucket {
        AggregateBucket {
            key,
            count: self.count,
            sum: self.sum,
            mean: self.sum / self.count as f64,
            min: self.min,
            max: self.max,
        }
    }
}

fn present<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    record.get(field).filter(|v| !v.is_null())
}

/// Numeric value of `field`; text holding a number is accepted.
fn numeric_field(record: &Record, index: usize, field: &str) -> Result<f64> {
    let value = present(record, field).ok_or_else(|| AnalyticsError::MissingField {
        index,
        field: field.to_string(),
    })?;
    value.to_number().as_number().ok_or_else(|| AnalyticsError::FieldType {
        index,
        field: field.to_string(),
        expected: "Number",
        found: value.type_name().to_string(),
    })
}

fn timestamp_field(record: &Record, index: usize, field: &str) -> Result<TallyDateTime> {
    let value = present(record, field).ok_or_else(|| AnalyticsError::MissingField {
        index,
        field: field.to_string(),
    })?;
    match value.to_datetime() {
        Value::DateTime(dt) => Ok(dt),
        Value::Error(e) => Err(AnalyticsError::InvalidTimestamp {
            index,
            field: field.to_string(),
            reason: e.message,
        }),
        other => Err(AnalyticsError::InvalidTimestamp {
            index,
            field: field.to_string(),
            reason: format!("unexpected {}", other.type_name()),
        }),
    }
}

fn group_by<F>(records: &[Record], value_field: &str, mut key_of: F) -> Result<Vec<AggregateBucket>>
where
    F: FnMut(usize, &Record) -> Result<String>,
{
    let mut groups: BTreeMap<String, Accumulator> = BTreeMap::new();
    for (index, record) in records.iter().enumerate() {
        let key = key_of(index, record)?;
        let value = numeric_field(record, index, value_field)?;
        groups
            .entry(key)
            .and_modify(|acc| acc.push(value))
            .or_insert_with(|| Accumulator::new(value));
    }
    tracing::trace!(records = records.len(), buckets = groups.len(), "grouped records");
    Ok(groups.into_iter().map(|(key, acc)| acc.finish(key)).collect())
}

/// Buckets records by the interval containing each timestamp.
///
/// Timestamps may be datetimes, ISO-8601 text or Unix milliseconds.
pub fn group_by_time(
    records: &[Record],
    time_field: &str,
    value_field: &str,
    interval: TimeInterval,
) -> Result<Vec<AggregateBucket>> {
    group_by(records, value_field, |index, record| {
        timestamp_field(record, index, time_field).map(|dt| interval.key(&dt))
    })
}

/// Buckets records by a label field. Missing or null labels go to
/// [`UNCATEGORIZED`].
pub fn group_by_category(
    records: &[Record],
    category_field: &str,
    value_field: &str,
) -> Result<Vec<AggregateBucket>> {
    group_by(records, value_field, |_, record| {
        Ok(present(record, category_field).map_or_else(|| UNCATEGORIZED.to_string(), Value::to_label))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_group_by_category() {
        let records = vec![
            record(&[("cat", Value::from("A")), ("v", Value::from(10.0))]),
            record(&[("cat", Value::from("A")), ("v", Value::from(20.0))]),
            record(&[("cat", Value::from("B")), ("v", Value::from(5.0))]),
        ];
        let buckets = group_by_category(&records, "cat", "v").unwrap();
        assert_eq!(
            buckets,
            vec![
                AggregateBucket { key: "A".into(), count: 2, sum: 30.0, mean: 15.0, min: 10.0, max: 20.0 },
                AggregateBucket { key: "B".into(), count: 1, sum: 5.0, mean: 5.0, min: 5.0, max: 5.0 },
            ]
        );
    }

    #[test]
    fn test_uncategorized_and_text_values() {
        let records = vec![
            record(&[("v", Value::from("7.5"))]),
            record(&[("cat", Value::Null), ("v", Value::from(2.5))]),
        ];
        let buckets = group_by_category(&records, "cat", "v").unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, UNCATEGORIZED);
        assert_eq!(buckets[0].sum, 10.0);
    }

    #[test]
    fn test_bad_value_reports_record() {
        let records = vec![
            record(&[("cat", Value::from("A")), ("v", Value::from(1.0))]),
            record(&[("cat", Value::from("A")), ("v", Value::from("n/a"))]),
        ];
        let err = group_by_category(&records, "cat", "v").unwrap_err();
        assert!(matches!(err, AnalyticsError::FieldType { index: 1, .. }));

        let err = group_by_category(&records[..1], "cat", "amount").unwrap_err();
        assert_eq!(err, AnalyticsError::MissingField { index: 0, field: "amount".into() });
    }

    #[test]
    fn test_group_by_month_sorted() {
        let records = vec![
            record(&[("date", Value::from("2024-03-15")), ("v", Value::from(1.0))]),
            record(&[("date", Value::from("2024-01-31T23:00:00Z")), ("v", Value::from(2.0))]),
            record(&[("date", Value::from("2024-03-01")), ("v", Value::from(3.0))]),
        ];
        let buckets = group_by_time(&records, "date", "v", TimeInterval::Month).unwrap();
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01", "2024-03"]);
        assert_eq!(buckets[1].count, 2);
        assert_eq!(buckets[1].max, 3.0);
    }

    #[test]
    fn test_interval_keys() {
        // 2024-06-12 was a Wednesday
        let dt = TallyDateTime::from_ymd_hms(2024, 6, 12, 14, 35, 0).unwrap();
        assert_eq!(TimeInterval::Hour.key(&dt), "2024-06-12T14:00");
        assert_eq!(TimeInterval::Day.key(&dt), "2024-06-12");
        assert_eq!(TimeInterval::Week.key(&dt), "2024-06-09");
        assert_eq!(TimeInterval::Year.key(&dt), "2024");

        let sunday = TallyDateTime::from_ymd(2024, 6, 9).unwrap();
        assert_eq!(TimeInterval::Week.key(&sunday), "2024-06-09");
    }

    #[test]
    fn test_timestamp_forms() {
        let records = vec![
            record(&[("t", Value::Number(0.0)), ("v", Value::from(1.0))]),
            record(&[("t", Value::from(TallyDateTime::from_ymd(1970, 1, 1).unwrap())), ("v", Value::from(1.0))]),
        ];
        let buckets = group_by_time(&records, "t", "v", TimeInterval::Day).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, "1970-01-01");

        let bad = vec![record(&[("t", Value::from("yesterday")), ("v", Value::from(1.0))])];
        let err = group_by_time(&bad, "t", "v", TimeInterval::Day).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidTimestamp { index: 0, .. }));
    }

    #[test]
    fn test_out_of_range_millis_rejected() {
        for millis in [-1e300, 1e300, f64::NAN] {
            let records = vec![
                record(&[("t", Value::Number(0.0)), ("v", Value::from(1.0))]),
                record(&[("t", Value::Number(millis)), ("v", Value::from(1.0))]),
            ];
            let err = group_by_time(&records, "t", "v", TimeInterval::Week).unwrap_err();
            assert!(matches!(err, AnalyticsError::InvalidTimestamp { index: 1, .. }), "{}", millis);
        }
    }

    #[test]
    fn test_empty_and_interval_parse() {
        assert!(group_by_category(&[], "cat", "v").unwrap().is_empty());
        assert_eq!("Weekly".parse::<TimeInterval>(), Ok(TimeInterval::Week));
        assert!("fortnight".parse::<TimeInterval>().is_err());
    }
}
