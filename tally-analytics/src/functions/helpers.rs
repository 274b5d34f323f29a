//! Argument extraction and result conversion for the registry adapters.

use crate::aggregation::AggregateBucket;
use crate::anomaly::AnomalyFlag;
use crate::forecast::{ForecastResult, SeasonalDecomposition};
use crate::statistics::{Quartiles, Range, Summary};
use crate::trend::TrendResult;
use std::collections::HashMap;
use tally_core::{Record, TallyError, Value};

/// Extract numbers from arguments, handling both varargs and List.
/// Text holding a number is accepted.
pub fn extract_numbers(args: &[Value]) -> Result<Vec<f64>, TallyError> {
    let mut numbers = Vec::new();

    for arg in args {
        match arg {
            Value::List(list) => {
                for item in list {
                    numbers.push(to_f64(item)?);
                }
            }
            other => numbers.push(to_f64(other)?),
        }
    }

    Ok(numbers)
}

fn to_f64(value: &Value) -> Result<f64, TallyError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Error(e) => Err(e.clone()),
        Value::Text(_) => match value.to_number() {
            Value::Number(n) => Ok(n),
            Value::Error(e) => Err(e),
            _ => Err(TallyError::type_error("Number", "Text")),
        },
        other => Err(TallyError::type_error("Number", other.type_name())),
    }
}

/// The series argument at `index`, required
pub fn series_arg(args: &[Value], index: usize, func: &str) -> Result<Vec<f64>, TallyError> {
    match args.get(index) {
        Some(arg) => extract_numbers(std::slice::from_ref(arg)).map_err(|e| e.in_function(func)),
        None => Err(TallyError::arg_count(func, index + 1, args.len())),
    }
}

/// Extract exactly two lists for paired functions. Length is checked by the
/// engine.
pub fn extract_two_lists(args: &[Value], func: &str) -> Result<(Vec<f64>, Vec<f64>), TallyError> {
    if args.len() != 2 {
        return Err(TallyError::arg_count(func, 2, args.len()));
    }
    Ok((series_arg(args, 0, func)?, series_arg(args, 1, func)?))
}

/// Optional numeric argument; absent or null takes `default`.
pub fn number_arg(
    args: &[Value],
    index: usize,
    name: &str,
    func: &str,
    default: f64,
) -> Result<f64, TallyError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Error(e)) => Err(e.clone()),
        Some(v) => to_f64(v).map_err(|_| TallyError::arg_type(func, name, "Number", v.type_name())),
    }
}

/// Optional non-negative integer argument (window sizes, periods)
pub fn count_arg(
    args: &[Value],
    index: usize,
    name: &str,
    func: &str,
    default: usize,
) -> Result<usize, TallyError> {
    let n = number_arg(args, index, name, func, default as f64)?;
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 {
        return Err(TallyError::domain_error(format!(
            "{}() argument '{}' must be a non-negative integer, got {}",
            func, name, n
        )));
    }
    Ok(n as usize)
}

/// Required text argument
pub fn text_arg<'a>(args: &'a [Value], index: usize, name: &str, func: &str) -> Result<&'a str, TallyError> {
    match args.get(index) {
        Some(Value::Text(s)) => Ok(s.as_str()),
        Some(Value::Error(e)) => Err(e.clone()),
        Some(v) => Err(TallyError::arg_type(func, name, "Text", v.type_name())),
        None => Err(TallyError::arg_count(func, index + 1, args.len())),
    }
}

/// Optional text argument
pub fn opt_text_arg<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
    func: &str,
) -> Result<Option<&'a str>, TallyError> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => text_arg(args, index, name, func).map(Some),
    }
}

/// List of records (objects) at `index`
pub fn records_arg(args: &[Value], index: usize, func: &str) -> Result<Vec<Record>, TallyError> {
    match args.get(index) {
        Some(Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(fields) => Ok(fields.clone()),
                Value::Error(e) => Err(e.clone()),
                other => Err(TallyError::type_error("Object", other.type_name())
                    .in_function(func)
                    .with_note(format!("at record {}", i))),
            })
            .collect(),
        Some(Value::Error(e)) => Err(e.clone()),
        Some(v) => Err(TallyError::arg_type(func, "records", "List<Object>", v.type_name())),
        None => Err(TallyError::arg_count(func, index + 1, args.len())),
    }
}

/// Build an object value from fields
pub fn object<const N: usize>(fields: [(&str, Value); N]) -> Value {
    Value::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect::<HashMap<_, _>>())
}

/// Unwrap a result into a value, tagging errors with the function name
pub fn into_value<T: Into<Value>, E: Into<TallyError>>(result: Result<T, E>, func: &str) -> Value {
    match result {
        Ok(v) => v.into(),
        Err(e) => {
            let err: TallyError = e.into();
            Value::Error(err.in_function(func))
        }
    }
}

// ========== Result conversions ==========

impl From<Quartiles> for Value {
    fn from(q: Quartiles) -> Self {
        object([("q1", q.q1.into()), ("q2", q.q2.into()), ("q3", q.q3.into())])
    }
}

impl From<Range> for Value {
    fn from(r: Range) -> Self {
        object([("min", r.min.into()), ("max", r.max.into())])
    }
}

impl From<Summary> for Value {
    fn from(s: Summary) -> Self {
        object([
            ("count", s.count.into()),
            ("sum", s.sum.into()),
            ("mean", s.mean.into()),
            ("median", s.median.into()),
            ("stdDev", s.std_dev.into()),
            ("variance", s.variance.into()),
            ("min", s.min.into()),
            ("max", s.max.into()),
            ("q1", s.q1.into()),
            ("q3", s.q3.into()),
        ])
    }
}

impl From<TrendResult> for Value {
    fn from(t: TrendResult) -> Self {
        object([
            ("slope", t.slope.into()),
            ("intercept", t.intercept.into()),
            ("rSquared", t.r_squared.into()),
        ])
    }
}

impl From<ForecastResult> for Value {
    fn from(f: ForecastResult) -> Self {
        object([
            ("predictions", f.predictions.into()),
            ("confidence", f.confidence.into()),
            ("method", f.method.as_str().into()),
            ("trend", f.trend.into()),
        ])
    }
}

impl From<SeasonalDecomposition> for Value {
    fn from(d: SeasonalDecomposition) -> Self {
        object([
            ("trend", d.trend.into()),
            ("seasonal", d.seasonal.into()),
            ("residuals", d.residuals.into()),
            ("detrended", d.detrended.into()),
        ])
    }
}

impl From<AnomalyFlag> for Value {
    fn from(f: AnomalyFlag) -> Self {
        object([
            ("value", f.value.into()),
            ("index", f.index.into()),
            ("score", f.score.into()),
            ("isAnomaly", f.is_anomaly.into()),
        ])
    }
}

impl From<AggregateBucket> for Value {
    fn from(b: AggregateBucket) -> Self {
        object([
            ("key", b.key.into()),
            ("count", b.count.into()),
            ("sum", b.sum.into()),
            ("mean", b.mean.into()),
            ("min", b.min.into()),
            ("max", b.max.into()),
        ])
    }
}

/// Convert a list of results into a List value
pub fn list<T: Into<Value>>(items: Vec<T>) -> Value {
    Value::List(items.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_numbers_mixed() {
        let args = vec![
            Value::Number(1.0),
            Value::List(vec![Value::Number(2.0), Value::from("3")]),
        ];
        assert_eq!(extract_numbers(&args).unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(extract_numbers(&[Value::Bool(true)]).is_err());
    }

    #[test]
    fn test_count_arg() {
        let args = vec![Value::List(vec![]), Value::Number(3.0), Value::Number(2.5)];
        assert_eq!(count_arg(&args, 1, "window", "f", 10).unwrap(), 3);
        assert!(count_arg(&args, 2, "window", "f", 10).is_err());
        assert_eq!(count_arg(&args, 5, "window", "f", 10).unwrap(), 10);
    }

    #[test]
    fn test_records_arg() {
        let mut fields = HashMap::new();
        fields.insert("v".to_string(), Value::Number(1.0));
        let args = vec![Value::List(vec![Value::Object(fields), Value::Number(2.0)])];
        let err = records_arg(&args, 0, "group_by_category").unwrap_err();
        assert_eq!(err.code, "TYPE_ERROR");
    }

    #[test]
    fn test_trend_conversion() {
        let v: Value = TrendResult { slope: 1.0, intercept: 0.0, r_squared: 1.0 }.into();
        assert_eq!(v.get("rSquared"), Value::Number(1.0));
    }
}
