//! Record aggregation functions.

use super::helpers::{into_value, list, opt_text_arg, records_arg, text_arg};
use crate::aggregation::{self, TimeInterval};
use tally_plugin::prelude::*;

// ============ GroupByTime ============

pub struct GroupByTime;

static GROUP_BY_TIME_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("records", "List<Object>", "Records to group"),
    ArgMeta::required("time_field", "Text", "Timestamp field (datetime, ISO text or Unix ms)"),
    ArgMeta::required("value_field", "Text", "Numeric field to summarize"),
    ArgMeta::optional("interval", "Text", "hour | day | week | month | year", "day"),
];

static GROUP_BY_TIME_EXAMPLES: [&str; 2] = [
    "group_by_time(expenses, \"date\", \"amount\", \"month\") → [{key: \"2025-01\", count, sum, mean, min, max}, ...]",
    "group_by_time(logs, \"at\", \"ms\", \"week\") → keys are the Sunday starting each week",
];

static GROUP_BY_TIME_RELATED: [&str; 1] = ["group_by_category"];

impl FunctionPlugin for GroupByTime {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "group_by_time",
            description: "Summarize a value field per UTC time bucket, sorted by key",
            usage: "group_by_time(records, time_field, value_field, interval)",
            args: &GROUP_BY_TIME_ARGS,
            returns: "List<Object {key, count, sum, mean, min, max}>",
            examples: &GROUP_BY_TIME_EXAMPLES,
            category: "aggregate",
            related: &GROUP_BY_TIME_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        let func = "group_by_time";
        let records = match records_arg(args, 0, func) {
            Ok(r) => r,
            Err(e) => return Value::Error(e),
        };
        let time_field = match text_arg(args, 1, "time_field", func) {
            Ok(f) => f,
            Err(e) => return Value::Error(e),
        };
        let value_field = match text_arg(args, 2, "value_field", func) {
            Ok(f) => f,
            Err(e) => return Value::Error(e),
        };
        let interval = match opt_text_arg(args, 3, "interval", func) {
            Ok(Some(name)) => match name.parse::<TimeInterval>() {
                Ok(i) => i,
                Err(e) => return Value::Error(TallyError::from(e).in_function(func)),
            },
            Ok(None) => TimeInterval::Day,
            Err(e) => return Value::Error(e),
        };
        into_value(
            aggregation::group_by_time(&records, time_field, value_field, interval).map(list),
            func,
        )
    }
}

// ============ GroupByCategory ============

pub struct GroupByCategory;

static GROUP_BY_CATEGORY_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("records", "List<Object>", "Records to group"),
    ArgMeta::required("category_field", "Text", "Label field; missing labels go to \"uncategorized\""),
    ArgMeta::required("value_field", "Text", "Numeric field to summarize"),
];

static GROUP_BY_CATEGORY_EXAMPLES: [&str; 1] = [
    "group_by_category([{cat: \"A\", v: 10}, {cat: \"A\", v: 20}, {cat: \"B\", v: 5}], \"cat\", \"v\") → A: {count: 2, sum: 30, mean: 15}, B: {count: 1, sum: 5}",
];

static GROUP_BY_CATEGORY_RELATED: [&str; 1] = ["group_by_time"];

impl FunctionPlugin for GroupByCategory {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "group_by_category",
            description: "Summarize a value field per category label, sorted by label",
            usage: "group_by_category(records, category_field, value_field)",
            args: &GROUP_BY_CATEGORY_ARGS,
            returns: "List<Object {key, count, sum, mean, min, max}>",
            examples: &GROUP_BY_CATEGORY_EXAMPLES,
            category: "aggregate",
            related: &GROUP_BY_CATEGORY_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        let func = "group_by_category";
        let records = match records_arg(args, 0, func) {
            Ok(r) => r,
            Err(e) => return Value::Error(e),
        };
        let category_field = match text_arg(args, 1, "category_field", func) {
            Ok(f) => f,
            Err(e) => return Value::Error(e),
        };
        let value_field = match text_arg(args, 2, "value_field", func) {
            Ok(f) => f,
            Err(e) => return Value::Error(e),
        };
        into_value(
            aggregation::group_by_category(&records, category_field, value_field).map(list),
            func,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn record(cat: &str, v: f64) -> Value {
        let mut fields = HashMap::new();
        fields.insert("cat".to_string(), Value::from(cat));
        fields.insert("v".to_string(), Value::Number(v));
        Value::Object(fields)
    }

    #[test]
    fn test_group_by_category_buckets() {
        let ctx = EvalContext::default();
        let args = [
            Value::List(vec![record("A", 10.0), record("A", 20.0), record("B", 5.0)]),
            Value::from("cat"),
            Value::from("v"),
        ];
        let result = GroupByCategory.call(&args, &ctx);
        let buckets = result.as_list().unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].get("key"), Value::from("A"));
        assert_eq!(buckets[0].get("mean"), Value::Number(15.0));
        assert_eq!(buckets[1].get("max"), Value::Number(5.0));
    }

    #[test]
    fn test_missing_value_field_reports_record() {
        let ctx = EvalContext::default();
        let args = [Value::List(vec![record("A", 1.0)]), Value::from("cat"), Value::from("amount")];
        match GroupByCategory.call(&args, &ctx) {
            Value::Error(e) => {
                assert_eq!(e.code, "UNDEFINED_FIELD");
                assert_eq!(e.context.and_then(|c| c.record), Some(0));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_group_by_time_bad_interval() {
        let ctx = EvalContext::default();
        let args = [Value::List(vec![]), Value::from("date"), Value::from("v"), Value::from("decade")];
        assert!(GroupByTime.call(&args, &ctx).is_error());

        let ok = GroupByTime.call(&args[..3], &ctx);
        assert_eq!(ok, Value::List(vec![]));
    }
}
