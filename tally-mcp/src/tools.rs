//! Tool handlers and JSON conversion.

use crate::McpError;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tally_analytics::{aggregation, anomaly, forecast, statistics, trend, TimeInterval};
use tally_core::{Record, TallyError, Value};
use tally_plugin::{EvalContext, PluginRegistry};

/// Tool descriptions returned by `tools/list`
pub fn tool_definitions() -> JsonValue {
    json!({
        "tools": [
            {
                "name": "call",
                "description": "Call an analytics function by name. Series are JSON arrays of numbers; records are JSON objects.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Function name, e.g. mean, linear_trend, z_score"
                        },
                        "args": {
                            "type": "array",
                            "description": "Positional arguments"
                        }
                    },
                    "required": ["name"]
                }
            },
            {
                "name": "describe",
                "description": "Summary statistics, trend, direction, linear forecast and z-score anomalies of one series.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "values": {
                            "type": "array",
                            "items": { "type": "number" },
                            "description": "Series in time order"
                        },
                        "periods": {
                            "type": "integer",
                            "description": "Forecast horizon (default from config)"
                        }
                    },
                    "required": ["values"]
                }
            },
            {
                "name": "aggregate",
                "description": "Group records by category or time bucket and summarize a numeric field.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "records": {
                            "type": "array",
                            "items": { "type": "object" }
                        },
                        "value_field": { "type": "string" },
                        "category_field": {
                            "type": "string",
                            "description": "Group by this label. Ignored if time_field is given."
                        },
                        "time_field": {
                            "type": "string",
                            "description": "Group by the time bucket of this timestamp"
                        },
                        "interval": {
                            "type": "string",
                            "enum": ["hour", "day", "week", "month", "year"],
                            "default": "day"
                        }
                    },
                    "required": ["records", "value_field"]
                }
            },
            {
                "name": "help",
                "description": "Documentation for a function, or an index of all functions.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Function name. Omit for the index."
                        }
                    }
                }
            },
            {
                "name": "list_functions",
                "description": "List available functions, optionally by category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "enum": [
                                "stats/central", "stats/dispersion", "stats/position", "trend",
                                "forecast", "correlation", "anomaly", "aggregate"
                            ]
                        }
                    }
                }
            }
        ]
    })
}

pub fn dispatch(
    registry: &PluginRegistry,
    ctx: &EvalContext,
    name: &str,
    args: &JsonValue,
) -> Result<JsonValue, McpError> {
    match name {
        "call" => tool_call(registry, ctx, args),
        "describe" => tool_describe(ctx, args),
        "aggregate" => tool_aggregate(args),
        "help" => tool_help(registry, args),
        "list_functions" => tool_list_functions(registry, args),
        _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

fn text_content(text: impl Into<String>) -> JsonValue {
    json!([{ "type": "text", "text": text.into() }])
}

/// Tool-level failure: reported in the result, not as a protocol error
fn tool_error(err: &TallyError) -> JsonValue {
    json!({
        "content": text_content(err.to_string()),
        "error": serde_json::to_value(err).unwrap_or(JsonValue::Null),
        "isError": true
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<JsonValue, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::internal(e.to_string()))
}

fn tool_call(registry: &PluginRegistry, ctx: &EvalContext, args: &JsonValue) -> Result<JsonValue, McpError> {
    let name = args
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing function name"))?;
    let call_args: Vec<Value> = match args.get("args") {
        Some(JsonValue::Array(items)) => items.iter().map(json_to_value).collect(),
        Some(JsonValue::Null) | None => Vec::new(),
        Some(other) => vec![json_to_value(other)],
    };

    let result = registry.call_function(name, &call_args, ctx);
    if let Value::Error(e) = &result {
        tracing::debug!(function = name, code = %e.code, "function returned error");
        return Ok(tool_error(e));
    }

    let data = value_to_json(&result);
    Ok(json!({
        "content": text_content(data.to_string()),
        "data": data,
        "isError": false
    }))
}

fn tool_describe(ctx: &EvalContext, args: &JsonValue) -> Result<JsonValue, McpError> {
    let values = args
        .get("values")
        .and_then(|v| v.as_array())
        .ok_or_else(|| McpError::invalid_params("Missing values array"))?;
    let series: Vec<f64> = values
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| McpError::invalid_params(format!("Not a number: {}", v))))
        .collect::<Result<_, _>>()?;
    let config = &ctx.config;
    let requested = args
        .get("periods")
        .and_then(|v| v.as_u64())
        .map_or(config.forecast_periods, |p| usize::try_from(p).unwrap_or(usize::MAX));
    let periods = match forecast::check_periods(requested, config.max_forecast_periods) {
        Ok(p) => p,
        Err(e) => return Ok(tool_error(&TallyError::from(e).in_function("describe"))),
    };

    let summary = statistics::summarize(&series);
    let fit = trend::linear_trend(&series);
    let direction = trend::classify_slope(fit.slope, config.stable_slope_threshold);
    let projection = forecast::linear_forecast(&series, periods);
    let flags = anomaly::anomalies(&anomaly::z_score(&series, config.zscore_threshold));

    let text = format!(
        "{} points, mean {:.4}, {} (slope {:.4}), {} z-score anomalies",
        summary.count,
        summary.mean,
        direction,
        fit.slope,
        flags.len()
    );

    Ok(json!({
        "content": text_content(text),
        "summary": to_json(&summary)?,
        "trend": to_json(&fit)?,
        "direction": direction,
        "forecast": to_json(&projection)?,
        "anomalies": to_json(&flags)?,
        "isError": false
    }))
}

fn tool_aggregate(args: &JsonValue) -> Result<JsonValue, McpError> {
    let records: Vec<Record> = args
        .get("records")
        .and_then(|v| v.as_array())
        .ok_or_else(|| McpError::invalid_params("Missing records array"))?
        .iter()
        .enumerate()
        .map(|(i, r)| match json_to_value(r) {
            Value::Object(fields) => Ok(fields),
            _ => Err(McpError::invalid_params(format!("Record {} is not an object", i))),
        })
        .collect::<Result<_, _>>()?;
    let value_field = args
        .get("value_field")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing value_field"))?;

    let buckets = match (args.get("time_field").and_then(|v| v.as_str()), args.get("category_field").and_then(|v| v.as_str())) {
        (Some(time_field), _) => {
            let interval = match args.get("interval").and_then(|v| v.as_str()) {
                Some(name) => match name.parse::<TimeInterval>() {
                    Ok(i) => i,
                    Err(e) => return Ok(tool_error(&TallyError::from(e))),
                },
                None => TimeInterval::Day,
            };
            aggregation::group_by_time(&records, time_field, value_field, interval)
        }
        (None, Some(category_field)) => aggregation::group_by_category(&records, category_field, value_field),
        (None, None) => {
            return Err(McpError::invalid_params("Provide category_field or time_field"));
        }
    };

    match buckets {
        Ok(buckets) => Ok(json!({
            "content": text_content(format!("{} buckets", buckets.len())),
            "buckets": to_json(&buckets)?,
            "isError": false
        })),
        Err(e) => {
            tracing::debug!(error = %e, "aggregation rejected records");
            Ok(tool_error(&TallyError::from(e).in_function("aggregate")))
        }
    }
}

fn tool_help(registry: &PluginRegistry, args: &JsonValue) -> Result<JsonValue, McpError> {
    let name = args.get("name").and_then(|v| v.as_str());
    let help = registry.help(name);
    Ok(json!({
        "content": text_content(format_help(&help)),
        "data": value_to_json(&help),
        "isError": help.is_error()
    }))
}

fn format_help(help: &Value) -> String {
    match help {
        Value::Object(map) => {
            let mut out = String::new();
            if let Some(Value::Text(n)) = map.get("name") {
                out.push_str(&format!("# {}\n\n", n));
            }
            if let Some(Value::Text(d)) = map.get("description") {
                out.push_str(&format!("{}\n\n", d));
            }
            if let Some(Value::Text(u)) = map.get("usage") {
                out.push_str(&format!("**Usage:** `{}`\n\n", u));
            }
            if let Some(Value::Object(cats)) = map.get("functions") {
                let mut names: Vec<&String> = cats.keys().collect();
                names.sort();
                for cat in names {
                    out.push_str(&format!("- {}: {}\n", cat, cats[cat]));
                }
            }
            out
        }
        Value::Error(e) => format!("Error: {}", e.message),
        other => other.to_string(),
    }
}

fn tool_list_functions(registry: &PluginRegistry, args: &JsonValue) -> Result<JsonValue, McpError> {
    let category = args.get("category").and_then(|v| v.as_str());
    let functions = registry.list_functions(category);
    let count = functions.as_list().map_or(0, |l| l.len());
    Ok(json!({
        "content": text_content(format!("{} functions", count)),
        "data": value_to_json(&functions)
    }))
}

pub fn json_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(arr) => Value::List(arr.iter().map(json_to_value).collect()),
        JsonValue::Object(obj) => Value::Object(obj.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

/// Non-finite numbers have no JSON form and become null.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::DateTime(dt) => JsonValue::String(dt.to_iso_string()),
        Value::List(l) => JsonValue::Array(l.iter().map(value_to_json).collect()),
        Value::Object(o) => JsonValue::Object(o.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect()),
        Value::Error(e) => json!({"_error": {"code": e.code, "message": e.message}}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PluginRegistry {
        tally_analytics::load_analytics_library(PluginRegistry::new())
    }

    #[test]
    fn test_call_mean() {
        let ctx = EvalContext::default();
        let result = dispatch(&registry(), &ctx, "call", &json!({"name": "mean", "args": [[1, 2, 3, 4]]})).unwrap();
        assert_eq!(result["data"], json!(2.5));
        assert_eq!(result["isError"], json!(false));
    }

    #[test]
    fn test_call_error_is_tool_error() {
        let ctx = EvalContext::default();
        let args = json!({"name": "pearson", "args": [[1, 2, 3], [1, 2]]});
        let result = dispatch(&registry(), &ctx, "call", &args).unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["error"]["code"], json!("LENGTH_MISMATCH"));
    }

    #[test]
    fn test_describe_flat_series_has_null_r_squared() {
        let ctx = EvalContext::default();
        let result = dispatch(&registry(), &ctx, "describe", &json!({"values": [5, 5, 5, 5]})).unwrap();
        assert_eq!(result["direction"], json!("stable"));
        assert!(result["trend"]["rSquared"].is_null());
        assert_eq!(result["summary"]["stdDev"], json!(0.0));
        assert_eq!(result["anomalies"], json!([]));
    }

    #[test]
    fn test_describe_forecast() {
        let ctx = EvalContext::default();
        let args = json!({"values": [1, 2, 3, 4, 5], "periods": 2});
        let result = dispatch(&registry(), &ctx, "describe", &args).unwrap();
        assert_eq!(result["forecast"]["predictions"].as_array().map(|a| a.len()), Some(2));
        assert_eq!(result["forecast"]["method"], json!("linear"));
    }

    #[test]
    fn test_describe_rejects_huge_horizon() {
        let ctx = EvalContext::default();
        let args = json!({"values": [1, 2, 3], "periods": 10_000_000_000_000_000_000u64});
        let result = dispatch(&registry(), &ctx, "describe", &args).unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["error"]["code"], json!("DOMAIN_ERROR"));
    }

    #[test]
    fn test_aggregate_by_category() {
        let args = json!({
            "records": [{"cat": "A", "v": 10}, {"cat": "A", "v": 20}, {"cat": "B", "v": 5}],
            "category_field": "cat",
            "value_field": "v"
        });
        let result = dispatch(&registry(), &EvalContext::default(), "aggregate", &args).unwrap();
        assert_eq!(result["buckets"][0]["key"], json!("A"));
        assert_eq!(result["buckets"][0]["sum"], json!(30.0));
        assert_eq!(result["buckets"][1]["count"], json!(1));
    }

    #[test]
    fn test_aggregate_by_week() {
        let args = json!({
            "records": [
                {"date": "2024-06-12", "v": 1},
                {"date": "2024-06-15T10:00:00Z", "v": 2},
                {"date": "2024-06-16", "v": 4}
            ],
            "time_field": "date",
            "value_field": "v",
            "interval": "week"
        });
        let result = dispatch(&registry(), &EvalContext::default(), "aggregate", &args).unwrap();
        assert_eq!(result["buckets"][0]["key"], json!("2024-06-09"));
        assert_eq!(result["buckets"][0]["count"], json!(2));
        assert_eq!(result["buckets"][1]["key"], json!("2024-06-16"));
    }

    #[test]
    fn test_aggregate_bad_record_reports_index() {
        let args = json!({
            "records": [{"cat": "A", "v": 1}, {"cat": "A", "v": "lots"}],
            "category_field": "cat",
            "value_field": "v"
        });
        let result = dispatch(&registry(), &EvalContext::default(), "aggregate", &args).unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["error"]["context"]["record"], json!(1));
    }

    #[test]
    fn test_missing_params() {
        let ctx = EvalContext::default();
        let err = dispatch(&registry(), &ctx, "describe", &json!({})).unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(dispatch(&registry(), &ctx, "nope", &json!({})).is_err());
    }

    #[test]
    fn test_value_to_json_non_finite() {
        assert_eq!(value_to_json(&Value::Number(f64::NAN)), JsonValue::Null);
        assert_eq!(value_to_json(&Value::Number(1.5)), json!(1.5));
    }
}
