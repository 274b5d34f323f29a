//! Anomaly detection functions.
//!
//! Each returns one flag object per scored point; callers filter on
//! `isAnomaly`.

use super::helpers::{count_arg, list, number_arg, series_arg};
use crate::anomaly;
use tally_plugin::prelude::*;

// ============ ZScore ============

pub struct ZScore;

static ZSCORE_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series to scan"),
    ArgMeta::optional("threshold", "Number", "|z| at which a point is flagged", "config zscore_threshold (2)"),
];

static ZSCORE_EXAMPLES: [&str; 2] = [
    "z_score([1, 1, 1, 1, 100], 2) → index 4 flagged",
    "z_score([1, 1, 1, 1]) → nothing flagged",
];

static ZSCORE_RELATED: [&str; 2] = ["iqr", "moving_average_anomaly"];

impl FunctionPlugin for ZScore {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "z_score",
            description: "Flag points at least `threshold` standard deviations from the mean",
            usage: "z_score(values, threshold)",
            args: &ZSCORE_ARGS,
            returns: "List<Object {value, index, score, isAnomaly}>",
            examples: &ZSCORE_EXAMPLES,
            category: "anomaly",
            related: &ZSCORE_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "z_score") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match number_arg(args, 1, "threshold", "z_score", ctx.config.zscore_threshold) {
            Ok(threshold) => list(anomaly::z_score(&s, threshold)),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Iqr ============

pub struct Iqr;

static IQR_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series to scan"),
    ArgMeta::optional("multiplier", "Number", "Fence multiplier k", "config iqr_multiplier (1.5)"),
];

static IQR_EXAMPLES: [&str; 1] = ["iqr([1, 2, 3, 4, 5, 2, 3, 4, 3, 20]) → index 9 flagged"];

static IQR_RELATED: [&str; 2] = ["quartiles", "z_score"];

impl FunctionPlugin for Iqr {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "iqr",
            description: "Flag points outside Tukey's fences [Q1 - k*IQR, Q3 + k*IQR]",
            usage: "iqr(values, multiplier)",
            args: &IQR_ARGS,
            returns: "List<Object {value, index, score, isAnomaly}>",
            examples: &IQR_EXAMPLES,
            category: "anomaly",
            related: &IQR_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "iqr") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match number_arg(args, 1, "multiplier", "iqr", ctx.config.iqr_multiplier) {
            Ok(k) => list(anomaly::iqr(&s, k)),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ MovingAverageAnomaly ============

pub struct MovingAverageAnomaly;

static MA_ANOMALY_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("values", "List<Number>", "Series in time order"),
    ArgMeta::optional("window", "Number", "Look-back window", "config anomaly_window (10)"),
    ArgMeta::optional("threshold", "Number", "Error multiple that flags a point", "config anomaly_threshold (2)"),
];

static MA_ANOMALY_EXAMPLES: [&str; 1] =
    ["moving_average_anomaly([10, 10, 10, 10, 10, 10, 40], 3, 2) → index 6 flagged"];

static MA_ANOMALY_RELATED: [&str; 2] = ["moving_average", "z_score"];

impl FunctionPlugin for MovingAverageAnomaly {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "moving_average_anomaly",
            description: "Flag points far from the mean of the preceding window, relative to earlier errors",
            usage: "moving_average_anomaly(values, window, threshold)",
            args: &MA_ANOMALY_ARGS,
            returns: "List<Object {value, index, score, isAnomaly}>",
            examples: &MA_ANOMALY_EXAMPLES,
            category: "anomaly",
            related: &MA_ANOMALY_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let func = "moving_average_anomaly";
        let s = match series_arg(args, 0, func) {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let window = match count_arg(args, 1, "window", func, ctx.config.anomaly_window) {
            Ok(w) => w,
            Err(e) => return Value::Error(e),
        };
        match number_arg(args, 2, "threshold", func, ctx.config.anomaly_threshold) {
            Ok(threshold) => list(anomaly::moving_average_anomaly(&s, window, threshold)),
            Err(e) => Value::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagged(result: &Value) -> Vec<f64> {
        result
            .as_list()
            .unwrap_or_default()
            .iter()
            .filter(|f| f.get("isAnomaly") == Value::Bool(true))
            .filter_map(|f| f.get("index").as_number())
            .collect()
    }

    #[test]
    fn test_z_score_default_threshold() {
        let ctx = EvalContext::default();
        let result = ZScore.call(&[Value::from(vec![1.0, 1.0, 1.0, 1.0, 100.0])], &ctx);
        assert_eq!(flagged(&result), vec![4.0]);
    }

    #[test]
    fn test_moving_average_anomaly_args() {
        let ctx = EvalContext::default();
        let args = [
            Value::from(vec![10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 40.0]),
            Value::Number(3.0),
            Value::Number(2.0),
        ];
        assert_eq!(flagged(&MovingAverageAnomaly.call(&args, &ctx)), vec![6.0]);

        // Default window of 10 does not fit
        let short = MovingAverageAnomaly.call(&args[..1], &ctx);
        assert_eq!(short, Value::List(vec![]));
    }

    #[test]
    fn test_iqr_rejects_text_multiplier() {
        let ctx = EvalContext::default();
        let args = [Value::from(vec![1.0, 2.0]), Value::from("wide")];
        assert!(Iqr.call(&args, &ctx).is_error());
    }
}
