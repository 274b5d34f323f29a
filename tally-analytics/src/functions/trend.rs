//! Trend functions: linear fit, moving averages, direction.

use super::helpers::{count_arg, number_arg, series_arg};
use crate::trend;
use tally_plugin::prelude::*;

// ============ LinearTrend ============

pub struct LinearTrend;

static LINEAR_TREND_ARGS: [ArgMeta; 1] = [ArgMeta::required("values", "List<Number>", "Series in time order")];

static LINEAR_TREND_EXAMPLES: [&str; 2] = [
    "linear_trend([1, 2, 3, 4, 5]) → {slope: 1, intercept: 1, rSquared: 1}",
    "linear_trend([5, 5, 5]) → {slope: 0, intercept: 5, rSquared: NaN}",
];

static LINEAR_TREND_RELATED: [&str; 2] = ["trend_direction", "linear_forecast"];

impl FunctionPlugin for LinearTrend {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "linear_trend",
            description: "Least-squares line through (index, value); rSquared is NaN for a flat series",
            usage: "linear_trend(values)",
            args: &LINEAR_TREND_ARGS,
            returns: "Object {slope, intercept, rSquared}",
            examples: &LINEAR_TREND_EXAMPLES,
            category: "trend",
            related: &LINEAR_TREND_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match series_arg(args, 0, "linear_trend") {
            Ok(s) => trend::linear_trend(&s).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ MovingAverage ============

pub struct MovingAverage;

static MOVING_AVERAGE_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series in time order"),
    ArgMeta::optional("window", "Number", "Points per average", "config moving_average_window"),
];

static MOVING_AVERAGE_EXAMPLES: [&str; 2] = [
    "moving_average([1, 2, 3, 4], 2) → [1.5, 2.5, 3.5]",
    "moving_average([1, 2], 3) → [1, 2]",
];

static MOVING_AVERAGE_RELATED: [&str; 2] = ["ema", "moving_average_forecast"];

impl FunctionPlugin for MovingAverage {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "moving_average",
            description: "Simple moving average; the input comes back unchanged if the window does not fit",
            usage: "moving_average(values, window)",
            args: &MOVING_AVERAGE_ARGS,
            returns: "List<Number>",
            examples: &MOVING_AVERAGE_EXAMPLES,
            category: "trend",
            related: &MOVING_AVERAGE_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "moving_average") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match count_arg(args, 1, "window", "moving_average", ctx.config.moving_average_window) {
            Ok(window) => trend::moving_average(&s, window).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Ema ============

pub struct Ema;

static EMA_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series in time order"),
    ArgMeta::optional("alpha", "Number", "Smoothing factor in (0, 1]", "config ema_alpha (0.3)"),
];

static EMA_EXAMPLES: [&str; 1] = ["ema([10, 20, 30], 0.5) → [10, 15, 22.5]"];

static EMA_RELATED: [&str; 2] = ["moving_average", "exponential_smoothing_forecast"];

impl FunctionPlugin for Ema {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "ema",
            description: "Exponential moving average seeded with the first value",
            usage: "ema(values, alpha)",
            args: &EMA_ARGS,
            returns: "List<Number>",
            examples: &EMA_EXAMPLES,
            category: "trend",
            related: &EMA_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "ema") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match number_arg(args, 1, "alpha", "ema", ctx.config.ema_alpha) {
            Ok(alpha) => trend::exponential_moving_average(&s, alpha).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ TrendDirection ============

pub struct TrendDirection;

static TREND_DIRECTION_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series in time order"),
    ArgMeta::optional(
        "threshold",
        "Number",
        "Absolute slope below which the series is stable",
        "config stable_slope_threshold (0.01)",
    ),
];

static TREND_DIRECTION_EXAMPLES: [&str; 3] = [
    "trend_direction([1, 2, 3]) → \"increasing\"",
    "trend_direction([5, 5, 5, 5]) → \"stable\"",
    "trend_direction([300, 200, 100], 150) → \"stable\"",
];

static TREND_DIRECTION_RELATED: [&str; 1] = ["linear_trend"];

impl FunctionPlugin for TrendDirection {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "trend_direction",
            description: "Classify the fitted slope as increasing, decreasing or stable (absolute threshold)",
            usage: "trend_direction(values, threshold)",
            args: &TREND_DIRECTION_ARGS,
            returns: "Text",
            examples: &TREND_DIRECTION_EXAMPLES,
            category: "trend",
            related: &TREND_DIRECTION_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "trend_direction") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let threshold = match number_arg(
            args,
            1,
            "threshold",
            "trend_direction",
            ctx.config.stable_slope_threshold,
        ) {
            Ok(t) => t,
            Err(e) => return Value::Error(e),
        };
        let slope = trend::linear_trend(&s).slope;
        Value::Text(trend::classify_slope(slope, threshold).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::AnalyticsConfig;

    #[test]
    fn test_moving_average_uses_config_window() {
        let ctx = EvalContext::new(AnalyticsConfig { moving_average_window: 2, ..Default::default() });
        let result = MovingAverage.call(&[Value::from(vec![1.0, 2.0, 3.0, 4.0])], &ctx);
        assert_eq!(result, Value::from(vec![1.5, 2.5, 3.5]));
    }

    #[test]
    fn test_trend_direction() {
        let ctx = EvalContext::default();
        let flat = TrendDirection.call(&[Value::from(vec![5.0, 5.0, 5.0, 5.0])], &ctx);
        assert_eq!(flat, Value::from("stable"));

        let args = [Value::from(vec![300.0, 200.0, 100.0]), Value::Number(150.0)];
        assert_eq!(TrendDirection.call(&args, &ctx), Value::from("stable"));
        assert_eq!(TrendDirection.call(&args[..1], &ctx), Value::from("decreasing"));
    }

    #[test]
    fn test_linear_trend_object() {
        let ctx = EvalContext::default();
        let result = LinearTrend.call(&[Value::from(vec![2.0, 4.0, 6.0])], &ctx);
        assert_eq!(result.get("slope"), Value::Number(2.0));
    }
}
