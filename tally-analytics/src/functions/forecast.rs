//! Forecast functions.

use super::helpers::{count_arg, number_arg, opt_text_arg, series_arg};
use crate::forecast::{self, ForecastMethod};
use tally_plugin::prelude::*;

/// Forecast horizon, bounded by the configured maximum
fn periods_arg(args: &[Value], index: usize, func: &str, ctx: &EvalContext) -> Result<usize, TallyError> {
    let periods = count_arg(args, index, "periods", func, ctx.config.forecast_periods)?;
    forecast::check_periods(periods, ctx.config.max_forecast_periods)
        .map_err(|e| TallyError::from(e).in_function(func))
}

// ============ LinearForecast ============

pub struct LinearForecast;

static LINEAR_FORECAST_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "History in time order"),
    ArgMeta::optional("periods", "Number", "Steps to predict", "config forecast_periods (3)"),
];

static LINEAR_FORECAST_EXAMPLES: [&str; 1] =
    ["linear_forecast([1, 2, 3, 4, 5], 3) → {predictions: [6, 7, 8], confidence: 1, ...}"];

static LINEAR_FORECAST_RELATED: [&str; 2] = ["linear_trend", "forecast"];

impl FunctionPlugin for LinearForecast {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "linear_forecast",
            description: "Extend the least-squares line; confidence is its R²",
            usage: "linear_forecast(values, periods)",
            args: &LINEAR_FORECAST_ARGS,
            returns: "Object {predictions, confidence, method, trend}",
            examples: &LINEAR_FORECAST_EXAMPLES,
            category: "forecast",
            related: &LINEAR_FORECAST_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "linear_forecast") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match periods_arg(args, 1, "linear_forecast", ctx) {
            Ok(periods) => forecast::linear_forecast(&s, periods).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ MovingAverageForecast ============

pub struct MovingAverageForecast;

static MA_FORECAST_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("values", "List<Number>", "History in time order"),
    ArgMeta::optional("window", "Number", "Points per average", "config moving_average_window (3)"),
    ArgMeta::optional("periods", "Number", "Steps to predict", "config forecast_periods (3)"),
];

static MA_FORECAST_EXAMPLES: [&str; 1] =
    ["moving_average_forecast([1, 2, 3, 4], 2, 2) → {predictions: [3.5, 3.5], confidence: 0.7}"];

static MA_FORECAST_RELATED: [&str; 2] = ["moving_average", "forecast"];

impl FunctionPlugin for MovingAverageForecast {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "moving_average_forecast",
            description: "Repeat the last moving-average value (confidence 0.7)",
            usage: "moving_average_forecast(values, window, periods)",
            args: &MA_FORECAST_ARGS,
            returns: "Object {predictions, confidence, method}",
            examples: &MA_FORECAST_EXAMPLES,
            category: "forecast",
            related: &MA_FORECAST_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let func = "moving_average_forecast";
        let s = match series_arg(args, 0, func) {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let window = match count_arg(args, 1, "window", func, ctx.config.moving_average_window) {
            Ok(w) => w,
            Err(e) => return Value::Error(e),
        };
        match periods_arg(args, 2, func, ctx) {
            Ok(periods) => forecast::moving_average_forecast(&s, window, periods).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ ExponentialSmoothingForecast ============

pub struct ExponentialSmoothingForecast;

static ES_FORECAST_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("values", "List<Number>", "History in time order"),
    ArgMeta::optional("alpha", "Number", "Smoothing factor in (0, 1]", "config ema_alpha (0.3)"),
    ArgMeta::optional("periods", "Number", "Steps to predict", "config forecast_periods (3)"),
];

static ES_FORECAST_EXAMPLES: [&str; 1] =
    ["exponential_smoothing_forecast([10, 20, 30], 0.5, 2) → {predictions: [22.5, 22.5], confidence: 0.6}"];

static ES_FORECAST_RELATED: [&str; 2] = ["ema", "forecast"];

impl FunctionPlugin for ExponentialSmoothingForecast {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "exponential_smoothing_forecast",
            description: "Repeat the last exponentially smoothed value (confidence 0.6)",
            usage: "exponential_smoothing_forecast(values, alpha, periods)",
            args: &ES_FORECAST_ARGS,
            returns: "Object {predictions, confidence, method}",
            examples: &ES_FORECAST_EXAMPLES,
            category: "forecast",
            related: &ES_FORECAST_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let func = "exponential_smoothing_forecast";
        let s = match series_arg(args, 0, func) {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let alpha = match number_arg(args, 1, "alpha", func, ctx.config.ema_alpha) {
            Ok(a) => a,
            Err(e) => return Value::Error(e),
        };
        match periods_arg(args, 2, func, ctx) {
            Ok(periods) => forecast::exponential_smoothing_forecast(&s, alpha, periods).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Forecast ============

pub struct Forecast;

static FORECAST_ARGS: [ArgMeta; 3] = [
    ArgMeta::required("values", "List<Number>", "History in time order"),
    ArgMeta::optional(
        "method",
        "Text",
        "linear | moving_average | exponential_smoothing",
        "linear",
    ),
    ArgMeta::optional("periods", "Number", "Steps to predict", "config forecast_periods (3)"),
];

static FORECAST_EXAMPLES: [&str; 2] = [
    "forecast([1, 2, 3, 4, 5]) → linear, 3 periods",
    "forecast(sales, \"moving_average\", 6)",
];

static FORECAST_RELATED: [&str; 3] = [
    "linear_forecast",
    "moving_average_forecast",
    "exponential_smoothing_forecast",
];

impl FunctionPlugin for Forecast {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "forecast",
            description: "Forecast by method name, with window and alpha from the configuration",
            usage: "forecast(values, method, periods)",
            args: &FORECAST_ARGS,
            returns: "Object {predictions, confidence, method, trend?}",
            examples: &FORECAST_EXAMPLES,
            category: "forecast",
            related: &FORECAST_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let s = match series_arg(args, 0, "forecast") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let method = match opt_text_arg(args, 1, "method", "forecast") {
            Ok(None) => ForecastMethod::Linear,
            Ok(Some(name)) => match name.parse::<ForecastMethod>() {
                Ok(m) => m,
                Err(e) => return Value::Error(TallyError::from(e).in_function("forecast")),
            },
            Err(e) => return Value::Error(e),
        };
        match periods_arg(args, 2, "forecast", ctx) {
            Ok(periods) => forecast::forecast(&s, method, periods, &ctx.config).into(),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ SeasonalDecomposition ============

pub struct SeasonalDecomposition;

static SEASONAL_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "History covering at least two seasons"),
    ArgMeta::optional("period", "Number", "Season length", "config seasonal_period (12)"),
];

static SEASONAL_EXAMPLES: [&str; 2] = [
    "seasonal_decomposition(monthly_sales, 12) → {trend, seasonal, residuals, detrended}",
    "seasonal_decomposition([1, 2, 3], 2) → null",
];

static SEASONAL_RELATED: [&str; 1] = ["linear_trend"];

impl FunctionPlugin for SeasonalDecomposition {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "seasonal_decomposition",
            description: "Split into linear trend, per-phase seasonal means and residuals; null with fewer than two seasons",
            usage: "seasonal_decomposition(values, period)",
            args: &SEASONAL_ARGS,
            returns: "Object {trend, seasonal, residuals, detrended} | Null",
            examples: &SEASONAL_EXAMPLES,
            category: "forecast",
            related: &SEASONAL_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        let func = "seasonal_decomposition";
        let s = match series_arg(args, 0, func) {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        match count_arg(args, 1, "period", func, ctx.config.seasonal_period) {
            Ok(period) => forecast::seasonal_decomposition(&s, period).into(),
            Err(e) => Value::Error(e),
        }
    }
}
