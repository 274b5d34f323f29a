//! Dispersion functions: variance, standard deviation, range, summary.

use super::helpers::extract_numbers;
use crate::statistics;
use tally_plugin::prelude::*;

static VALUES_ARGS: [ArgMeta; 1] = [ArgMeta::required(
    "values",
    "List<Number> | Number...",
    "Series to measure",
)];

// ============ Variance ============

pub struct Variance;

static VARIANCE_EXAMPLES: [&str; 2] = [
    "variance([2, 4, 4, 4, 5, 5, 7, 9]) → 4",
    "variance([]) → 0",
];

static VARIANCE_RELATED: [&str; 2] = ["stddev", "summary"];

impl FunctionPlugin for Variance {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "variance",
            description: "Population variance (divides by N)",
            usage: "variance(values)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &VARIANCE_EXAMPLES,
            category: "stats/dispersion",
            related: &VARIANCE_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => Value::Number(statistics::variance(&numbers)),
            Err(e) => Value::Error(e.in_function("variance")),
        }
    }
}

// ============ Stddev ============

pub struct Stddev;

static STDDEV_EXAMPLES: [&str; 2] = [
    "stddev([2, 4, 4, 4, 5, 5, 7, 9]) → 2",
    "stddev([4, 4, 4, 4]) → 0",
];

static STDDEV_RELATED: [&str; 2] = ["variance", "z_score"];

impl FunctionPlugin for Stddev {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "stddev",
            description: "Population standard deviation; 0 for empty or constant series",
            usage: "stddev(values)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &STDDEV_EXAMPLES,
            category: "stats/dispersion",
            related: &STDDEV_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => Value::Number(statistics::standard_deviation(&numbers)),
            Err(e) => Value::Error(e.in_function("stddev")),
        }
    }
}

// ============ Range ============

pub struct Range;

static RANGE_EXAMPLES: [&str; 2] = [
    "range([3, -1, 8]) → {min: -1, max: 8}",
    "range([]) → {min: 0, max: 0}",
];

static RANGE_RELATED: [&str; 2] = ["quartiles", "summary"];

impl FunctionPlugin for Range {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "range",
            description: "Smallest and largest value",
            usage: "range(values)",
            args: &VALUES_ARGS,
            returns: "Object {min, max}",
            examples: &RANGE_EXAMPLES,
            category: "stats/dispersion",
            related: &RANGE_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => statistics::range(&numbers).into(),
            Err(e) => Value::Error(e.in_function("range")),
        }
    }
}

// ============ Summary ============

pub struct Summary;

static SUMMARY_EXAMPLES: [&str; 1] =
    ["summary([1, 2, 3, 4]) → {count: 4, sum: 10, mean: 2.5, median: 2.5, ...}"];

static SUMMARY_RELATED: [&str; 3] = ["mean", "stddev", "quartiles"];

impl FunctionPlugin for Summary {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "summary",
            description: "Count, sum, mean, median, spread, extremes and quartiles in one call",
            usage: "summary(values)",
            args: &VALUES_ARGS,
            returns: "Object {count, sum, mean, median, stdDev, variance, min, max, q1, q3}",
            examples: &SUMMARY_EXAMPLES,
            category: "stats/dispersion",
            related: &SUMMARY_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => statistics::summarize(&numbers).into(),
            Err(e) => Value::Error(e.in_function("summary")),
        }
    }
}
