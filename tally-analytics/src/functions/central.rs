//! Central tendency functions: mean, median, mode, sum.
//!
//! Empty input yields 0 (or null for mode) rather than an error.

use super::helpers::extract_numbers;
use crate::statistics;
use tally_plugin::prelude::*;

static VALUES_ARGS: [ArgMeta; 1] = [ArgMeta::required(
    "values",
    "List<Number> | Number...",
    "Series to summarize",
)];

// ============ Mean ============

pub struct Mean;

static MEAN_EXAMPLES: [&str; 3] = [
    "mean([1, 2, 3, 4]) → 2.5",
    "mean(5) → 5",
    "mean([]) → 0",
];

static MEAN_RELATED: [&str; 3] = ["median", "mode", "summary"];

impl FunctionPlugin for Mean {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "mean",
            description: "Arithmetic mean (average) of values; 0 for an empty series",
            usage: "mean(values) or mean(a, b, c, ...)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &MEAN_EXAMPLES,
            category: "stats/central",
            related: &MEAN_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => Value::Number(statistics::mean(&numbers)),
            Err(e) => Value::Error(e.in_function("mean")),
        }
    }
}

// ============ Median ============

pub struct Median;

static MEDIAN_EXAMPLES: [&str; 2] = [
    "median([1, 3, 2]) → 2",
    "median([1, 2, 3, 4]) → 2.5",
];

static MEDIAN_RELATED: [&str; 3] = ["mean", "mode", "percentile"];

impl FunctionPlugin for Median {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "median",
            description: "Middle value (average of two middle if even count)",
            usage: "median(values)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &MEDIAN_EXAMPLES,
            category: "stats/central",
            related: &MEDIAN_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => Value::Number(statistics::median(&numbers)),
            Err(e) => Value::Error(e.in_function("median")),
        }
    }
}

// ============ Mode ============

pub struct Mode;

static MODE_EXAMPLES: [&str; 3] = [
    "mode([1, 2, 2, 3]) → 2",
    "mode([3, 1, 1, 3]) → 3",
    "mode([]) → null",
];

static MODE_RELATED: [&str; 2] = ["mean", "median"];

impl FunctionPlugin for Mode {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "mode",
            description: "Most frequent value; ties go to the value seen first",
            usage: "mode(values)",
            args: &VALUES_ARGS,
            returns: "Number | Null",
            examples: &MODE_EXAMPLES,
            category: "stats/central",
            related: &MODE_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => statistics::mode(&numbers).into(),
            Err(e) => Value::Error(e.in_function("mode")),
        }
    }
}

// ============ Sum ============

pub struct Sum;

static SUM_EXAMPLES: [&str; 2] = ["sum([1, 2, 3]) → 6", "sum(4, 5) → 9"];

static SUM_RELATED: [&str; 2] = ["mean", "summary"];

impl FunctionPlugin for Sum {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "sum",
            description: "Total of values",
            usage: "sum(values)",
            args: &VALUES_ARGS,
            returns: "Number",
            examples: &SUM_EXAMPLES,
            category: "stats/central",
            related: &SUM_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_numbers(args) {
            Ok(numbers) => Value::Number(statistics::sum(&numbers)),
            Err(e) => Value::Error(e.in_function("sum")),
        }
    }
}
