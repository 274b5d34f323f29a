//! Correlation functions: pearson, spearman, rank.

use super::helpers::{extract_two_lists, into_value, series_arg};
use crate::correlation;
use tally_plugin::prelude::*;

static PAIRED_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("x", "List<Number>", "First series"),
    ArgMeta::required("y", "List<Number>", "Second series, same length as x"),
];

// ============ Pearson ============

pub struct Pearson;

static PEARSON_EXAMPLES: [&str; 2] = [
    "pearson([1, 2, 3], [2, 4, 6]) → 1",
    "pearson([1, 2, 3], [5, 5, 5]) → 0",
];

static PEARSON_RELATED: [&str; 1] = ["spearman"];

impl FunctionPlugin for Pearson {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "pearson",
            description: "Product-moment correlation; 0 when either series is constant",
            usage: "pearson(x, y)",
            args: &PAIRED_ARGS,
            returns: "Number",
            examples: &PEARSON_EXAMPLES,
            category: "correlation",
            related: &PEARSON_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_two_lists(args, "pearson") {
            Ok((x, y)) => into_value(correlation::pearson(&x, &y), "pearson"),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Spearman ============

pub struct Spearman;

static SPEARMAN_EXAMPLES: [&str; 1] = ["spearman([1, 2, 3, 4], [1, 8, 27, 64]) → 1"];

static SPEARMAN_RELATED: [&str; 2] = ["pearson", "rank"];

impl FunctionPlugin for Spearman {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "spearman",
            description: "Rank correlation; tied values share the rank of their first sorted position",
            usage: "spearman(x, y)",
            args: &PAIRED_ARGS,
            returns: "Number",
            examples: &SPEARMAN_EXAMPLES,
            category: "correlation",
            related: &SPEARMAN_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match extract_two_lists(args, "spearman") {
            Ok((x, y)) => into_value(correlation::spearman(&x, &y), "spearman"),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Rank ============

pub struct Rank;

static RANK_ARGS: [ArgMeta; 1] = [ArgMeta::required("values", "List<Number>", "Series to rank")];

static RANK_EXAMPLES: [&str; 1] = ["rank([10, 20, 20, 30]) → [1, 2, 2, 4]"];

static RANK_RELATED: [&str; 1] = ["spearman"];

impl FunctionPlugin for Rank {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "rank",
            description: "1-based ascending ranks in input order",
            usage: "rank(values)",
            args: &RANK_ARGS,
            returns: "List<Number>",
            examples: &RANK_EXAMPLES,
            category: "correlation",
            related: &RANK_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match series_arg(args, 0, "rank") {
            Ok(s) => correlation::rank(&s).into(),
            Err(e) => Value::Error(e),
        }
    }
}
