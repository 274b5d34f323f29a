//! Position functions: percentile, quartiles.

use super::helpers::{number_arg, series_arg};
use crate::statistics;
use tally_plugin::prelude::*;

// ============ Percentile ============

pub struct Percentile;

static PERCENTILE_ARGS: [ArgMeta; 2] = [
    ArgMeta::required("values", "List<Number>", "Series"),
    ArgMeta::required("p", "Number", "Percentile in [0, 100]"),
];

static PERCENTILE_EXAMPLES: [&str; 2] = [
    "percentile([1, 2, 3, 4, 5], 50) → 3",
    "percentile([1, 2, 3, 4], 50) → 2.5",
];

static PERCENTILE_RELATED: [&str; 2] = ["quartiles", "median"];

impl FunctionPlugin for Percentile {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "percentile",
            description: "Linearly interpolated percentile (index p/100 * (n-1))",
            usage: "percentile(values, p)",
            args: &PERCENTILE_ARGS,
            returns: "Number",
            examples: &PERCENTILE_EXAMPLES,
            category: "stats/position",
            related: &PERCENTILE_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        if args.len() != 2 {
            return Value::Error(TallyError::arg_count("percentile", 2, args.len()));
        }
        let numbers = match series_arg(args, 0, "percentile") {
            Ok(n) => n,
            Err(e) => return Value::Error(e),
        };
        match number_arg(args, 1, "p", "percentile", 50.0) {
            Ok(p) => Value::Number(statistics::percentile(&numbers, p)),
            Err(e) => Value::Error(e),
        }
    }
}

// ============ Quartiles ============

pub struct Quartiles;

static QUARTILES_ARGS: [ArgMeta; 1] = [ArgMeta::required("values", "List<Number>", "Series")];

static QUARTILES_EXAMPLES: [&str; 1] = ["quartiles([1, 2, 3, 4, 5]) → {q1: 2, q2: 3, q3: 4}"];

static QUARTILES_RELATED: [&str; 2] = ["percentile", "iqr"];

impl FunctionPlugin for Quartiles {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "quartiles",
            description: "25th, 50th and 75th percentiles",
            usage: "quartiles(values)",
            args: &QUARTILES_ARGS,
            returns: "Object {q1, q2, q3}",
            examples: &QUARTILES_EXAMPLES,
            category: "stats/position",
            related: &QUARTILES_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        match series_arg(args, 0, "quartiles") {
            Ok(numbers) => statistics::quartiles(&numbers).into(),
            Err(e) => Value::Error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let ctx = EvalContext::default();
        let args = [Value::from(vec![1.0, 2.0, 3.0, 4.0]), Value::Number(50.0)];
        assert_eq!(Percentile.call(&args, &ctx), Value::Number(2.5));
        assert!(Percentile.call(&args[..1], &ctx).is_error());
    }

    #[test]
    fn test_quartiles() {
        let ctx = EvalContext::default();
        let result = Quartiles.call(&[Value::from(vec![1.0, 2.0, 3.0, 4.0, 5.0])], &ctx);
        assert_eq!(result.get("q1"), Value::Number(2.0));
        assert_eq!(result.get("q3"), Value::Number(4.0));
    }
}
