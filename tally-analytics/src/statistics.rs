//! Descriptive statistics over a series.
//!
//! Every function is total: an empty series yields a defined default
//! (0, `None`, or a zeroed struct) instead of an error.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// First, second and third quartile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Smallest and largest value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Descriptive statistics of one series in a single pass of calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
}

pub fn sum(s: &[f64]) -> f64 {
    s.iter().sum()
}

/// Arithmetic mean; 0 for an empty series.
pub fn mean(s: &[f64]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    sum(s) / s.len() as f64
}

/// Ascending copy. NaN sorts last.
pub(crate) fn sorted(s: &[f64]) -> Vec<f64> {
    let mut out = s.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or_else(|| a.is_nan().cmp(&b.is_nan())));
    out
}

/// Middle value, averaging the two middle values for even lengths.
pub fn median(s: &[f64]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let sorted = sorted(s);
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Most frequent value.
///
/// Ties go to the value that occurred first in the input.
pub fn mode(s: &[f64]) -> Option<f64> {
    // -0.0 and 0.0 are the same value here
    let key = |x: f64| if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() };

    let mut slots: HashMap<u64, usize> = HashMap::new();
    let mut table: Vec<(f64, usize)> = Vec::new();
    for &x in s {
        match slots.get(&key(x)) {
            Some(&slot) => table[slot].1 += 1,
            None => {
                slots.insert(key(x), table.len());
                table.push((x, 1));
            }
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for &(value, count) in &table {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Population variance (divides by N); 0 for an empty series.
pub fn variance(s: &[f64]) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let m = mean(s);
    s.iter().map(|x| (x - m).powi(2)).sum::<f64>() / s.len() as f64
}

/// Population standard deviation; 0 for empty or constant series.
pub fn standard_deviation(s: &[f64]) -> f64 {
    variance(s).sqrt()
}

/// Linearly interpolated percentile (R-7): index `p / 100 * (n - 1)`.
///
/// `p` is expected in `[0, 100]`. Outside that range the index is clamped to
/// the ends of the series.
pub fn percentile(s: &[f64], p: f64) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    percentile_sorted(&sorted(s), p)
}

pub(crate) fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let last = (n - 1) as f64;
    let index = (p / 100.0 * last).clamp(0.0, last);
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    let weight = index - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

pub fn quartiles(s: &[f64]) -> Quartiles {
    let sorted = sorted(s);
    Quartiles {
        q1: percentile_sorted(&sorted, 25.0),
        q2: percentile_sorted(&sorted, 50.0),
        q3: percentile_sorted(&sorted, 75.0),
    }
}

/// Minimum and maximum; `{0, 0}` for an empty series.
pub fn range(s: &[f64]) -> Range {
    let Some((&first, rest)) = s.split_first() else {
        return Range { min: 0.0, max: 0.0 };
    };
    rest.iter().fold(Range { min: first, max: first }, |r, &x| Range {
        min: if x.partial_cmp(&r.min) == Some(Ordering::Less) { x } else { r.min },
        max: if x.partial_cmp(&r.max) == Some(Ordering::Greater) { x } else { r.max },
    })
}

pub fn summarize(s: &[f64]) -> Summary {
    let Range { min, max } = range(s);
    let q = quartiles(s);
    let variance = variance(s);
    Summary {
        count: s.len(),
        sum: sum(s),
        mean: mean(s),
        median: median(s),
        std_dev: variance.sqrt(),
        variance,
        min,
        max,
        q1: q.q1,
        q3: q.q3,
    }
}
