//! Trend analysis: least-squares fit, moving averages, direction.

use crate::statistics::mean;
use serde::Serialize;
use std::fmt;

/// Smoothing factor used when the caller does not supply one.
pub const DEFAULT_EMA_ALPHA: f64 = 0.3;

/// Absolute slope below which a series is classified as stable.
///
/// The cutoff is not relative to the magnitude of the series, so callers
/// comparing series of very different scales should normalize first.
pub const STABLE_SLOPE_THRESHOLD: f64 = 0.01;

/// Ordinary least-squares fit of `s[i]` against `i`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination. NaN when the series has zero variance.
    pub r_squared: f64,
}

impl TrendResult {
    /// Fitted value at index `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Least-squares line through `(i, s[i])`.
///
/// Series shorter than 2 give `{0, 0, 0}`.
pub fn linear_trend(s: &[f64]) -> TrendResult {
    let n = s.len();
    if n < 2 {
        return TrendResult { slope: 0.0, intercept: 0.0, r_squared: 0.0 };
    }

    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in s.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / (nf * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / nf;

    let y_mean = sum_y / nf;
    let ss_tot = s.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>();
    let r_squared = if ss_tot == 0.0 {
        tracing::debug!(len = n, "zero variance, r_squared undefined");
        f64::NAN
    } else {
        let ss_res = s
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum::<f64>();
        1.0 - ss_res / ss_tot
    };

    TrendResult { slope, intercept, r_squared }
}

/// Simple moving average over a sliding window.
///
/// Output has `n - window + 1` points. When the window is 0 or longer than
/// the series, the input is returned unchanged.
pub fn moving_average(s: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || s.len() < window {
        tracing::debug!(len = s.len(), window, "window does not fit, returning input");
        return s.to_vec();
    }
    s.windows(window).map(mean).collect()
}

/// Exponential moving average seeded with the first value.
pub fn exponential_moving_average(s: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(s.len());
    for &x in s {
        let next = match out.last() {
            Some(&prev) => alpha * x + (1.0 - alpha) * prev,
            None => x,
        };
        out.push(next);
    }
    out
}

pub fn classify_slope(slope: f64, threshold: f64) -> TrendDirection {
    if slope.abs() < threshold {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

pub fn trend_direction(s: &[f64]) -> TrendDirection {
    classify_slope(linear_trend(s).slope, STABLE_SLOPE_THRESHOLD)
}
