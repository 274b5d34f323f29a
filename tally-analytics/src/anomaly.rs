//! Outlier detection: z-score, Tukey fences, moving-average residuals.

use crate::statistics::{mean, quartiles, standard_deviation};
use serde::Serialize;

pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 2.0;
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
pub const DEFAULT_ANOMALY_WINDOW: usize = 10;
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyFlag {
    pub value: f64,
    pub index: usize,
    pub score: f64,
    pub is_anomaly: bool,
}

/// Keep only the flagged points
pub fn anomalies(flags: &[AnomalyFlag]) -> Vec<AnomalyFlag> {
    flags.iter().filter(|f| f.is_anomaly).copied().collect()
}

/// Flags points whose z-score reaches `threshold` in absolute value.
///
/// The bound is inclusive. A constant series scores 0 everywhere and
/// nothing is flagged.
pub fn z_score(s: &[f64], threshold: f64) -> Vec<AnomalyFlag> {
    let m = mean(s);
    let sd = standard_deviation(s);
    if sd == 0.0 {
        tracing::debug!(len = s.len(), "zero standard deviation, nothing flagged");
    }

    s.iter()
        .enumerate()
        .map(|(index, &value)| {
            let score = if sd == 0.0 { 0.0 } else { (value - m) / sd };
            AnomalyFlag { value, index, score, is_anomaly: sd != 0.0 && score.abs() >= threshold }
        })
        .collect()
}

/// Tukey's fences `[Q1 - k*IQR, Q3 + k*IQR]`.
///
/// The score is how far a point lies beyond the nearer fence, 0 inside.
pub fn iqr(s: &[f64], multiplier: f64) -> Vec<AnomalyFlag> {
    let q = quartiles(s);
    let spread = q.q3 - q.q1;
    let lower = q.q1 - multiplier * spread;
    let upper = q.q3 + multiplier * spread;

    s.iter()
        .enumerate()
        .map(|(index, &value)| {
            let score = if value < lower {
                lower - value
            } else if value > upper {
                value - upper
            } else {
                0.0
            };
            AnomalyFlag { value, index, score, is_anomaly: value < lower || value > upper }
        })
        .collect()
}

/// Compares each point from index `window` on with the mean of the `window`
/// points before it.
///
/// The prediction for index `i` uses `s[i - window..i]` only. A point is
/// flagged when its absolute error exceeds `threshold` times the mean of the
/// up to `window` errors before it. The first scored point has no earlier
/// errors and is never flagged. After perfectly predicted history any error
/// is flagged and scores infinity. Series no longer than the window produce
/// no flags.
pub fn moving_average_anomaly(s: &[f64], window: usize, threshold: f64) -> Vec<AnomalyFlag> {
    if window == 0 || s.len() <= window {
        tracing::debug!(len = s.len(), window, "series too short for moving-average anomaly");
        return Vec::new();
    }

    let mut errors: Vec<f64> = Vec::with_capacity(s.len() - window);
    let mut flags = Vec::with_capacity(s.len() - window);
    for i in window..s.len() {
        let predicted = mean(&s[i - window..i]);
        let error = (s[i] - predicted).abs();

        let history = &errors[errors.len().saturating_sub(window)..];
        let (score, is_anomaly) = if history.is_empty() {
            (0.0, false)
        } else {
            let baseline = mean(history);
            let score = match (baseline == 0.0, error == 0.0) {
                (false, _) => error / baseline,
                (true, true) => 0.0,
                (true, false) => f64::INFINITY,
            };
            (score, error > threshold * baseline)
        };

        flags.push(AnomalyFlag { value: s[i], index: i, score, is_anomaly });
        errors.push(error);
    }
    flags
}
