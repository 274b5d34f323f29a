//! Forecasting from a fitted trend or a smoothed level.

use crate::error::{AnalyticsError, Result};
use crate::statistics::mean;
use crate::trend::{exponential_moving_average, linear_trend, moving_average, TrendResult};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tally_core::AnalyticsConfig;

/// Confidence reported by the moving-average forecast.
pub const MOVING_AVERAGE_CONFIDENCE: f64 = 0.7;

/// Confidence reported by the exponential-smoothing forecast.
pub const EXPONENTIAL_SMOOTHING_CONFIDENCE: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    Linear,
    MovingAverage,
    ExponentialSmoothing,
}

impl ForecastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::Linear => "linear",
            ForecastMethod::MovingAverage => "moving_average",
            ForecastMethod::ExponentialSmoothing => "exponential_smoothing",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastMethod {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(ForecastMethod::Linear),
            "moving_average" | "ma" => Ok(ForecastMethod::MovingAverage),
            "exponential_smoothing" | "ema" => Ok(ForecastMethod::ExponentialSmoothing),
            _ => Err(AnalyticsError::UnknownMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub predictions: Vec<f64>,
    pub confidence: f64,
    pub method: ForecastMethod,
    /// The fitted line, for linear forecasts only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendResult>,
}

impl ForecastResult {
    fn empty(method: ForecastMethod) -> Self {
        Self { predictions: Vec::new(), confidence: 0.0, method, trend: None }
    }

    fn flat(level: f64, periods: usize, confidence: f64, method: ForecastMethod) -> Self {
        Self { predictions: vec![level; periods], confidence, method, trend: None }
    }
}

/// Seasonal split of a series around its linear trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalDecomposition {
    /// Fitted trend value at each index
    pub trend: Vec<f64>,
    /// Mean detrended value per phase, `period` entries
    pub seasonal: Vec<f64>,
    pub residuals: Vec<f64>,
    pub detrended: Vec<f64>,
}

/// Extends the least-squares line `periods` steps past the last index.
///
/// Confidence is the fit's R², so it is NaN for a flat series.
pub fn linear_forecast(s: &[f64], periods: usize) -> ForecastResult {
    let trend = linear_trend(s);
    let last_index = s.len() as f64 - 1.0;
    let predictions = (1..=periods).map(|k| trend.predict(last_index + k as f64)).collect();
    ForecastResult {
        predictions,
        confidence: trend.r_squared,
        method: ForecastMethod::Linear,
        trend: Some(trend),
    }
}

/// Repeats the last moving-average value.
pub fn moving_average_forecast(s: &[f64], window: usize, periods: usize) -> ForecastResult {
    match moving_average(s, window).last() {
        Some(&level) => {
            ForecastResult::flat(level, periods, MOVING_AVERAGE_CONFIDENCE, ForecastMethod::MovingAverage)
        }
        None => ForecastResult::empty(ForecastMethod::MovingAverage),
    }
}

/// Repeats the last exponentially smoothed value.
pub fn exponential_smoothing_forecast(s: &[f64], alpha: f64, periods: usize) -> ForecastResult {
    match exponential_moving_average(s, alpha).last() {
        Some(&level) => ForecastResult::flat(
            level,
            periods,
            EXPONENTIAL_SMOOTHING_CONFIDENCE,
            ForecastMethod::ExponentialSmoothing,
        ),
        None => ForecastResult::empty(ForecastMethod::ExponentialSmoothing),
    }
}

/// Rejects a horizon longer than `max`.
pub fn check_periods(periods: usize, max: usize) -> Result<usize> {
    if periods > max {
        return Err(AnalyticsError::TooManyPeriods { requested: periods, max });
    }
    Ok(periods)
}

/// Forecast with the window and smoothing factor taken from `config`.
pub fn forecast(
    s: &[f64],
    method: ForecastMethod,
    periods: usize,
    config: &AnalyticsConfig,
) -> ForecastResult {
    tracing::trace!(len = s.len(), %method, periods, "forecast");
    match method {
        ForecastMethod::Linear => linear_forecast(s, periods),
        ForecastMethod::MovingAverage => {
            moving_average_forecast(s, config.moving_average_window, periods)
        }
        ForecastMethod::ExponentialSmoothing => {
            exponential_smoothing_forecast(s, config.ema_alpha, periods)
        }
    }
}

/// Splits `s` into linear trend, per-phase seasonal means and residuals.
///
/// Needs at least two full seasons; returns `None` otherwise.
pub fn seasonal_decomposition(s: &[f64], period: usize) -> Option<SeasonalDecomposition> {
    if period == 0 || period > s.len() / 2 {
        tracing::debug!(len = s.len(), period, "series too short for seasonal decomposition");
        return None;
    }

    let fit = linear_trend(s);
    let trend: Vec<f64> = (0..s.len()).map(|i| fit.predict(i as f64)).collect();
    let detrended: Vec<f64> = s.iter().zip(&trend).map(|(y, t)| y - t).collect();

    let seasonal: Vec<f64> = (0..period)
        .map(|phase| {
            let values: Vec<f64> = detrended.iter().skip(phase).step_by(period).copied().collect();
            mean(&values)
        })
        .collect();

    let residuals = s
        .iter()
        .enumerate()
        .map(|(i, y)| y - trend[i] - seasonal[i % period])
        .collect();

    Some(SeasonalDecomposition { trend, seasonal, residuals, detrended })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_linear_forecast_continues_slope() {
        let result = linear_forecast(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(result.predictions.len(), 3);
        for (got, want) in result.predictions.iter().zip([6.0, 7.0, 8.0]) {
            assert!(approx(*got, want));
        }
        assert!(approx(result.confidence, 1.0));
        assert!(result.trend.is_some());
        assert_eq!(result.method, ForecastMethod::Linear);
    }

    #[test]
    fn test_check_periods() {
        assert_eq!(check_periods(3, 10), Ok(3));
        assert_eq!(check_periods(10, 10), Ok(10));
        assert_eq!(
            check_periods(usize::MAX, 10),
            Err(AnalyticsError::TooManyPeriods { requested: usize::MAX, max: 10 })
        );
    }

    #[test]
    fn test_seasonal_decomposition_huge_period() {
        assert!(seasonal_decomposition(&[1.0, 2.0, 3.0, 4.0], usize::MAX).is_none());
    }

    #[test]
    fn test_linear_forecast_degenerate() {
        let result = linear_forecast(&[], 2);
        assert_eq!(result.predictions, vec![0.0, 0.0]);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_moving_average_forecast() {
        let result = moving_average_forecast(&[1.0, 2.0, 3.0, 4.0], 2, 2);
        assert_eq!(result.predictions, vec![3.5, 3.5]);
        assert_eq!(result.confidence, MOVING_AVERAGE_CONFIDENCE);

        let empty = moving_average_forecast(&[], 3, 4);
        assert!(empty.predictions.is_empty());
        assert_eq!(empty.confidence, 0.0);
    }

    #[test]
    fn test_exponential_smoothing_forecast() {
        let result = exponential_smoothing_forecast(&[10.0, 20.0, 30.0], 0.5, 3);
        assert_eq!(result.predictions, vec![22.5; 3]);
        assert_eq!(result.confidence, EXPONENTIAL_SMOOTHING_CONFIDENCE);
        assert!(exponential_smoothing_forecast(&[], 0.3, 3).predictions.is_empty());
    }

    #[test]
    fn test_dispatch_uses_config() {
        let config = AnalyticsConfig { moving_average_window: 2, ..AnalyticsConfig::default() };
        let result = forecast(&[1.0, 2.0, 3.0, 4.0], ForecastMethod::MovingAverage, 1, &config);
        assert_eq!(result.predictions, vec![3.5]);
        assert_eq!("ema".parse::<ForecastMethod>(), Ok(ForecastMethod::ExponentialSmoothing));
        assert!("arima".parse::<ForecastMethod>().is_err());
    }

    #[test]
    fn test_seasonal_decomposition() {
        assert!(seasonal_decomposition(&[1.0, 2.0, 3.0], 2).is_none());
        assert!(seasonal_decomposition(&[1.0, 2.0], 0).is_none());

        // Alternating pattern on a flat level
        let s = [10.0, 20.0, 10.0, 20.0, 10.0, 20.0];
        let d = seasonal_decomposition(&s, 2).unwrap();
        assert_eq!(d.seasonal.len(), 2);
        assert_eq!(d.trend.len(), s.len());
        assert!(d.seasonal[0] < 0.0 && d.seasonal[1] > 0.0);
        for i in 0..s.len() {
            assert!(approx(d.detrended[i], s[i] - d.trend[i]));
            assert!(approx(d.residuals[i], d.detrended[i] - d.seasonal[i % 2]));
        }
    }
}
