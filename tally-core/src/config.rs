//! Analytics configuration
//!
//! Defaults for the optional parameters of the analytics functions. Every
//! field has a default, so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};
use thiserror::Error;

/// Errors raised while loading or validating an [`AnalyticsConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid {field}: must be in the range {range}, but is {value}")]
    OutOfRange {
        field: &'static str,
        range: String,
        value: String,
    },
}

/// Default parameters for the analytics functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Smoothing factor for exponential moving averages, in (0, 1].
    pub ema_alpha: f64,
    /// Absolute slope below which a trend counts as stable.
    pub stable_slope_threshold: f64,
    /// |z| above which a point is anomalous.
    pub zscore_threshold: f64,
    /// Tukey fence multiplier.
    pub iqr_multiplier: f64,
    /// Look-back window of the moving-average anomaly detector.
    pub anomaly_window: usize,
    /// Error multiple above which the moving-average detector flags a point.
    pub anomaly_threshold: f64,
    /// Window for moving-average smoothing and forecasts.
    pub moving_average_window: usize,
    /// Number of periods to forecast when the caller does not say.
    pub forecast_periods: usize,
    /// Largest forecast horizon a caller may request.
    pub max_forecast_periods: usize,
    /// Season length for decomposition (12 = monthly data, yearly season).
    pub seasonal_period: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            ema_alpha: 0.3,
            stable_slope_threshold: 0.01,
            zscore_threshold: 2.0,
            iqr_multiplier: 1.5,
            anomaly_window: 10,
            anomaly_threshold: 2.0,
            moving_average_window: 3,
            forecast_periods: 3,
            max_forecast_periods: 10_000,
            seasonal_period: 12,
        }
    }
}

impl AnalyticsConfig {
    /// Load an [`AnalyticsConfig`] from a JSON file.
    ///
    /// Missing fields take their defaults. The result is validated before it
    /// is returned.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized, or if a
    /// value is out of range.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: AnalyticsConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_num("ema_alpha", self.ema_alpha, f64::MIN_POSITIVE..=1.0)?;
        check_num("stable_slope_threshold", self.stable_slope_threshold, 0.0..f64::INFINITY)?;
        check_num("zscore_threshold", self.zscore_threshold, 0.0..f64::INFINITY)?;
        check_num("iqr_multiplier", self.iqr_multiplier, 0.0..f64::INFINITY)?;
        check_num("anomaly_window", self.anomaly_window, 1..10_000)?;
        check_num("anomaly_threshold", self.anomaly_threshold, 0.0..f64::INFINITY)?;
        check_num("moving_average_window", self.moving_average_window, 1..10_000)?;
        check_num("max_forecast_periods", self.max_forecast_periods, 1..=1_000_000)?;
        check_num("forecast_periods", self.forecast_periods, 0..=self.max_forecast_periods)?;
        check_num("seasonal_period", self.seasonal_period, 1..10_000)?;
        Ok(())
    }
}

fn check_num<T, R>(field: &'static str, num: T, range: R) -> Result<(), ConfigError>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        return Err(ConfigError::OutOfRange {
            field,
            range: format!("{range:?}"),
            value: format!("{num:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ema_alpha, 0.3);
        assert_eq!(config.stable_slope_threshold, 0.01);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AnalyticsConfig::from_json(r#"{"zscore_threshold": 3.0}"#).unwrap();
        assert_eq!(config.zscore_threshold, 3.0);
        assert_eq!(config.anomaly_window, 10);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let err = AnalyticsConfig::from_json(r#"{"ema_alpha": 1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "ema_alpha", .. }));

        let err = AnalyticsConfig::from_json(r#"{"anomaly_window": 0}"#).unwrap_err();
        assert!(err.to_string().contains("anomaly_window"));
    }

    #[test]
    fn test_forecast_periods_within_max() {
        let err = AnalyticsConfig::from_json(r#"{"max_forecast_periods": 5, "forecast_periods": 6}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "forecast_periods", .. }));

        let err = AnalyticsConfig::from_json(r#"{"max_forecast_periods": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "max_forecast_periods", .. }));
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = AnalyticsConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AnalyticsConfig::from_file("/nonexistent/tally.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
