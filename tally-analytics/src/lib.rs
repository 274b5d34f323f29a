//! Tally Analytics
//!
//! Descriptive statistics, linear trend, forecasting, correlation, anomaly
//! detection and record aggregation over numeric series.
//!
//! The engine modules are plain functions over `&[f64]` and records. They are
//! stateless and never panic on empty or degenerate input. The `functions`
//! module wraps each operation as a registry plugin that takes and returns
//! [`Value`](tally_core::Value)s.

pub mod aggregation;
pub mod anomaly;
pub mod correlation;
mod error;
pub mod forecast;
pub mod functions;
pub mod statistics;
pub mod trend;

pub use aggregation::{AggregateBucket, TimeInterval};
pub use anomaly::AnomalyFlag;
pub use error::{AnalyticsError, Result};
pub use forecast::{ForecastMethod, ForecastResult, SeasonalDecomposition};
pub use statistics::{Quartiles, Range, Summary};
pub use trend::{TrendDirection, TrendResult};

use functions::{aggregate, anomaly as anomaly_fns, central, correlation as correlation_fns};
use functions::{dispersion, forecast as forecast_fns, position, trend as trend_fns};
use tally_plugin::PluginRegistry;

/// Load analytics functions into registry
pub fn load_analytics_library(registry: PluginRegistry) -> PluginRegistry {
    registry
        // Central tendency
        .with_function(central::Mean)
        .with_function(central::Median)
        .with_function(central::Mode)
        .with_function(central::Sum)

        // Dispersion
        .with_function(dispersion::Variance)
        .with_function(dispersion::Stddev)
        .with_function(dispersion::Range)
        .with_function(dispersion::Summary)

        // Position
        .with_function(position::Percentile)
        .with_function(position::Quartiles)

        // Trend
        .with_function(trend_fns::LinearTrend)
        .with_function(trend_fns::MovingAverage)
        .with_function(trend_fns::Ema)
        .with_function(trend_fns::TrendDirection)

        // Forecast
        .with_function(forecast_fns::LinearForecast)
        .with_function(forecast_fns::MovingAverageForecast)
        .with_function(forecast_fns::ExponentialSmoothingForecast)
        .with_function(forecast_fns::Forecast)
        .with_function(forecast_fns::SeasonalDecomposition)

        // Correlation
        .with_function(correlation_fns::Pearson)
        .with_function(correlation_fns::Spearman)
        .with_function(correlation_fns::Rank)

        // Anomaly detection
        .with_function(anomaly_fns::ZScore)
        .with_function(anomaly_fns::Iqr)
        .with_function(anomaly_fns::MovingAverageAnomaly)

        // Aggregation
        .with_function(aggregate::GroupByTime)
        .with_function(aggregate::GroupByCategory)
}
