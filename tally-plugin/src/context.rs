//! Evaluation Context

use tally_core::AnalyticsConfig;

/// Context passed to every plugin call
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    /// Defaults for optional arguments
    pub config: AnalyticsConfig,
}

impl EvalContext {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self
    }
}
