//! Registry adapters: one `FunctionPlugin` per engine operation.

mod helpers;

pub mod aggregate;
pub mod anomaly;
pub mod central;
pub mod correlation;
pub mod dispersion;
pub mod forecast;
pub mod position;
pub mod trend;
