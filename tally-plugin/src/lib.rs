//! Tally Plugin System
//!
//! Named, self-describing functions over `Value`s. The analytics crate
//! registers one plugin per operation; the tool server looks them up by name.

mod context;
mod registry;
mod traits;

pub use context::EvalContext;
pub use registry::PluginRegistry;
pub use traits::{ArgMeta, FunctionMeta, FunctionPlugin};

/// Re-export core types for plugin authors
pub mod prelude {
    pub use crate::{ArgMeta, EvalContext, FunctionMeta, FunctionPlugin, PluginRegistry};
    pub use tally_core::prelude::*;
}
