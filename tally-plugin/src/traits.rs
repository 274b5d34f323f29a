//! Plugin traits

use crate::EvalContext;
use serde::Serialize;
use tally_core::Value;

/// Metadata about a function argument
#[derive(Debug, Clone, Serialize)]
pub struct ArgMeta {
    pub name: &'static str,
    pub typ: &'static str,
    pub description: &'static str,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

impl ArgMeta {
    pub const fn required(name: &'static str, typ: &'static str, description: &'static str) -> Self {
        Self { name, typ, description, optional: false, default: None }
    }

    pub const fn optional(name: &'static str, typ: &'static str, description: &'static str, default: &'static str) -> Self {
        Self { name, typ, description, optional: true, default: Some(default) }
    }
}

/// Metadata for a function plugin
#[derive(Debug, Clone, Serialize)]
pub struct FunctionMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub args: &'static [ArgMeta],
    pub returns: &'static str,
    pub examples: &'static [&'static str],
    pub category: &'static str,
    pub related: &'static [&'static str],
}

impl FunctionMeta {
    /// Number of arguments a caller must pass
    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| !a.optional).count()
    }
}

/// Pure function plugin
pub trait FunctionPlugin: Send + Sync {
    fn meta(&self) -> FunctionMeta;
    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value;
}
