//! Plugin Registry

use crate::{EvalContext, FunctionMeta, FunctionPlugin};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tally_core::{TallyError, Value};

/// Central function registry
pub struct PluginRegistry {
    functions: HashMap<String, Arc<dyn FunctionPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn with_function<F: FunctionPlugin + 'static>(mut self, f: F) -> Self {
        let name = f.meta().name.to_lowercase();
        self.functions.insert(name, Arc::new(f));
        self
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn get_function(&self, name: &str) -> Option<&dyn FunctionPlugin> {
        self.functions.get(&name.to_lowercase()).map(|f| f.as_ref())
    }

    pub fn call_function(&self, name: &str, args: &[Value], ctx: &EvalContext) -> Value {
        match self.get_function(name) {
            Some(f) => {
                let meta = f.meta();
                if args.len() < meta.required_args() {
                    return Value::Error(TallyError::arg_count(meta.name, meta.required_args(), args.len()));
                }
                tracing::trace!(function = name, args = args.len(), "calling function");
                f.call(args, ctx)
            }
            None => {
                tracing::debug!(function = name, "unknown function");
                let similar = self.find_similar_functions(name);
                let mut err = TallyError::undefined_func(name);
                if !similar.is_empty() {
                    let suggestions: Vec<&str> = similar.iter().take(5).map(|s| s.as_str()).collect();
                    err = err.with_suggestion(format!(
                        "Similar: {}. Use list_functions for the full list.",
                        suggestions.join(", ")
                    ));
                }
                Value::Error(err)
            }
        }
    }

    /// Find function names similar to the given name (for error suggestions)
    fn find_similar_functions(&self, name: &str) -> Vec<String> {
        let name_lower = name.to_lowercase();
        let mut matches: Vec<(String, usize)> = self
            .functions
            .keys()
            .filter_map(|func_name| {
                let score = Self::similarity_score(&name_lower, func_name);
                (score > 0).then(|| (func_name.clone(), score))
            })
            .collect();

        // Higher score first, then alphabetical for stable output
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.into_iter().map(|(name, _)| name).collect()
    }

    fn similarity_score(query: &str, candidate: &str) -> usize {
        let mut score = 0;

        if candidate.starts_with(query) {
            score += 100;
        } else if candidate.contains(query) {
            score += 50;
        } else if query.contains(candidate) {
            score += 30;
        }

        let query_chars: HashSet<char> = query.chars().collect();
        let candidate_chars: HashSet<char> = candidate.chars().collect();
        score += query_chars.intersection(&candidate_chars).count() * 2;

        let len_diff = query.len().abs_diff(candidate.len());
        if len_diff < 5 && score > 0 {
            score += 5 - len_diff;
        }

        score
    }

    pub fn help(&self, name: Option<&str>) -> Value {
        match name {
            Some(n) => self.help_for(n),
            None => self.general_help(),
        }
    }

    fn help_for(&self, name: &str) -> Value {
        match self.functions.get(&name.to_lowercase()) {
            Some(f) => Value::Object(Self::function_to_help(f.meta())),
            None => Value::Error(TallyError::not_found(name)),
        }
    }

    fn general_help(&self) -> Value {
        let mut funcs_by_cat: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, f) in &self.functions {
            funcs_by_cat.entry(f.meta().category.to_string()).or_default().push(name.clone());
        }

        let mut help = HashMap::new();
        help.insert(
            "functions".to_string(),
            Value::Object(
                funcs_by_cat
                    .into_iter()
                    .map(|(k, mut v)| {
                        v.sort();
                        (k, Value::List(v.into_iter().map(Value::Text).collect()))
                    })
                    .collect(),
            ),
        );
        help.insert(
            "usage".to_string(),
            Value::Text("Call help('function_name') for detailed help.".to_string()),
        );
        Value::Object(help)
    }

    fn function_to_help(meta: FunctionMeta) -> HashMap<String, Value> {
        let mut help = HashMap::new();
        help.insert("name".to_string(), Value::Text(meta.name.to_string()));
        help.insert("description".to_string(), Value::Text(meta.description.to_string()));
        help.insert("usage".to_string(), Value::Text(meta.usage.to_string()));
        help.insert("returns".to_string(), Value::Text(meta.returns.to_string()));
        help.insert("category".to_string(), Value::Text(meta.category.to_string()));
        help.insert(
            "args".to_string(),
            Value::List(
                meta.args
                    .iter()
                    .map(|a| {
                        let mut arg = HashMap::new();
                        arg.insert("name".to_string(), Value::Text(a.name.to_string()));
                        arg.insert("type".to_string(), Value::Text(a.typ.to_string()));
                        arg.insert("description".to_string(), Value::Text(a.description.to_string()));
                        arg.insert("optional".to_string(), Value::Bool(a.optional));
                        if let Some(default) = a.default {
                            arg.insert("default".to_string(), Value::Text(default.to_string()));
                        }
                        Value::Object(arg)
                    })
                    .collect(),
            ),
        );
        help.insert(
            "examples".to_string(),
            Value::List(meta.examples.iter().map(|e| Value::Text(e.to_string())).collect()),
        );
        help.insert(
            "related".to_string(),
            Value::List(meta.related.iter().map(|r| Value::Text(r.to_string())).collect()),
        );
        help
    }

    /// List functions sorted by name, optionally filtered by category
    pub fn list_functions(&self, category: Option<&str>) -> Value {
        let mut metas: Vec<FunctionMeta> = self
            .functions
            .values()
            .map(|f| f.meta())
            .filter(|m| category.map_or(true, |c| m.category == c))
            .collect();
        metas.sort_by_key(|m| m.name);

        let funcs = metas
            .into_iter()
            .map(|meta| {
                let mut obj = HashMap::new();
                obj.insert("name".to_string(), Value::Text(meta.name.to_string()));
                obj.insert("description".to_string(), Value::Text(meta.description.to_string()));
                obj.insert("usage".to_string(), Value::Text(meta.usage.to_string()));
                obj.insert("category".to_string(), Value::Text(meta.category.to_string()));
                Value::Object(obj)
            })
            .collect();
        Value::List(funcs)
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgMeta;

    struct Double;

    static DOUBLE_ARGS: [ArgMeta; 1] = [ArgMeta::required("x", "Number", "Value to double")];

    impl FunctionPlugin for Double {
        fn meta(&self) -> FunctionMeta {
            FunctionMeta {
                name: "double",
                description: "Multiply by two",
                usage: "double(x)",
                args: &DOUBLE_ARGS,
                returns: "Number",
                examples: &["double(2) → 4"],
                category: "test",
                related: &[],
            }
        }

        fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
            match args.first().and_then(Value::as_number) {
                Some(x) => Value::Number(x * 2.0),
                None => Value::Error(TallyError::arg_count("double", 1, args.len())),
            }
        }
    }

    fn registry() -> PluginRegistry {
        PluginRegistry::new().with_function(Double)
    }

    #[test]
    fn test_call_is_case_insensitive() {
        let ctx = EvalContext::default();
        let result = registry().call_function("DOUBLE", &[Value::Number(2.5)], &ctx);
        assert_eq!(result, Value::Number(5.0));
    }

    #[test]
    fn test_unknown_function_suggests_similar() {
        let ctx = EvalContext::default();
        match registry().call_function("doubel", &[], &ctx) {
            Value::Error(e) => {
                assert_eq!(e.code, "UNDEFINED_FUNC");
                assert!(e.suggestion.unwrap().contains("double"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_arg() {
        let ctx = EvalContext::default();
        match registry().call_function("double", &[], &ctx) {
            Value::Error(e) => {
                assert_eq!(e.code, "ARG_COUNT");
                assert!(e.message.contains("expects 1"));
            }
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_help_for_function() {
        let help = registry().help(Some("double"));
        assert_eq!(help.get("usage"), Value::Text("double(x)".to_string()));
        assert!(registry().help(Some("missing")).is_error());
    }

    #[test]
    fn test_list_functions_by_category() {
        let reg = registry();
        assert_eq!(reg.list_functions(Some("test")).as_list().map(|l| l.len()), Some(1));
        assert_eq!(reg.list_functions(Some("other")).as_list().map(|l| l.len()), Some(0));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_meta_serializes() {
        let meta = Double.meta();
        assert_eq!(meta.required_args(), 1);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["name"], "double");
        assert!(json["args"][0].get("default").is_none());
    }
}
