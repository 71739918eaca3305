use crate::error::{FilterError, Result};
use connectors::document::DocumentQuery;
use lazy_static::lazy_static;
use model::core::value::Value;
use std::collections::HashMap;
use tracing::warn;

/// Lowers a named function applied to a resolved field path.
pub type FunctionHandler = fn(&str, &[Value]) -> Result<DocumentQuery>;

lazy_static! {
    static ref BUILTIN: FunctionRegistry = FunctionRegistry::with_builtins();
}

/// Registry of named filter functions, keyed by lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionHandler>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// The shared registry of built-in pattern functions.
    pub fn builtin() -> &'static FunctionRegistry {
        &BUILTIN
    }

    /// A fresh registry holding the built-ins, for hosts that add their own.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("like", like);
        registry.register("startswith", starts_with);
        registry.register("contains", contains);
        registry.register("endswith", ends_with);
        registry
    }

    pub fn register(&mut self, name: &str, handler: FunctionHandler) {
        self.functions.insert(name.to_lowercase(), handler);
    }

    pub fn get(&self, name: &str) -> Option<FunctionHandler> {
        self.functions.get(&name.to_lowercase()).copied()
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }

    pub fn function_names(&self) -> Vec<&str> {
        let mut names = self.functions.keys().map(|s| s.as_str()).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Lowers `name` applied to `field`. Unknown names are logged and
    /// rejected with `UnsupportedFunction`.
    pub fn call(&self, name: &str, field: &str, args: &[Value]) -> Result<DocumentQuery> {
        let Some(handler) = self.get(name) else {
            warn!(function = %name, "Rejecting unsupported filter function");
            return Err(FilterError::UnsupportedFunction(name.to_string()));
        };
        handler(field, args)
    }
}

fn single_arg<'a>(function: &str, args: &'a [Value]) -> Result<&'a Value> {
    match args {
        [arg] => Ok(arg),
        _ => Err(FilterError::invalid_usage(
            function,
            format!("Expected 1 argument, got {}", args.len()),
        )),
    }
}

fn string_arg<'a>(function: &str, args: &'a [Value]) -> Result<&'a str> {
    let arg = single_arg(function, args)?;
    arg.as_str().ok_or_else(|| {
        FilterError::invalid_usage(function, format!("Expected string, got {}", arg.type_name()))
    })
}

/// Raw pattern match. A string is used verbatim as the pattern; a
/// [`Pattern`](model::core::value::Pattern) keeps its options.
pub fn like(field: &str, args: &[Value]) -> Result<DocumentQuery> {
    match single_arg("like", args)? {
        Value::String(pattern) => Ok(DocumentQuery::matches(field, pattern.as_str(), "")),
        Value::Pattern(p) => Ok(DocumentQuery::matches(
            field,
            p.pattern.as_str(),
            p.options.as_str(),
        )),
        other => Err(FilterError::invalid_usage(
            "like",
            format!("Expected string or pattern, got {}", other.type_name()),
        )),
    }
}

// The literal is interpolated unescaped in the three helpers below, so
// pattern metacharacters in caller input keep their regex meaning.

pub fn starts_with(field: &str, args: &[Value]) -> Result<DocumentQuery> {
    let literal = string_arg("startswith", args)?;
    Ok(DocumentQuery::matches(field, format!("^{literal}.*"), ""))
}

pub fn contains(field: &str, args: &[Value]) -> Result<DocumentQuery> {
    let literal = string_arg("contains", args)?;
    Ok(DocumentQuery::matches(field, format!("^.*{literal}.*$"), ""))
}

pub fn ends_with(field: &str, args: &[Value]) -> Result<DocumentQuery> {
    let literal = string_arg("endswith", args)?;
    Ok(DocumentQuery::matches(field, format!(".*{literal}$"), ""))
}
