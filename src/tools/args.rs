//! Argument aliasing and coercion for tool calls.
//!
//! Models rarely emit argument maps that match a schema exactly: `path` shows
//! up where `file_path` is expected, a single glob arrives as a bare string,
//! booleans come quoted. [`ALIAS_RULES`] lists every accepted key per
//! operation; adding a synonym is a one-line table edit.

use serde_json::{Map, Value};

use super::Operation;
use crate::SearchError;

/// How a value is normalized after aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Keep the value; type is checked when the operation reads it.
    Keep,
    /// Scalar becomes a one-element list; list items become strings.
    List,
    /// Like `List`, then every item lowercased.
    LowercaseList,
    Bool,
    /// Non-negative integer.
    Int,
}

/// One canonical parameter of an operation and the synonyms folded into it.
#[derive(Debug, Clone, Copy)]
pub struct AliasRule {
    pub operation: Operation,
    pub canonical: &'static str,
    pub synonyms: &'static [&'static str],
    pub coercion: Coercion,
}

const fn rule(
    operation: Operation,
    canonical: &'static str,
    synonyms: &'static [&'static str],
    coercion: Coercion,
) -> AliasRule {
    AliasRule { operation, canonical, synonyms, coercion }
}

/// Every parameter accepted by every operation. Keys outside this table are rejected.
pub const ALIAS_RULES: &[AliasRule] = &[
    rule(Operation::RunPythonFile, "file_path", &["filename", "path"], Coercion::Keep),
    rule(Operation::RunPythonFile, "args", &[], Coercion::List),
    rule(Operation::GetFileContent, "file_path", &["path"], Coercion::Keep),
    rule(Operation::WriteFile, "file_path", &["path"], Coercion::Keep),
    rule(Operation::WriteFile, "contents", &["content"], Coercion::Keep),
    rule(Operation::SearchCode, "root", &["directory", "dir", "root_directory"], Coercion::Keep),
    rule(Operation::SearchCode, "name_globs", &[], Coercion::List),
    rule(Operation::SearchCode, "extensions", &[], Coercion::LowercaseList),
    rule(Operation::SearchCode, "content_query", &["needle", "query"], Coercion::Keep),
    rule(Operation::SearchCode, "case_sensitive", &["case"], Coercion::Bool),
    rule(Operation::SearchCode, "use_regex", &["regex"], Coercion::Bool),
    rule(Operation::SearchCode, "context_lines", &["preview_lines"], Coercion::Int),
    rule(Operation::SearchCode, "max_results", &[], Coercion::Int),
    rule(Operation::SearchCode, "extra_ignores", &[], Coercion::List),
    rule(Operation::SearchCode, "verbose", &[], Coercion::Bool),
    rule(Operation::GetFilesInfo, "directory", &["dir", "path"], Coercion::Keep),
];

/// Injected by the dispatcher from the session; never taken from the caller.
const WORKING_DIRECTORY: &str = "working_directory";

/// Normalized arguments for one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArgs {
    operation: Operation,
    values: Map<String, Value>,
}

/// Fold synonyms into canonical keys, coerce values, and reject unknown keys.
///
/// `null` and a missing argument map are treated as empty. A canonical key
/// wins over its synonyms; synonyms are consumed either way.
pub fn normalize_args(operation: Operation, raw: &Value) -> Result<ToolArgs, SearchError> {
    let mut input = match raw {
        Value::Object(map) => map.clone(),
        Value::Null => Map::new(),
        other => {
            return Err(SearchError::InvalidArgs(format!(
                "Invalid args type for {}; expected an object, got {}",
                operation.name(),
                json_type(other)
            )));
        }
    };
    input.remove(WORKING_DIRECTORY);
    input.retain(|_, v| !v.is_null());

    let mut values = Map::new();
    for rule in ALIAS_RULES.iter().filter(|r| r.operation == operation) {
        let mut value = input.remove(rule.canonical);
        for synonym in rule.synonyms {
            let aliased = input.remove(*synonym);
            if value.is_none() {
                value = aliased;
            }
        }
        if let Some(value) = value {
            values.insert(rule.canonical.to_string(), coerce(rule, value)?);
        }
    }

    if let Some(unknown) = input.keys().next() {
        return Err(SearchError::InvalidArgs(format!(
            "Unexpected argument '{}' for {}",
            unknown,
            operation.name()
        )));
    }

    Ok(ToolArgs { operation, values })
}

fn coerce(rule: &AliasRule, value: Value) -> Result<Value, SearchError> {
    let wrong = |expected: &str, got: &Value| {
        SearchError::InvalidArgs(format!(
            "Argument '{}' for {} must be {}, got {}",
            rule.canonical,
            rule.operation.name(),
            expected,
            json_type(got)
        ))
    };

    match rule.coercion {
        Coercion::Keep => Ok(value),
        Coercion::List | Coercion::LowercaseList => {
            let items = match value {
                Value::Array(items) => items,
                scalar => vec![scalar],
            };
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let text = match item {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => return Err(wrong("a string or list of strings", &other)),
                };
                out.push(Value::String(if rule.coercion == Coercion::LowercaseList {
                    text.to_lowercase()
                } else {
                    text
                }));
            }
            Ok(Value::Array(out))
        }
        Coercion::Bool => match &value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Number(n) => Ok(Value::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" | "" => Ok(Value::Bool(false)),
                _ => Err(wrong("a boolean", &value)),
            },
            _ => Err(wrong("a boolean", &value)),
        },
        Coercion::Int => {
            let parsed = match &value {
                Value::Number(n) => n.as_u64().or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                        .map(|f| f as u64)
                }),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| wrong("a non-negative integer", &value))
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ToolArgs {
    /// Canonical view of the arguments, as passed to the operation.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    fn type_error(&self, key: &str, expected: &str, got: &Value) -> SearchError {
        SearchError::InvalidArgs(format!(
            "Argument '{}' for {} must be {}, got {}",
            key,
            self.operation.name(),
            expected,
            json_type(got)
        ))
    }

    fn missing(&self, key: &str) -> SearchError {
        SearchError::InvalidArgs(format!(
            "Missing required argument '{}' for {}",
            key,
            self.operation.name()
        ))
    }

    pub fn str(&self, key: &str) -> Result<Option<&str>, SearchError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.type_error(key, "a string", other)),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<&str, SearchError> {
        self.str(key)?.ok_or_else(|| self.missing(key))
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, SearchError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.type_error(key, "a boolean", other)),
        }
    }

    pub fn usize(&self, key: &str) -> Result<Option<usize>, SearchError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.type_error(key, "a non-negative integer", v)),
        }
    }

    pub fn strings(&self, key: &str) -> Result<Option<Vec<String>>, SearchError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.type_error(key, "a list of strings", other)),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.type_error(key, "a list of strings", other)),
        }
    }

    /// Replace a string argument (used after path resolution).
    pub fn set_str(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), Value::String(value));
    }
}
