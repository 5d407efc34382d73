//! Tool dispatch: the boundary between loosely-shaped tool calls and the
//! sandboxed operations.
//!
//! [`ToolContext::dispatch`] canonicalizes the operation name, folds argument
//! aliases, resolves bare file names, runs the operation, and converts every
//! outcome (including panics) into a [`ToolResponse`].

pub mod args;
pub mod fallback;
pub mod files;
pub mod run;

use std::panic::{self, AssertUnwindSafe};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::mcp::protocol::ToolDefinition;
use crate::resolver::resolve_path;
use crate::{search, Sandbox, ScoreWeights, SearchError, SearchRequest, SearchResult};

use args::{normalize_args, ToolArgs};

/// Decorations some clients put in front of function names.
const NAME_PREFIXES: &[&str] = &["schema_", "functions.", "default_api."];

/// Name reported when a call arrives without one.
pub const MISSING_NAME: &str = "(missing)";

/// Operations the dispatcher knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFilesInfo,
    GetFileContent,
    WriteFile,
    RunPythonFile,
    SearchCode,
}

impl Operation {
    pub const ALL: &'static [Operation] = &[
        Operation::GetFilesInfo,
        Operation::GetFileContent,
        Operation::WriteFile,
        Operation::RunPythonFile,
        Operation::SearchCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::GetFilesInfo => "get_files_info",
            Operation::GetFileContent => "get_file_content",
            Operation::WriteFile => "write_file",
            Operation::RunPythonFile => "run_python_file",
            Operation::SearchCode => "search_code",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Operations whose `file_path` goes through basename disambiguation.
    pub fn takes_file_path(self) -> bool {
        matches!(
            self,
            Operation::GetFileContent | Operation::WriteFile | Operation::RunPythonFile
        )
    }
}

/// Strip any known prefix decoration: `schema_search_code` -> `search_code`.
pub fn canonical_name(raw: &str) -> &str {
    let mut name = raw.trim();
    while let Some(stripped) = NAME_PREFIXES.iter().find_map(|p| name.strip_prefix(p)) {
        name = stripped;
    }
    name
}

/// A single tool invocation as received from a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Outcome of a dispatched call. Failures are data, never panics.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResponse {
    Success {
        name: String,
        result: Value,
    },
    Failure {
        name: String,
        kind: String,
        message: String,
    },
}

impl ToolResponse {
    fn failure(name: &str, err: &SearchError) -> Self {
        ToolResponse::Failure {
            name: name.to_string(),
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ToolResponse::Success { name, .. } | ToolResponse::Failure { name, .. } => name,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResponse::Failure { .. })
    }

    /// `{"name", "result"}` on success, `{"name", "error", "kind"}` on failure.
    pub fn to_payload(&self) -> Value {
        match self {
            ToolResponse::Success { name, result } => json!({ "name": name, "result": result }),
            ToolResponse::Failure { name, kind, message } => {
                json!({ "name": name, "error": message, "kind": kind })
            }
        }
    }
}

/// Runtime limits for tool operations.
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// `get_file_content` truncates after this many characters.
    pub max_read_chars: usize,
    pub run_timeout: Duration,
    /// Interpreter used by `run_python_file`.
    pub python: String,
    pub weights: ScoreWeights,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            max_read_chars: 10_000,
            run_timeout: Duration::from_secs(30),
            python: "python3".to_string(),
            weights: ScoreWeights::default(),
        }
    }
}

/// One agent session: the sandbox, limits, and the paths of the last search.
pub struct ToolContext {
    pub sandbox: Sandbox,
    pub config: ToolConfig,
    last_results: RwLock<Vec<String>>,
}

impl ToolContext {
    pub fn new(sandbox: Sandbox, config: ToolConfig) -> Self {
        Self {
            sandbox,
            config,
            last_results: RwLock::new(Vec::new()),
        }
    }

    /// Paths returned by the most recent successful `search_code`.
    pub fn last_results(&self) -> Result<Vec<String>, SearchError> {
        self.last_results
            .read()
            .map(|paths| paths.clone())
            .map_err(|e| SearchError::LockPoisoned(e.to_string()))
    }

    fn remember(&self, results: &[SearchResult]) -> Result<(), SearchError> {
        let mut cached = self
            .last_results
            .write()
            .map_err(|e| SearchError::LockPoisoned(e.to_string()))?;
        *cached = results.iter().map(|r| r.relative_path.clone()).collect();
        Ok(())
    }

    /// Dispatch one call. Never panics; every failure becomes [`ToolResponse::Failure`].
    pub fn dispatch(&self, call: &ToolCall) -> ToolResponse {
        let name = call.name.trim();
        if name.is_empty() {
            return ToolResponse::failure(
                MISSING_NAME,
                &SearchError::InvalidArgs("Invalid function call: missing name".to_string()),
            );
        }

        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.invoke(name, &call.args)));
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Ok(Ok(result)) => {
                info!(tool = name, elapsed_ms = format_args!("{:.1}", elapsed_ms), "Tool call complete");
                ToolResponse::Success {
                    name: name.to_string(),
                    result,
                }
            }
            Ok(Err(e)) => {
                warn!(tool = name, kind = e.kind(), error = %e, "Tool call failed");
                ToolResponse::failure(name, &e)
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(tool = name, error = %message, "Tool call panicked");
                ToolResponse::Failure {
                    name: name.to_string(),
                    kind: "internal".to_string(),
                    message: format!("Unhandled error in {}: {}", canonical_name(name), message),
                }
            }
        }
    }

    fn invoke(&self, raw_name: &str, raw_args: &Value) -> Result<Value, SearchError> {
        let op = Operation::from_name(canonical_name(raw_name))
            .ok_or_else(|| SearchError::UnknownOperation(raw_name.to_string()))?;
        let mut args = normalize_args(op, raw_args)?;

        if op.takes_file_path() {
            if let Some(candidate) = args.str("file_path")?.map(str::to_string) {
                let cached = self.last_results()?;
                let resolved = resolve_path(&self.sandbox, &candidate, &cached);
                args.set_str("file_path", resolved);
            }
        }
        debug!(tool = op.name(), args = %serde_json::Value::Object(args.as_map().clone()), "Invoking");

        match op {
            Operation::GetFilesInfo => {
                let directory = args.str("directory")?.unwrap_or(".");
                Ok(json!(files::list_directory(&self.sandbox, directory)?))
            }
            Operation::GetFileContent => {
                let path = args.required_str("file_path")?;
                let text = files::read_file(&self.sandbox, path, self.config.max_read_chars)?;
                Ok(Value::String(text))
            }
            Operation::WriteFile => {
                let path = args.required_str("file_path")?;
                let contents = args.required_str("contents")?;
                Ok(Value::String(files::write_file(&self.sandbox, path, contents)?))
            }
            Operation::RunPythonFile => {
                let path = args.required_str("file_path")?;
                let script_args = args.strings("args")?.unwrap_or_default();
                let output = run::run_python_file(
                    &self.sandbox,
                    path,
                    &script_args,
                    &self.config.python,
                    self.config.run_timeout,
                )?;
                Ok(Value::String(output))
            }
            Operation::SearchCode => {
                let request = search_request(&args)?;
                let results = search(&self.sandbox, &request, &self.config.weights)?;
                if args.bool("verbose")?.unwrap_or(false) {
                    for hit in &results {
                        info!(path = %hit.relative_path, score = hit.score, matches = hit.matches.len(), "Search hit");
                    }
                }
                self.remember(&results)?;
                Ok(json!(results))
            }
        }
    }
}

/// Build a [`SearchRequest`] from normalized `search_code` arguments.
pub fn search_request(args: &ToolArgs) -> Result<SearchRequest, SearchError> {
    let mut request = SearchRequest::default();
    if let Some(root) = args.str("root")? {
        request.root = root.to_string();
    }
    if let Some(globs) = args.strings("name_globs")? {
        request.name_globs = globs;
    }
    if let Some(extensions) = args.strings("extensions")? {
        request.extensions = extensions;
    }
    request.content_query = args.str("content_query")?.map(str::to_string);
    if let Some(v) = args.bool("use_regex")? {
        request.use_regex = v;
    }
    if let Some(v) = args.bool("case_sensitive")? {
        request.case_sensitive = v;
    }
    if let Some(v) = args.usize("max_results")? {
        request.max_results = v;
    }
    if let Some(v) = args.usize("context_lines")? {
        request.context_lines = v;
    }
    if let Some(ignores) = args.strings("extra_ignores")? {
        request.extra_ignores = ignores;
    }
    Ok(request)
}

/// Tool schemas advertised over MCP `tools/list` and by `sandgrep tools`.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: Operation::SearchCode.name().to_string(),
            description: "Search files under the working directory by name glob, extension, and content. Results are ranked: content matches outrank extension matches, which outrank name matches. Each match carries its line number and a preview of surrounding lines. Directories such as .git, node_modules, and build are skipped.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "root": { "type": "string", "description": "Directory to search, relative to the working directory (default: '.')" },
                    "name_globs": { "type": "array", "items": { "type": "string" }, "description": "File name patterns, e.g. ['*render*.py']. Matched case-insensitively against the file name only." },
                    "extensions": { "type": "array", "items": { "type": "string" }, "description": "Extensions to include, e.g. ['.py']" },
                    "content_query": { "type": "string", "description": "Text (or regex with use_regex=true) to find inside files" },
                    "use_regex": { "type": "boolean", "description": "Treat content_query as a regular expression (default: false)" },
                    "case_sensitive": { "type": "boolean", "description": "Case-sensitive content matching (default: false)" },
                    "max_results": { "type": "integer", "description": "Maximum files returned (default: 50)" },
                    "context_lines": { "type": "integer", "description": "Lines of context before and after each match (default: 2)" },
                    "extra_ignores": { "type": "array", "items": { "type": "string" }, "description": "Additional directory names to skip" },
                    "verbose": { "type": "boolean", "description": "Log a one-line summary per result (default: false)" }
                }
            }),
        },
        ToolDefinition {
            name: Operation::GetFilesInfo.name().to_string(),
            description: "List files in a directory with their sizes, constrained to the working directory.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "directory": { "type": "string", "description": "Directory to list, relative to the working directory. Use '.' for the project root." }
                }
            }),
        },
        ToolDefinition {
            name: Operation::GetFileContent.name().to_string(),
            description: "Read a file and return its content (truncated for very long files). May not be a directory.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "File to read, relative to the working directory. A bare file name is resolved against the last search results." }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: Operation::WriteFile.name().to_string(),
            description: "Write or overwrite a file relative to the working directory. Parent directories are created.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "File to write, relative to the working directory" },
                    "contents": { "type": "string", "description": "The text content to write" }
                },
                "required": ["file_path", "contents"]
            }),
        },
        ToolDefinition {
            name: Operation::RunPythonFile.name().to_string(),
            description: "Run a Python file from the working directory and return its output. Only .py files are accepted.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Python file to run, relative to the working directory. Must end in .py." },
                    "args": { "type": "array", "items": { "type": "string" }, "description": "Optional arguments passed to the script" }
                },
                "required": ["file_path"]
            }),
        },
    ]
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
