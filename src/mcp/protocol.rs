//! JSON-RPC 2.0 envelopes and the subset of MCP payloads the server emits.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2025-03-26";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Workflow hints sent in `initialize` for things single tool schemas cannot say.
pub const INSTRUCTIONS: &str = concat!(
    "sandgrep MCP server: sandboxed code search and file tools\n",
    "\n",
    "1. NARROW FIRST: call search_code with an extensions filter (e.g. ['.py']) and a tight content_query. ",
    "Widen the root or relax the query only when nothing is found.\n",
    "\n",
    "2. RANKING: content matches outrank extension matches, which outrank file-name matches. ",
    "Prefer the top result whose preview shows the definition you need.\n",
    "\n",
    "3. BARE FILE NAMES: get_file_content, write_file and run_python_file accept a bare name such as 'util.py'. ",
    "It is resolved against the paths returned by the last search_code call, then by a unique match on disk. ",
    "Ambiguous names are not guessed; pass the full relative path instead.\n",
    "\n",
    "4. SANDBOX: every path is relative to the server root. Paths that escape it fail with kind 'outside_sandbox'.\n",
    "\n",
    "5. ERRORS: failed calls return {name, error, kind} with isError=true. Fix the arguments and retry.\n",
);

// ─── JSON-RPC ───────────────────────────────────────────────────────

/// Incoming request. A missing `id` marks a notification.
#[derive(Deserialize, Debug)]
pub struct JsonRpcRequest {
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Serialize, Debug)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Value,
}

#[derive(Serialize, Debug)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub error: JsonRpcError,
}

#[derive(Serialize, Debug)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn new(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result }
    }
}

impl JsonRpcErrorResponse {
    pub fn new(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error: JsonRpcError { code, message },
        }
    }
}

// ─── MCP payloads ───────────────────────────────────────────────────

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: &'static str,
    pub capabilities: Value,
    pub server_info: ServerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'static str>,
}

#[derive(Serialize, Debug)]
pub struct ServerInfo {
    pub name: &'static str,
    pub version: &'static str,
}

impl InitializeResult {
    /// Tools only, with a fixed list; server name and version come from the package.
    pub fn new(instructions: Option<&'static str>) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            capabilities: serde_json::json!({ "tools": { "listChanged": false } }),
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            },
            instructions,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Serialize, Debug)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

/// `tools/call` result: one text block carrying the JSON payload.
#[derive(Serialize, Debug)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Serialize, Debug)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

impl ToolCallResult {
    pub fn text(text: String, is_error: bool) -> Self {
        Self {
            content: vec![ToolContent { content_type: "text", text }],
            is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_and_notification() {
        let req: JsonRpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"search_code","arguments":{"extensions":[".py"]}}}"#,
        )
        .unwrap();
        assert_eq!(req.id, Some(json!(3)));
        assert_eq!(req.method, "tools/call");
        assert_eq!(req.params.unwrap()["arguments"]["extensions"][0], ".py");

        let note: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(note.id.is_none());
        assert!(note.params.is_none());
    }

    #[test]
    fn test_initialize_result_shape() {
        let json = serde_json::to_value(InitializeResult::new(Some(INSTRUCTIONS))).unwrap();
        assert_eq!(json["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(json["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(json["serverInfo"]["name"], "sandgrep");
        assert_eq!(json["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));

        let bare = serde_json::to_value(InitializeResult::new(None)).unwrap();
        assert!(bare.get("instructions").is_none());
    }

    #[test]
    fn test_instructions_cover_file_tools_and_sandbox() {
        for tool in ["search_code", "get_file_content", "write_file", "run_python_file"] {
            assert!(INSTRUCTIONS.contains(tool), "instructions should mention {}", tool);
        }
        assert!(INSTRUCTIONS.contains("outside_sandbox"));
    }

    #[test]
    fn test_envelopes() {
        let ok = serde_json::to_value(JsonRpcResponse::new(json!(1), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = serde_json::to_value(JsonRpcErrorResponse::new(
            json!(5),
            METHOD_NOT_FOUND,
            "Method not found".to_string(),
        ))
        .unwrap();
        assert_eq!(err["error"]["code"], -32601);
        assert_eq!(err["error"]["message"], "Method not found");
    }

    #[test]
    fn test_tool_call_result_flags_errors_only() {
        let ok = serde_json::to_value(ToolCallResult::text("[]".to_string(), false)).unwrap();
        assert_eq!(ok["content"][0]["type"], "text");
        assert!(ok.get("isError").is_none());

        let failed = serde_json::to_value(ToolCallResult::text("{}".to_string(), true)).unwrap();
        assert_eq!(failed["isError"], true);
    }
}
