use std::io::{self, BufRead, Write};

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::tools::{tool_definitions, ToolCall, ToolContext, ToolResponse};

/// Run the MCP server event loop over stdio until stdin closes.
pub fn run_server(ctx: &ToolContext) {
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve(ctx, stdin.lock(), stdout.lock());
}

/// Line-delimited JSON-RPC loop over arbitrary streams.
pub fn serve<R: BufRead, W: Write>(ctx: &ToolContext, reader: R, mut writer: W) {
    info!(root = %ctx.sandbox.root().display(), "MCP server ready, waiting for JSON-RPC requests on stdin");

    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, "Error reading stdin");
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!(request = %line, "Incoming JSON-RPC");

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => {
                // Notifications have no id and get no response
                let Some(id) = request.id else {
                    debug!(method = %request.method, "Received notification");
                    continue;
                };
                handle_request(ctx, &request.method, &request.params, id)
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON-RPC request");
                json!(JsonRpcErrorResponse::new(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        };

        let resp_str = response.to_string();
        debug!(response = %resp_str, "Outgoing JSON-RPC");
        if writeln!(writer, "{}", resp_str).and_then(|_| writer.flush()).is_err() {
            error!("stdout closed, shutting down");
            return;
        }
    }

    info!("stdin closed, shutting down");
}

fn tool_call_result(response: &ToolResponse) -> ToolCallResult {
    ToolCallResult::text(response.to_payload().to_string(), response.is_error())
}

fn handle_request(ctx: &ToolContext, method: &str, params: &Option<Value>, id: Value) -> Value {
    match method {
        "initialize" => json!(JsonRpcResponse::new(id, json!(InitializeResult::new(Some(INSTRUCTIONS))))),
        "tools/list" => {
            let result = ToolsListResult {
                tools: tool_definitions(),
            };
            json!(JsonRpcResponse::new(id, json!(result)))
        }
        "tools/call" => {
            let Some(params) = params else {
                let result = ToolCallResult::text("Missing params".to_string(), true);
                return json!(JsonRpcResponse::new(id, json!(result)));
            };

            let tool_name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let arguments = params
                .get("arguments")
                .cloned()
                .unwrap_or(Value::Object(serde_json::Map::new()));

            let response = ctx.dispatch(&ToolCall::new(tool_name, arguments));
            json!(JsonRpcResponse::new(id, json!(tool_call_result(&response))))
        }
        "ping" => json!(JsonRpcResponse::new(id, json!({}))),
        _ => json!(JsonRpcErrorResponse::new(
            id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )),
    }
}
