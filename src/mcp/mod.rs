//! MCP (Model Context Protocol) server: JSON-RPC 2.0 over stdio.

pub mod protocol;
pub mod server;
