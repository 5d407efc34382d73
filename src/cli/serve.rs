//! MCP server startup.

use tracing::info;

use sandgrep::mcp;
use sandgrep::{Sandbox, SearchError, ToolContext};

use super::args::{GlobalArgs, ServeArgs};
use super::tool_config;

pub fn cmd_serve(global: &GlobalArgs, args: ServeArgs) -> Result<(), SearchError> {
    let sandbox = Sandbox::new(&global.root)?;
    if !sandbox.root().is_dir() {
        return Err(SearchError::NotADirectory(global.root.clone()));
    }

    let config = tool_config(&args.limits);
    info!(
        root = %sandbox.root().display(),
        python = %config.python,
        timeout_secs = config.run_timeout.as_secs(),
        max_read_chars = config.max_read_chars,
        "Starting MCP server"
    );

    let ctx = ToolContext::new(sandbox, config);
    mcp::server::run_server(&ctx);
    Ok(())
}
