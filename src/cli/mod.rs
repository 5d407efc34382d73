//! CLI layer: argument parsing, command dispatch, and subcommand implementations.

pub mod args;
mod serve;

pub use args::*;

use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sandgrep::tools::fallback::{self, Route};
use sandgrep::tools::{tool_definitions, ToolCall, ToolConfig, ToolContext, ToolResponse};
use sandgrep::{search, Sandbox, ScoreWeights, SearchError, SearchRequest, SearchResult};

// ─── CLI ─────────────────────────────────────────────────────────────

/// Sandboxed ranked code search and tool-call dispatch for coding agents
#[derive(Parser, Debug)]
#[command(name = "sandgrep", version, about, after_help = "\
Run 'sandgrep <COMMAND> --help' for detailed options and examples.\n\
Common options: --root <DIR> (sandbox root), --log-level <LEVEL>")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Search files by name glob, extension, and content; results are ranked
    Search(SearchArgs),

    /// Dispatch one tool call (as a model would) and print the JSON payload
    Call(CallArgs),

    /// Route free text to a tool call using the fallback rules
    Route(RouteArgs),

    /// Print the tool schemas as JSON
    Tools,

    /// Start MCP (Model Context Protocol) server over stdio.
    Serve(ServeArgs),
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Serve(_)) { "info" } else { "warn" };
    init_logging(&cli.global, default_level);

    let result = match cli.command {
        Commands::Search(args) => cmd_search(&cli.global, args),
        Commands::Call(args) => cmd_call(&cli.global, args),
        Commands::Route(args) => cmd_route(&cli.global, args),
        Commands::Tools => {
            println!("{:#}", serde_json::json!(tool_definitions()));
            Ok(())
        }
        Commands::Serve(args) => serve::cmd_serve(&cli.global, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries results and JSON-RPC.
fn init_logging(global: &GlobalArgs, default_level: &str) {
    let level = global.log_level.as_deref().unwrap_or(default_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match global.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

pub(crate) fn tool_config(limits: &LimitArgs) -> ToolConfig {
    ToolConfig {
        max_read_chars: limits.max_read_chars,
        run_timeout: Duration::from_secs(limits.timeout_secs),
        python: limits.python.clone(),
        weights: ScoreWeights::default(),
    }
}

fn tool_context(global: &GlobalArgs, limits: &LimitArgs) -> Result<ToolContext, SearchError> {
    Ok(ToolContext::new(Sandbox::new(&global.root)?, tool_config(limits)))
}

// ─── search ─────────────────────────────────────────────────────────

impl SearchArgs {
    pub(crate) fn to_request(&self) -> SearchRequest {
        SearchRequest {
            root: self.dir.clone(),
            name_globs: self.globs.clone(),
            extensions: self.extensions.clone(),
            content_query: self.query.clone(),
            use_regex: self.regex,
            case_sensitive: self.case_sensitive,
            max_results: self.max_results,
            context_lines: self.context_lines,
            extra_ignores: self.extra_ignores.clone(),
        }
    }
}

fn cmd_search(global: &GlobalArgs, args: SearchArgs) -> Result<(), SearchError> {
    let sandbox = Sandbox::new(&global.root)?;
    let start = Instant::now();
    let results = search(&sandbox, &args.to_request(), &ScoreWeights::default())?;
    let elapsed = start.elapsed();

    if args.json {
        println!("{:#}", serde_json::json!(results));
        return Ok(());
    }

    print!("{}", render_results(&results));
    eprintln!(
        "\n{} files matched in {:.3}s",
        results.len(),
        elapsed.as_secs_f64()
    );
    Ok(())
}

/// Human-readable listing: one header per file, then `line_no: text` per match.
pub(crate) fn render_results(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&format!("{:>6.2}  {}\n", result.score, result.relative_path));
        for m in &result.matches {
            out.push_str(&format!("        {}: {}\n", m.line_number, m.line_text.trim_end()));
        }
    }
    out
}

// ─── call / route ───────────────────────────────────────────────────

fn print_response(response: &ToolResponse) -> Result<(), SearchError> {
    println!("{:#}", response.to_payload());
    match response {
        ToolResponse::Failure { kind, message, .. } => Err(SearchError::InvalidArgs(format!(
            "{} ({})",
            message, kind
        ))),
        ToolResponse::Success { .. } => Ok(()),
    }
}

fn cmd_call(global: &GlobalArgs, args: CallArgs) -> Result<(), SearchError> {
    let ctx = tool_context(global, &args.limits)?;
    let raw: Value = serde_json::from_str(&args.args)
        .map_err(|e| SearchError::InvalidArgs(format!("--args is not valid JSON: {}", e)))?;
    let response = ctx.dispatch(&ToolCall::new(args.name, raw));
    print_response(&response)
}

fn cmd_route(global: &GlobalArgs, args: RouteArgs) -> Result<(), SearchError> {
    let text = args.text.join(" ");
    let call = match fallback::route(&text) {
        Route::Call(call) => call,
        Route::Unroutable => {
            return Err(SearchError::InvalidArgs(
                "No tool call and no fallback rule matched the request".to_string(),
            ));
        }
    };

    if !args.execute {
        println!("{:#}", serde_json::json!(call));
        return Ok(());
    }
    let ctx = tool_context(global, &args.limits)?;
    print_response(&ctx.dispatch(&call))
}
