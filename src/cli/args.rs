//! CLI argument structs for all subcommands.

use clap::{Args, Parser, ValueEnum};

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Sandbox root. No command reads, writes, or executes outside it.
    #[arg(long, global = true, default_value = ".")]
    pub root: String,

    /// Log level for stderr output (error, warn, info, debug, trace).
    /// Defaults to info for `serve` and warn otherwise; RUST_LOG overrides it.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(after_long_help = r#"EXAMPLES:
  Find a definition:       sandgrep search -e .py -q "def evaluate"
  Files by name:           sandgrep search -g "*render*" -g "*.md"
  Regex, case-sensitive:   sandgrep search -q "class \w+Error" --regex --case-sensitive
  Narrow the root:         sandgrep search --dir pkg -e .py -q TODO --context 0
  Machine-readable:        sandgrep search -e .rs -q unsafe --json

NOTES:
  - Name globs match the file name only, case-insensitively.
  - Globs and extensions are both required to match when both are given.
  - With no globs, extensions, or query nothing is returned.
  - .git, node_modules, __pycache__, build, dist and similar directories are skipped."#)]
pub struct SearchArgs {
    /// Directory to search, relative to --root
    #[arg(short, long, default_value = ".")]
    pub dir: String,

    /// File name glob (repeatable)
    #[arg(short = 'g', long = "glob")]
    pub globs: Vec<String>,

    /// Extension filter such as .py (repeatable, comma-separated accepted)
    #[arg(short, long = "ext", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Content query: plain text, or a regex with --regex
    #[arg(short, long)]
    pub query: Option<String>,

    /// Treat the query as a regular expression
    #[arg(short, long)]
    pub regex: bool,

    /// Case-sensitive content matching
    #[arg(short = 's', long)]
    pub case_sensitive: bool,

    /// Maximum number of files returned
    #[arg(short = 'n', long, default_value = "50")]
    pub max_results: usize,

    /// Lines of context before and after each match
    #[arg(short = 'C', long = "context", default_value = "2")]
    pub context_lines: usize,

    /// Additional directory names to skip (repeatable)
    #[arg(long = "ignore")]
    pub extra_ignores: Vec<String>,

    /// Print results as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(after_long_help = r#"EXAMPLES:
  sandgrep call get_files_info
  sandgrep call get_file_content --args '{"path": "util.py"}'
  sandgrep call schema_search_code --args '{"needle": "evaluate", "extensions": ".py"}'"#)]
pub struct CallArgs {
    /// Tool name; prefixes such as `schema_` or `functions.` are stripped
    pub name: String,

    /// Arguments as a JSON object
    #[arg(long, default_value = "{}")]
    pub args: String,

    #[command(flatten)]
    pub limits: LimitArgs,
}

#[derive(Parser, Debug)]
pub struct RouteArgs {
    /// Free-text request, e.g. "get the contents of lorem.txt"
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Dispatch the routed call instead of only printing it
    #[arg(long)]
    pub execute: bool,

    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Runtime limits for file and script tools.
#[derive(Args, Debug, Clone)]
pub struct LimitArgs {
    /// Seconds before run_python_file is killed
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,

    /// Interpreter used by run_python_file
    #[arg(long, default_value = "python3")]
    pub python: String,

    /// Characters returned by get_file_content before truncation
    #[arg(long, default_value = "10000")]
    pub max_read_chars: usize,
}

#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub limits: LimitArgs,
}
