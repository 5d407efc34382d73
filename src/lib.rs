//! # sandgrep: sandboxed ranked code search
//!
//! Walks a directory tree under a sandbox root, filters by name globs and
//! extensions, matches file contents (plain text or regex), scores and ranks
//! the hits, and extracts context windows around each matching line.
//!
//! A tool-dispatch layer ([`tools`]) normalizes loosely-shaped tool calls
//! (as emitted by language models) into canonical arguments, disambiguates
//! bare file names against the previous search, and turns every failure into
//! a structured payload. An MCP server ([`mcp`]) exposes the same tools over
//! JSON-RPC on stdio.

pub mod classify;
pub mod error;
pub mod matcher;
pub mod mcp;
pub mod resolver;
pub mod sandbox;
pub mod search;
pub mod tools;

pub use error::SearchError;
pub use sandbox::Sandbox;
pub use search::{search, Match, ScoreWeights, SearchRequest, SearchResult};
pub use tools::{ToolCall, ToolConfig, ToolContext, ToolResponse};

/// Directory basenames that are never descended into.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".venv",
    "__pycache__",
    "node_modules",
    ".mypy_cache",
    ".pytest_cache",
    ".idea",
    ".vscode",
    "dist",
    "build",
];

/// Files larger than this are never scanned for content, and direct reads
/// above it fail with [`SearchError::TooLarge`].
pub const MAX_SCAN_BYTES: u64 = 2_000_000;

/// Normalize path separators to forward slashes for stable, cross-platform output.
#[must_use]
pub fn normalize_path_sep(p: &str) -> String {
    p.replace('\\', "/")
}

/// Read a file as a String, using lossy UTF-8 conversion for non-UTF8 files.
/// Returns `(content, was_lossy)` where `was_lossy` is true if replacement characters
/// were inserted.
pub fn read_file_lossy(path: &std::path::Path) -> std::io::Result<(String, bool)> {
    let raw = std::fs::read(path)?;
    match String::from_utf8(raw) {
        Ok(s) => Ok((s, false)),
        Err(e) => Ok((String::from_utf8_lossy(e.as_bytes()).into_owned(), true)),
    }
}

/// Lowercased extension of a file name including the leading dot, or `""`.
///
/// Dotfiles such as `.bashrc` have no extension.
///
/// ```
/// use sandgrep::extension_of;
///
/// assert_eq!(extension_of("Main.PY"), ".py");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of(".bashrc"), "");
/// assert_eq!(extension_of("Makefile"), "");
/// ```
#[must_use]
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Normalize a caller-supplied extension to the `.ext` lowercase form.
#[must_use]
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().to_lowercase();
    if trimmed.is_empty() || trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{}", trimmed)
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_normalize_path_sep() {
        assert_eq!(normalize_path_sep(r"pkg\render.py"), "pkg/render.py");
        assert_eq!(normalize_path_sep("pkg/render.py"), "pkg/render.py");
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.py"), ".py");
        assert_eq!(extension_of("README.MD"), ".md");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of(".gitignore"), "");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".PY"), ".py");
        assert_eq!(normalize_extension("rs"), ".rs");
        assert_eq!(normalize_extension(" .Md "), ".md");
        assert_eq!(normalize_extension(""), "");
    }

    #[test]
    fn test_read_file_lossy_replaces_invalid_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("latin1.txt");
        std::fs::write(&path, b"caf\xe9 ok").unwrap();
        let (content, lossy) = read_file_lossy(&path).unwrap();
        assert!(lossy);
        assert!(content.contains('\u{FFFD}'));
        assert!(content.ends_with(" ok"));
    }

    #[test]
    fn test_read_file_lossy_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ok.txt");
        std::fs::write(&path, "héllo").unwrap();
        let (content, lossy) = read_file_lossy(&path).unwrap();
        assert!(!lossy);
        assert_eq!(content, "héllo");
    }
}
