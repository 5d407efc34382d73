//! Line matching (plain substring or regex) and context-window extraction.

use regex::{Regex, RegexBuilder};

use crate::SearchError;

/// A content query compiled once per search call.
#[derive(Debug, Clone)]
pub enum QueryMatcher {
    /// Substring test. When case-insensitive, `needle` is already lowercased.
    Plain { needle: String, case_sensitive: bool },
    /// Case-insensitivity is baked into the compiled regex.
    Regex(Regex),
}

impl QueryMatcher {
    /// Compile a query. Regex compile errors are fatal for the whole search.
    pub fn compile(query: &str, use_regex: bool, case_sensitive: bool) -> Result<Self, SearchError> {
        if use_regex {
            let re = RegexBuilder::new(query)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|e| SearchError::InvalidPattern {
                    pattern: query.to_string(),
                    source: e,
                })?;
            Ok(QueryMatcher::Regex(re))
        } else {
            let needle = if case_sensitive { query.to_string() } else { query.to_lowercase() };
            Ok(QueryMatcher::Plain { needle, case_sensitive })
        }
    }

    /// Does `line` contain a hit?
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        match self {
            QueryMatcher::Regex(re) => re.is_match(line),
            QueryMatcher::Plain { needle, case_sensitive: true } => line.contains(needle.as_str()),
            QueryMatcher::Plain { needle, case_sensitive: false } => {
                line.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// Lines `[max(1, i-c), min(n, i+c)]` (1-based, inclusive) around line `line_no`.
///
/// Returns an empty window if `line_no` is outside `1..=lines.len()`.
#[must_use]
pub fn context_window(lines: &[String], line_no: usize, context_lines: usize) -> Vec<String> {
    if line_no == 0 || line_no > lines.len() {
        return Vec::new();
    }
    let start = line_no.saturating_sub(context_lines).max(1);
    let end = line_no.saturating_add(context_lines).min(lines.len());
    lines[start - 1..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_case_insensitive() {
        let m = QueryMatcher::compile("Evaluate", false, false).unwrap();
        assert!(m.is_match("def evaluate(x): return x"));
        assert!(m.is_match("EVALUATE"));
        assert!(!m.is_match("eval"));
    }

    #[test]
    fn test_plain_case_sensitive() {
        let m = QueryMatcher::compile("Evaluate", false, true).unwrap();
        assert!(!m.is_match("def evaluate(x)"));
        assert!(m.is_match("class Evaluate:"));
    }

    #[test]
    fn test_plain_regex_metachars_are_literal() {
        let m = QueryMatcher::compile("foo(", false, false).unwrap();
        assert!(m.is_match("x = foo(1)"));
        assert!(!m.is_match("foo)"));
    }

    #[test]
    fn test_regex_case_flag() {
        let insensitive = QueryMatcher::compile(r"def\s+EVAL\w*", true, false).unwrap();
        assert!(insensitive.is_match("def evaluate(x):"));
        let sensitive = QueryMatcher::compile(r"def\s+EVAL\w*", true, true).unwrap();
        assert!(!sensitive.is_match("def evaluate(x):"));
    }

    #[test]
    fn test_regex_compile_failure() {
        let err = QueryMatcher::compile("foo(", true, false).unwrap_err();
        match err {
            SearchError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "foo("),
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
    }

    #[test]
    fn test_context_window_middle() {
        let src = lines(&["1", "2", "3", "4", "5", "6", "7"]);
        assert_eq!(context_window(&src, 4, 2), lines(&["2", "3", "4", "5", "6"]));
    }

    #[test]
    fn test_context_window_clamped_at_edges() {
        let src = lines(&["1", "2", "3"]);
        assert_eq!(context_window(&src, 1, 2), lines(&["1", "2", "3"]));
        assert_eq!(context_window(&src, 3, 1), lines(&["2", "3"]));
    }

    #[test]
    fn test_context_window_zero_context() {
        let src = lines(&["a", "b", "c"]);
        assert_eq!(context_window(&src, 2, 0), lines(&["b"]));
    }

    #[test]
    fn test_context_window_out_of_range() {
        let src = lines(&["a"]);
        assert!(context_window(&src, 0, 2).is_empty());
        assert!(context_window(&src, 2, 2).is_empty());
    }

    #[test]
    fn test_context_window_huge_context_is_whole_file() {
        let src = lines(&["a", "b", "c"]);
        assert_eq!(context_window(&src, 2, usize::MAX), src);
        assert_eq!(context_window(&lines(&["only"]), 1, usize::MAX), lines(&["only"]));
    }
}
