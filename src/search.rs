//! Search engine: sandboxed directory walk, filtering, content matching, ranking.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{fits_scan_ceiling, is_searchable, read_lines};
use crate::matcher::{context_window, QueryMatcher};
use crate::{extension_of, normalize_extension, Sandbox, SearchError, DEFAULT_IGNORES};

/// Default cap on returned results.
pub const DEFAULT_MAX_RESULTS: usize = 50;
/// Default lines of context on each side of a match.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// A single search call. `root` is relative to the sandbox root.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub root: String,
    /// Shell-style patterns matched case-insensitively against file names.
    pub name_globs: Vec<String>,
    /// Extensions such as `.py`; normalized to lowercase with a leading dot.
    pub extensions: Vec<String>,
    /// Plain text or regex. `None` and `Some("")` both mean "no content search".
    pub content_query: Option<String>,
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub max_results: usize,
    pub context_lines: usize,
    /// Directory basenames pruned in addition to [`DEFAULT_IGNORES`].
    pub extra_ignores: Vec<String>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            name_globs: Vec::new(),
            extensions: Vec::new(),
            content_query: None,
            use_regex: false,
            case_sensitive: false,
            max_results: DEFAULT_MAX_RESULTS,
            context_lines: DEFAULT_CONTEXT_LINES,
            extra_ignores: Vec::new(),
        }
    }
}

/// One matching line and its surrounding context.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Match {
    /// 1-based
    #[serde(rename = "line_no")]
    pub line_number: usize,
    #[serde(rename = "line")]
    pub line_text: String,
    #[serde(rename = "preview")]
    pub context_window: Vec<String>,
}

/// A ranked file hit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Relative to the sandbox root, `/`-separated.
    #[serde(rename = "path")]
    pub relative_path: String,
    pub score: f64,
    pub matches: Vec<Match>,
}

/// Scoring tunables. Only the ordering name < extension < content is a contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Added once per matching name glob.
    pub glob: f64,
    /// Added when an extension filter matched.
    pub extension: f64,
    /// Added when the file has at least one content match.
    pub content_base: f64,
    pub per_match: f64,
    pub match_bonus_cap: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            glob: 1.0,
            extension: 0.5,
            content_base: 2.0,
            per_match: 0.1,
            match_bonus_cap: 1.0,
        }
    }
}

impl ScoreWeights {
    /// Score contribution of `match_count` content hits (zero when none).
    #[must_use]
    pub fn content_score(&self, match_count: usize) -> f64 {
        if match_count == 0 {
            return 0.0;
        }
        self.content_base + (match_count as f64 * self.per_match).min(self.match_bonus_cap)
    }
}

/// Compile name globs into one set so a single call reports every matching pattern.
fn build_glob_set(patterns: &[String]) -> Result<GlobSet, SearchError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::InvalidGlob {
                pattern: pattern.clone(),
                source: e,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| SearchError::InvalidGlob {
        pattern: patterns.join(","),
        source: e,
    })
}

/// Run a search inside `sandbox`.
///
/// Request-level problems (root outside the sandbox, missing root, root not a
/// directory, bad regex or glob, zero `max_results`) fail the whole call.
/// Per-file problems (unreadable, binary, too large) silently skip that file.
pub fn search(
    sandbox: &Sandbox,
    request: &SearchRequest,
    weights: &ScoreWeights,
) -> Result<Vec<SearchResult>, SearchError> {
    if request.max_results == 0 {
        return Err(SearchError::InvalidArgs(
            "max_results must be greater than 0".to_string(),
        ));
    }

    let base = sandbox.resolve(&request.root)?;
    if !base.exists() {
        return Err(SearchError::NotFound(request.root.clone()));
    }
    if !base.is_dir() {
        return Err(SearchError::NotADirectory(request.root.clone()));
    }

    let content_query = request.content_query.as_deref().filter(|q| !q.is_empty());
    let matcher = content_query
        .map(|q| QueryMatcher::compile(q, request.use_regex, request.case_sensitive))
        .transpose()?;
    let globs = if request.name_globs.is_empty() {
        None
    } else {
        Some(build_glob_set(&request.name_globs)?)
    };
    let extensions: HashSet<String> = request
        .extensions
        .iter()
        .map(|e| normalize_extension(e))
        .collect();
    let has_filters = globs.is_some() || !extensions.is_empty();

    let mut ignored: HashSet<String> = DEFAULT_IGNORES.iter().map(|s| s.to_string()).collect();
    ignored.extend(request.extra_ignores.iter().cloned());

    let start = Instant::now();
    let mut builder = WalkBuilder::new(&base);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));
    builder.filter_entry(move |entry| {
        // Prune before descending; the search root itself is never pruned.
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            return true;
        }
        !entry.file_name().to_str().is_some_and(|name| ignored.contains(name))
    });

    let mut results: Vec<SearchResult> = Vec::new();
    let mut files_seen = 0usize;

    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable walk entry");
                continue;
            }
        };
        let is_file = if entry.path_is_symlink() {
            linked_file_inside(sandbox, entry.path())
        } else {
            entry.file_type().is_some_and(|ft| ft.is_file())
        };
        if !is_file {
            continue;
        }
        files_seen += 1;

        let name = entry.file_name().to_string_lossy();
        let ext = extension_of(&name);

        if !extensions.is_empty() && !extensions.contains(&ext) {
            continue;
        }
        let glob_hits = match &globs {
            Some(set) => {
                let hits = set.matches(&*name).len();
                if hits == 0 {
                    continue;
                }
                hits
            }
            None => 0,
        };

        let mut score = glob_hits as f64 * weights.glob;
        if !extensions.is_empty() {
            score += weights.extension;
        }

        let matches = match &matcher {
            Some(matcher) => match scan_file(entry.path(), &name, matcher, request.context_lines) {
                Some(found) if !found.is_empty() => found,
                _ => continue,
            },
            // A bare walk with no filters returns nothing rather than the whole tree.
            None if !has_filters => continue,
            None => Vec::new(),
        };
        score += weights.content_score(matches.len());

        results.push(SearchResult {
            relative_path: sandbox.relative_display(entry.path()),
            score,
            matches,
        });
    }

    // sort_by is stable: equal scores keep traversal order.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let total = results.len();
    results.truncate(request.max_results);

    info!(
        root = %request.root,
        files = files_seen,
        hits = total,
        returned = results.len(),
        elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
        "Search complete"
    );

    Ok(results)
}

/// A symlink counts as a file when it points at a regular file whose
/// lexical target lies inside the sandbox. Directory links are never entered.
fn linked_file_inside(sandbox: &Sandbox, link: &Path) -> bool {
    let Ok(target) = std::fs::read_link(link) else {
        return false;
    };
    let target = match link.parent() {
        Some(parent) => parent.join(target),
        None => target,
    };
    if sandbox.resolve(&target.to_string_lossy()).is_err() {
        return false;
    }
    std::fs::metadata(link).is_ok_and(|m| m.is_file())
}

/// Scan one file line by line. `None` means the file was skipped.
fn scan_file(
    path: &Path,
    name: &str,
    matcher: &QueryMatcher,
    context_lines: usize,
) -> Option<Vec<Match>> {
    let size = std::fs::metadata(path).ok()?.len();
    if !fits_scan_ceiling(size) {
        debug!(path = %path.display(), size, "Skipping file above scan ceiling");
        return None;
    }
    if !is_searchable(name, path) {
        debug!(path = %path.display(), "Skipping binary file");
        return None;
    }
    let lines = read_lines(path)?;

    let matches = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| matcher.is_match(line))
        .map(|(idx, line)| Match {
            line_number: idx + 1,
            line_text: line.clone(),
            context_window: context_window(&lines, idx + 1, context_lines),
        })
        .collect();
    Some(matches)
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
