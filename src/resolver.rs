//! Basename disambiguation for file paths supplied by tool callers.
//!
//! Callers often pass a bare file name (`util.py`) where a relative path is
//! needed (`pkg/util.py`). Resolution never guesses: every stage requires a
//! unique match, otherwise the original candidate is returned and the
//! subsequent file operation reports the usual not-found error.

use std::path::Path;

use ignore::WalkBuilder;
use tracing::debug;

use crate::Sandbox;

/// Resolve `candidate` to a unique root-relative path if it does not exist as given.
///
/// Stages: (a) a unique entry in `last_results` with the same basename that
/// exists in the sandbox; (b) a unique file with that basename anywhere under
/// the root; (c) the candidate unchanged.
pub fn resolve_path(sandbox: &Sandbox, candidate: &str, last_results: &[String]) -> String {
    if candidate.is_empty() {
        return candidate.to_string();
    }
    match sandbox.resolve(candidate) {
        Ok(full) if full.exists() => return candidate.to_string(),
        Ok(_) => {}
        // Escaping paths are left for the operation to reject.
        Err(_) => return candidate.to_string(),
    }

    let Some(base) = Path::new(candidate).file_name().map(|n| n.to_os_string()) else {
        return candidate.to_string();
    };

    let cached: Vec<&String> = last_results
        .iter()
        .filter(|rp| Path::new(rp.as_str()).file_name() == Some(base.as_os_str()))
        .filter(|rp| sandbox.resolve(rp).is_ok_and(|p| p.exists()))
        .collect();
    if let [only] = cached.as_slice() {
        debug!(candidate, resolved = %only, "Resolved path from last search results");
        return (*only).clone();
    }

    let found = scan_for_basename(sandbox, &base);
    if let [only] = found.as_slice() {
        debug!(candidate, resolved = %only, "Resolved path from unique filesystem match");
        return only.clone();
    }

    debug!(candidate, cached = cached.len(), scanned = found.len(), "Path left unresolved");
    candidate.to_string()
}

/// Walk the whole tree (no ignore pruning) collecting files named `base`.
/// Stops after the second hit since only uniqueness matters.
fn scan_for_basename(sandbox: &Sandbox, base: &std::ffi::OsStr) -> Vec<String> {
    let mut builder = WalkBuilder::new(sandbox.root());
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut found = Vec::new();
    for entry in builder.build().flatten() {
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if entry.file_name() == base {
            found.push(sandbox.relative_display(entry.path()));
            if found.len() > 1 {
                break;
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x = 1\n").unwrap();
    }

    #[test]
    fn test_existing_path_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "pkg/util.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "pkg/util.py", &[]), "pkg/util.py");
    }

    #[test]
    fn test_unique_filesystem_match() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "pkg/deep/render.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "render.py", &[]), "pkg/deep/render.py");
    }

    #[test]
    fn test_ambiguous_filesystem_match_falls_through() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a/util.py");
        write(tmp.path(), "b/util.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "util.py", &[]), "util.py");
    }

    #[test]
    fn test_last_results_disambiguate() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a/util.py");
        write(tmp.path(), "b/util.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        let last = vec!["b/util.py".to_string(), "b/other.py".to_string()];
        assert_eq!(resolve_path(&sb, "util.py", &last), "b/util.py");
    }

    #[test]
    fn test_stale_cache_entry_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "real/util.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        // Cached path no longer exists; the filesystem scan still finds the unique file.
        let last = vec!["gone/util.py".to_string()];
        assert_eq!(resolve_path(&sb, "util.py", &last), "real/util.py");
    }

    #[test]
    fn test_ambiguous_cache_falls_back_to_scan() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a/util.py");
        write(tmp.path(), "b/util.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        let last = vec!["a/util.py".to_string(), "b/util.py".to_string()];
        assert_eq!(resolve_path(&sb, "util.py", &last), "util.py");
    }

    #[test]
    fn test_wrong_directory_resolved_by_basename() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "pkg/calculator.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "src/calculator.py", &[]), "pkg/calculator.py");
    }

    #[test]
    fn test_escaping_candidate_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "inner/passwd");
        let sb = Sandbox::new(tmp.path().join("inner")).unwrap();
        assert_eq!(resolve_path(&sb, "../../passwd", &[]), "../../passwd");
    }

    #[test]
    fn test_no_match_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "missing.py", &[]), "missing.py");
        assert_eq!(resolve_path(&sb, "", &[]), "");
    }

    #[test]
    fn test_scan_is_not_pruned() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "build/generated.py");
        let sb = Sandbox::new(tmp.path()).unwrap();
        assert_eq!(resolve_path(&sb, "generated.py", &[]), "build/generated.py");
    }
}
