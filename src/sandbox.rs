//! Path sandbox: every file-touching operation resolves through here first.
//!
//! The containment check is purely textual. `.` and `..` segments are folded
//! lexically and the result must sit at or beneath the root, component-wise.
//! Symlinks are NOT resolved, so a link inside the root that points outside
//! it passes this check. The search walker never follows links, but the
//! read/write/run operations open whatever the resolved path names.

use std::path::{Component, Path, PathBuf};

use crate::{normalize_path_sep, SearchError};

/// A root directory outside of which no operation may read, write, or execute.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Build a sandbox from a (possibly relative) root. Relative roots are
    /// made absolute against the current directory; the root need not exist.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SearchError> {
        let absolute = std::path::absolute(root.as_ref())?;
        Ok(Self {
            root: normalize_lexically(&absolute),
        })
    }

    /// Absolute, lexically normalized root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the root, rejecting anything that escapes it.
    ///
    /// An absolute `relative` replaces the root entirely (as `Path::join`
    /// does) and is only accepted when it still lies under the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, SearchError> {
        let resolved = normalize_lexically(&self.root.join(relative));
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(SearchError::OutsideSandbox {
                path: relative.to_string(),
            })
        }
    }

    /// Root-relative display form with `/` separators (`.` for the root).
    pub fn relative_display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => normalize_path_sep(&rel.to_string_lossy()),
            Err(_) => normalize_path_sep(&path.to_string_lossy()),
        }
    }
}

/// Fold `.` and `..` without consulting the filesystem. `..` at the root is a no-op.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Paths made only of ordinary segments never escape.
        #[test]
        fn plain_segments_stay_inside(segments in proptest::collection::vec("[a-zA-Z0-9_]{1,8}", 0..6)) {
            let tmp = tempfile::tempdir().unwrap();
            let sb = Sandbox::new(tmp.path()).unwrap();
            let rel = segments.join("/");
            let resolved = sb.resolve(&rel).unwrap();
            prop_assert!(resolved.starts_with(sb.root()));
        }

        /// Climbing above the root and naming a sibling is always rejected.
        #[test]
        fn climbing_out_is_rejected(depth in 0usize..4, extra in 1usize..4, name in "[a-z]{1,8}") {
            let tmp = tempfile::tempdir().unwrap();
            let mut root = tmp.path().to_path_buf();
            for i in 0..depth {
                root.push(format!("d{}", i));
            }
            let sb = Sandbox::new(&root).unwrap();
            let rel = format!("{}outside_{}", "../".repeat(depth + extra), name);
            prop_assert!(sb.resolve(&rel).is_err(), "{} should escape {}", rel, root.display());
        }
    }
}
