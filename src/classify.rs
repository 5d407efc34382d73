//! File classification: is a file worth scanning for content?

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{extension_of, read_file_lossy, MAX_SCAN_BYTES};

/// Extensions treated as text without probing the file.
pub const TEXT_EXTENSIONS: &[&str] = &[
    ".py", ".go", ".c", ".h", ".cpp", ".hpp", ".rs", ".java", ".js", ".ts", ".tsx", ".jsx",
    ".json", ".toml", ".yaml", ".yml", ".md", ".txt", ".ini", ".cfg", ".sh", ".ps1", ".bat",
];

/// Bytes read from the head of a file when probing for binary content.
pub const BINARY_PROBE_BYTES: usize = 4096;

/// A file is searchable if its extension is a known text extension, or if
/// its first [`BINARY_PROBE_BYTES`] contain no NUL byte.
pub fn is_searchable(name: &str, full_path: &Path) -> bool {
    TEXT_EXTENSIONS.contains(&extension_of(name).as_str()) || !looks_binary(full_path)
}

/// Null-byte heuristic. Empty files are text; unreadable files are binary.
pub fn looks_binary(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return true,
    };
    let mut buf = [0u8; BINARY_PROBE_BYTES];
    let mut filled = 0;
    // A single read() may return short; keep going until the probe is full or EOF.
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return true,
        }
    }
    buf[..filled].contains(&0)
}

/// Whether a file of `size` bytes may be scanned for content.
#[must_use]
pub fn fits_scan_ceiling(size: u64) -> bool {
    size <= MAX_SCAN_BYTES
}

/// Read a file as newline-stripped lines.
///
/// Returns `None` when the file exceeds the scan ceiling or cannot be read;
/// invalid UTF-8 is replaced rather than rejected.
pub fn read_lines(path: &Path) -> Option<Vec<String>> {
    let size = std::fs::metadata(path).ok()?.len();
    if !fits_scan_ceiling(size) {
        return None;
    }
    let (content, _lossy) = read_file_lossy(path).ok()?;
    Some(content.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_known_text_extension_skips_probe() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("weird.py");
        fs::write(&path, b"abc\0def").unwrap();
        // Contains a NUL but .py is on the allow-list
        assert!(is_searchable("weird.py", &path));
    }

    #[test]
    fn test_unknown_extension_text_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.rst");
        fs::write(&path, "plain text here\n").unwrap();
        assert!(is_searchable("notes.rst", &path));
    }

    #[test]
    fn test_unknown_extension_binary_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blob.bin");
        fs::write(&path, [0x7f, b'E', b'L', b'F', 0, 0, 1]).unwrap();
        assert!(!is_searchable("blob.bin", &path));
    }

    #[test]
    fn test_empty_file_is_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.dat");
        fs::write(&path, b"").unwrap();
        assert!(!looks_binary(&path));
    }

    #[test]
    fn test_unreadable_file_is_binary() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(looks_binary(&tmp.path().join("missing.dat")));
    }

    #[test]
    fn test_null_after_probe_window_is_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("late.dat");
        let mut data = vec![b'a'; BINARY_PROBE_BYTES];
        data.push(0);
        fs::write(&path, data).unwrap();
        assert!(!looks_binary(&path));
    }

    #[test]
    fn test_scan_ceiling() {
        assert!(fits_scan_ceiling(0));
        assert!(fits_scan_ceiling(MAX_SCAN_BYTES));
        assert!(!fits_scan_ceiling(MAX_SCAN_BYTES + 1));
        assert!(!fits_scan_ceiling(3_000_000));
    }

    #[test]
    fn test_read_lines_strips_newlines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.py");
        fs::write(&path, "one\r\ntwo\nthree").unwrap();
        assert_eq!(read_lines(&path).unwrap(), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_read_lines_too_big() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big.py");
        let f = fs::File::create(&path).unwrap();
        f.set_len(MAX_SCAN_BYTES + 1).unwrap();
        assert!(read_lines(&path).is_none());
    }
}
