//! Sandboxed file operations: read, write, list.

use std::fs;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{read_file_lossy, Sandbox, SearchError, MAX_SCAN_BYTES};

/// One directory entry as reported by `get_files_info`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
}

/// Read a text file, truncated to `max_chars` characters.
pub fn read_file(sandbox: &Sandbox, file_path: &str, max_chars: usize) -> Result<String, SearchError> {
    let full = sandbox.resolve(file_path)?;
    if !full.is_file() {
        return Err(SearchError::NotAFile(file_path.to_string()));
    }
    let size = fs::metadata(&full)?.len();
    if size > MAX_SCAN_BYTES {
        return Err(SearchError::TooLarge {
            path: file_path.to_string(),
            size,
            limit: MAX_SCAN_BYTES,
        });
    }

    let (content, lossy) = read_file_lossy(&full)?;
    if lossy {
        debug!(path = file_path, "Replaced invalid UTF-8 while reading");
    }

    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => Ok(format!(
            "{}...File \"{}\" truncated at {} characters",
            &content[..cut],
            file_path,
            format_thousands(max_chars)
        )),
        None => Ok(content),
    }
}

/// Create or overwrite a file, creating parent directories as needed.
pub fn write_file(sandbox: &Sandbox, file_path: &str, contents: &str) -> Result<String, SearchError> {
    let full = sandbox.resolve(file_path)?;
    if full.is_dir() {
        return Err(SearchError::NotAFile(file_path.to_string()));
    }
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full, contents)?;
    Ok(format!(
        "Successfully wrote to \"{}\" ({} characters written)",
        file_path,
        contents.chars().count()
    ))
}

/// List the immediate children of `directory`, sorted by name.
pub fn list_directory(sandbox: &Sandbox, directory: &str) -> Result<Vec<FileInfo>, SearchError> {
    let full = sandbox.resolve(directory)?;
    if !full.exists() {
        return Err(SearchError::NotFound(directory.to_string()));
    }
    if !full.is_dir() {
        return Err(SearchError::NotADirectory(directory.to_string()));
    }

    let mut entries = Vec::new();
    for entry in fs::read_dir(&full)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        entries.push(FileInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: meta.len(),
            is_dir: meta.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// `10000` -> `10,000`
fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
