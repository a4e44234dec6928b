//! Corpus enumeration

use crate::error::{HarnessError, Result};
use std::path::Path;

/// Extension of corpus test files
pub const TEST_EXTENSION: &str = "js";

/// Collect every test file under `root/dir`.
///
/// Returned paths are relative to `root`, `/`-separated and sorted. Entries
/// whose name starts with `.` are ignored, files or directories alike.
pub fn walk(root: &Path, dir: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    walk_dir(root, dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk_dir(root: &Path, dir: &str, files: &mut Vec<String>) -> Result<()> {
    let full = root.join(dir);
    let entries = std::fs::read_dir(&full).map_err(|e| HarnessError::io(&full, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| HarnessError::io(&full, e))?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }

        let relative = if dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", dir.trim_end_matches('/'), name)
        };
        let file_type = entry
            .file_type()
            .map_err(|e| HarnessError::io(entry.path(), e))?;

        if file_type.is_dir() {
            walk_dir(root, &relative, files)?;
        } else if is_test_file(&name) {
            files.push(relative);
        }
    }
    Ok(())
}

fn is_test_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext == TEST_EXTENSION)
        .unwrap_or(false)
}
