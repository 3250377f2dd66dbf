//! Small filesystem helpers shared by the writers.

use std::fs;
use std::io;
use std::path::Path;

/// Writes `content` to `path` unless the file already holds exactly that content.
///
/// Parent directories are created as needed. Returns whether the file was written.
pub(crate) fn write_if_changed(path: &Path, content: &str) -> io::Result<bool> {
    if path.exists() && fs::read_to_string(path)? == content {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(path, content)?;
    Ok(true)
}
