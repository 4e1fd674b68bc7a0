//! Shared utility functions used across modules.

use std::io::Write;
use std::path::Path;

use unicode_width::UnicodeWidthStr;

/// Truncate a string to `max_len` characters, appending "..." if truncated.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max_len).collect()
    }
}

/// Left-pad `line` so it sits centred in `width` terminal columns.
pub fn center_line(line: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(line);
    if w >= width {
        return line.to_string();
    }
    let pad = (width - w) / 2;
    format!("{}{}", " ".repeat(pad), line)
}

/// Replace `path` with `bytes` so readers never observe a partial file.
///
/// Writes a sibling `.tmp` file, syncs it, then renames over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    let result = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}
