//! 解压路径安全检查（防止 zip-slip）

use crate::error::{Result, ZipError};
use std::path::{Path, PathBuf};

/// Checks that an entry name stays inside the extraction directory.
///
/// Rejected: absolute names (`/x`, `\x`), drive-prefixed names (`C:x`) and
/// any `..` segment, with both `/` and `\` treated as separators.
pub fn validate_entry_name(name: &str) -> Result<()> {
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(ZipError::invalid_path(name, "absolute path in archive"));
    }

    let bytes = name.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return Err(ZipError::invalid_path(name, "drive prefix in archive"));
    }

    if name.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(ZipError::invalid_path(name, "parent directory segment in archive"));
    }

    Ok(())
}

/// Joins a validated entry name onto `exdir`, one segment at a time.
///
/// Empty and `.` segments are dropped, so `a//./b` lands at `exdir/a/b`.
pub fn entry_path(exdir: &Path, name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .fold(exdir.to_path_buf(), |path, segment| path.join(segment))
}
