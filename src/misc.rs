//! Small file and text helpers shared by the archive operations.

use std::fs;
use std::io;
use std::path::Path;

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn to_unix_newline(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Deletes every empty folder below `root`, bottom-up.
///
/// A folder holding only empty folders counts as empty. `root` itself is never removed.
pub fn delete_empty_folders(root: impl AsRef<Path>) -> io::Result<()> {
    for entry in fs::read_dir(root.as_ref())? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            prune(&entry.path())?;
        }
    }
    Ok(())
}

/// Returns true when `dir` was empty (after pruning its children) and got removed.
fn prune(dir: &Path) -> io::Result<bool> {
    let mut empty = true;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // 符号链接不跟随，视为普通条目
        if entry.file_type()?.is_dir() {
            if !prune(&entry.path())? {
                empty = false;
            }
        } else {
            empty = false;
        }
    }

    if empty {
        log::trace!("removing empty folder '{}'", dir.display());
        fs::remove_dir(dir)?;
    }
    Ok(empty)
}
