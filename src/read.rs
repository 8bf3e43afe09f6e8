//! Reading a single entry out of an archive.

use crate::error::{Result, ZipError};
use crate::misc::to_unix_newline;
use crate::zip::{EntryReader, ZipReader};
use std::io::Read;
use std::path::Path;

/// Reads the given entry from the zip.
///
/// `reader` is called with the decoded content of `to_read`; whatever it
/// returns is returned from here. The stream must not outlive the call: the
/// archive is closed as soon as `reader` returns, on success and on error.
///
/// Fails with [`ZipError::EntryNotFound`] when the archive has no entry named
/// exactly `to_read`; `reader` is not called in that case.
///
/// # 示例
///
/// ```no_run
/// use std::io::Read;
///
/// let size = zip_util::read("plugin.jar", "META-INF/MANIFEST.MF", |stream| {
///     let mut buf = Vec::new();
///     stream.read_to_end(&mut buf)?;
///     Ok(buf.len())
/// })
/// .unwrap();
/// ```
pub fn read<T, F>(input: impl AsRef<Path>, to_read: &str, reader: F) -> Result<T>
where
    F: FnOnce(&mut EntryReader<'_>) -> Result<T>,
{
    let input = input.as_ref();
    let mut archive = ZipReader::open(input)?;
    let mut stream = archive
        .by_name(to_read)?
        .ok_or_else(|| ZipError::EntryNotFound {
            name: to_read.to_string(),
            archive: input.to_path_buf(),
        })?;
    reader(&mut stream)
}

/// Reads the given entry as UTF-8 text with only unix newlines.
pub fn read_to_string(input: impl AsRef<Path>, to_read: &str) -> Result<String> {
    let input = input.as_ref();
    let bytes = read(input, to_read, |stream| {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    })?;

    let raw = String::from_utf8(bytes).map_err(|source| ZipError::Encoding {
        name: to_read.to_string(),
        archive: input.to_path_buf(),
        source,
    })?;
    Ok(to_unix_newline(&raw))
}
