//! ZIP container codec and single-entry archive creation.

pub mod format;
pub mod reader;
pub mod writer;

pub use reader::{EntryReader, ZipReader};
pub use writer::ZipWriter;

use crate::entry::{CompressionMethod, DosDateTime, ZipEntry};
use crate::error::{CompressionLevel, Result, ZipError};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Creates a single-entry zip file.
///
/// The content of `input` is stored under `path_within_archive`, deflated at
/// the maximum level. `output` is created or truncated; if anything fails
/// after that, the partial output is removed.
///
/// # 示例
///
/// ```no_run
/// zip_util::zip("build/plugin.xml", "META-INF/plugin.xml", "build/plugin.zip").unwrap();
/// ```
pub fn zip(
    input: impl AsRef<Path>,
    path_within_archive: &str,
    output: impl AsRef<Path>,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    ZipWriter::<File>::validate_archive_name(path_within_archive)?;

    // 先打开输入文件，避免输入不存在时留下空的输出文件
    let source = File::open(input).map_err(|e| ZipError::file_open(input, e))?;
    let modified = source
        .metadata()
        .and_then(|meta| meta.modified())
        .map(DosDateTime::from_system_time)
        .unwrap_or_else(|_| DosDateTime::now());

    let file = File::create(output).map_err(|e| ZipError::open_write(output, e))?;

    let entry = ZipEntry::new(path_within_archive)
        .with_method(CompressionMethod::Deflated)
        .with_modified(modified);

    let result = write_single_entry(&entry, source, file);
    if let Err(ref e) = result {
        log::debug!("zip of '{}' failed, removing '{}': {}", input.display(), output.display(), e);
        let _ = fs::remove_file(output);
    }
    result
}

fn write_single_entry(entry: &ZipEntry, source: File, output: File) -> Result<()> {
    let mut writer = ZipWriter::new(BufWriter::new(output), CompressionLevel::MAX);
    writer.add_entry(entry, &mut BufReader::new(source))?;
    let mut buffered = writer.finish()?;
    buffered.flush()?;
    Ok(())
}
