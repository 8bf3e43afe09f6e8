//! 选择性重写 ZIP 文件
//!
//! 按原顺序遍历输入归档的每个条目：
//! 1. 条目名在替换表中：保留原元数据，写入替换内容
//! 2. 否则条目名在省略集合中：跳过
//! 3. 否则：解压后按原元数据重新写入
//!
//! 替换优先于省略。替换表中不存在于归档的名字被忽略，不会新增条目。

use crate::entry::ZipEntry;
use crate::error::{CompressionLevel, Result, ZipError};
use crate::zip::{ZipReader, ZipWriter};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

/// What happens to one entry of the input archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Replace,
    Omit,
    Copy,
}

fn action_for(name: &str, to_modify: &HashMap<String, impl Read>, to_omit: &HashSet<String>) -> Action {
    if to_modify.contains_key(name) {
        Action::Replace
    } else if to_omit.contains(name) {
        Action::Omit
    } else {
        Action::Copy
    }
}

/// Modifies only the specified entries in a zip file.
///
/// - `input`: a zip archive
/// - `output`: receives the new archive; returned once the archive is complete
/// - `to_modify`: a map from path to a stream with the new content of that entry
/// - `to_omit`: entries to leave out of the new archive
///
/// Each used replacement stream is read to the end and dropped right away.
/// Any failure aborts the whole rewrite; the output then has no central
/// directory and must be discarded by the caller.
pub fn modify<R, W, S>(
    input: R,
    output: W,
    mut to_modify: HashMap<String, S>,
    to_omit: &HashSet<String>,
) -> Result<W>
where
    R: Read + Seek,
    W: Write,
    S: Read,
{
    let mut reader = ZipReader::new(input)?;
    let mut writer = ZipWriter::new(output, CompressionLevel::default());

    for index in 0..reader.len() {
        let entry: &ZipEntry = &reader.entries()[index];
        let action = action_for(&entry.name, &to_modify, to_omit);
        log::debug!("{:?} '{}'", action, entry.name);

        match action {
            Action::Replace => {
                let new_entry = entry.with_new_content();
                if let Some(mut replacement) = to_modify.remove(&new_entry.name) {
                    writer.add_entry(&new_entry, &mut replacement)?;
                }
            }
            Action::Omit => {}
            Action::Copy => {
                let new_entry = entry.with_new_content();
                let mut content = reader.by_index(index)?;
                writer.add_entry(&new_entry, &mut content)?;
            }
        }
    }

    writer.finish()
}

/// [`modify`] between two files on disk.
///
/// `input` and `output` must be different files; naming the same file twice
/// fails with [`ZipError::SameFile`] before anything is truncated.
pub fn modify_file<S: Read>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    to_modify: HashMap<String, S>,
    to_omit: &HashSet<String>,
) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let source = File::open(input).map_err(|e| ZipError::file_open(input, e))?;
    if is_same_file(input, output) {
        return Err(ZipError::SameFile {
            path: output.to_path_buf(),
        });
    }
    let target = File::create(output).map_err(|e| ZipError::open_write(output, e))?;

    let mut buffered = modify(BufReader::new(source), BufWriter::new(target), to_modify, to_omit)?;
    buffered.flush()?;
    Ok(())
}

/// 输出不存在时一定不是同一个文件
fn is_same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
