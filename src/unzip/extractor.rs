//! 纯 Rust ZIP Extractor 实现

use crate::error::{Result, ZipError};
use crate::unzip::path_safety::{entry_path, validate_entry_name};
use crate::zip::ZipReader;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 提取选项
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// 已存在的文件是否覆盖
    pub overwrite: bool,
    /// 输出目录（不存在时自动创建）
    pub exdir: PathBuf,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            exdir: PathBuf::from("."),
        }
    }
}

/// Extracts every entry of an archive under a destination directory.
pub struct Extractor {
    zipfile: PathBuf,
    options: ExtractorOptions,
}

impl Extractor {
    pub fn new(zipfile: impl AsRef<Path>) -> Self {
        Self {
            zipfile: zipfile.as_ref().to_path_buf(),
            options: ExtractorOptions::default(),
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.options.overwrite = overwrite;
        self
    }

    pub fn exdir(mut self, exdir: impl AsRef<Path>) -> Self {
        self.options.exdir = exdir.as_ref().to_path_buf();
        self
    }

    pub fn options(&self) -> &ExtractorOptions {
        &self.options
    }

    /// 执行提取
    ///
    /// 所有条目名先统一检查，任何一个不安全都不会写出任何文件。
    /// 写入过程中出错则中止，已写出的文件保留。
    pub fn extract(self) -> Result<()> {
        let mut archive = ZipReader::open(&self.zipfile)?;

        for entry in archive.entries() {
            validate_entry_name(&entry.name)?;
        }

        let exdir = &self.options.exdir;
        fs::create_dir_all(exdir).map_err(|e| ZipError::create_dir(exdir, e))?;

        for index in 0..archive.len() {
            let entry = &archive.entries()[index];
            let output_path = entry_path(exdir, &entry.name);

            // 如果是目录，只创建目录
            if entry.is_dir() {
                log::debug!("creating directory '{}'", output_path.display());
                fs::create_dir_all(&output_path)
                    .map_err(|e| ZipError::create_dir(&output_path, e))?;
                continue;
            }

            if !self.options.overwrite && output_path.exists() {
                log::warn!("not overwriting '{}'", output_path.display());
                continue;
            }

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(|e| ZipError::create_dir(parent, e))?;
            }

            log::debug!("extracting '{}' to '{}'", entry.name, output_path.display());
            let file = File::create(&output_path)
                .map_err(|e| ZipError::open_write(&output_path, e))?;
            let mut output = BufWriter::new(file);
            let mut content = archive.by_index(index)?;
            io::copy(&mut content, &mut output)?;
            output.flush()?;
        }

        Ok(())
    }
}
