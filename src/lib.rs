//! zip-util - 构建插件用的 ZIP 工具
//!
//! 一组同步、单次调用的 ZIP 文件操作，适合在构建插件中检查和修补 IDE/项目归档。
//!
//! ## 功能
//!
//! - 读取单个条目（字节流或统一换行的 UTF-8 文本）
//! - 选择性重写：替换部分条目、省略部分条目，其余条目连同元数据原样复制
//! - 创建单条目 ZIP（最高压缩级别）
//! - 解压整个 ZIP（拒绝 `..` 和绝对路径条目）
//!
//! ## 示例
//!
//! ```no_run
//! use std::collections::{HashMap, HashSet};
//! use std::io::Cursor;
//!
//! let manifest = zip_util::read_to_string("plugin.jar", "META-INF/MANIFEST.MF").unwrap();
//!
//! let mut to_modify = HashMap::new();
//! to_modify.insert(
//!     "META-INF/MANIFEST.MF".to_string(),
//!     Cursor::new(manifest.replace("1.0.0", "1.0.1")),
//! );
//! let to_omit: HashSet<String> = ["META-INF/SIG.SF".to_string()].into_iter().collect();
//!
//! zip_util::modify_file("plugin.jar", "plugin-patched.jar", to_modify, &to_omit).unwrap();
//! ```

pub mod entry;
pub mod error;
pub mod misc;
pub mod modify;
pub mod read;
pub mod unzip;
pub mod zip;

// 重导出常用类型
pub use entry::{CompressionMethod, DosDateTime, ZipEntry};
pub use error::{CompressionLevel, Result, ZipError, ZipErrorKind};
pub use modify::{modify, modify_file};
pub use read::{read, read_to_string};
pub use unzip::{unzip, Extractor, ExtractorOptions};
pub use crate::zip::{zip, EntryReader, ZipReader, ZipWriter};

/// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 列出 ZIP 内容（中央目录顺序）
///
/// ```no_run
/// for entry in zip_util::list("archive.zip").unwrap() {
///     println!("{}", entry.name);
/// }
/// ```
pub fn list(zipfile: impl AsRef<std::path::Path>) -> Result<Vec<ZipEntry>> {
    Ok(ZipReader::open(zipfile)?.entries().to_vec())
}
