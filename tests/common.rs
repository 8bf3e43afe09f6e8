// 公共测试辅助函数
#![allow(dead_code)]

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip_util::{CompressionLevel, CompressionMethod, DosDateTime, ZipEntry, ZipWriter};

pub const A_COMMENT: &str = "greeting";

/// extra field: id 0xcafe, 长度 1, 数据 0x2a
pub const A_EXTRA: [u8; 5] = [0xfe, 0xca, 0x01, 0x00, 0x2a];

/// 创建临时测试目录
pub fn test_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// 2021-03-14 10:30:14
pub fn a_modified() -> DosDateTime {
    DosDateTime::from_raw((10 << 11) | (30 << 5) | 7, (41 << 9) | (3 << 5) | 14)
}

/// 按给定顺序写出一个 ZIP
pub fn write_zip(path: &Path, entries: &[(ZipEntry, &[u8])]) {
    let file = fs::File::create(path).expect("Failed to create zip file");
    let mut writer = ZipWriter::new(file, CompressionLevel::default());
    for (entry, content) in entries {
        writer
            .add_entry(entry, &mut &content[..])
            .expect("Failed to add entry");
    }
    writer.finish().expect("Failed to finish zip");
}

/// `{"a.txt": "hello", "dir/": <dir>, "dir/b.txt": "world"}`
///
/// a.txt 带注释、extra field、固定时间，并且使用 STORE 方法，
/// 便于检查重写后元数据是否保留。
pub fn make_sample_zip(dir: &Path) -> PathBuf {
    let path = dir.join("sample.zip");
    write_zip(
        &path,
        &[
            (
                ZipEntry::new("a.txt")
                    .with_comment(A_COMMENT)
                    .with_extra(A_EXTRA.to_vec())
                    .with_method(CompressionMethod::Stored)
                    .with_modified(a_modified()),
                &b"hello"[..],
            ),
            (ZipEntry::new("dir/"), &b""[..]),
            (ZipEntry::new("dir/b.txt"), &b"world"[..]),
        ],
    );
    path
}

/// 条目名（中央目录顺序）
pub fn entry_names(path: &Path) -> Vec<String> {
    zip_util::list(path)
        .expect("Failed to list zip")
        .into_iter()
        .map(|entry| entry.name)
        .collect()
}

/// 读取条目的解压内容
pub fn entry_bytes(path: &Path, name: &str) -> Vec<u8> {
    zip_util::read(path, name, |stream| {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
    .expect("Failed to read entry")
}

/// 用 `zip` crate 打开，验证输出能被标准工具读取
pub fn open_with_zip_crate(path: &Path) -> zip::ZipArchive<fs::File> {
    let file = fs::File::open(path).expect("Failed to open zip file");
    zip::ZipArchive::new(file).expect("zip crate rejected the archive")
}

/// 目录下的直接子项名（排序）
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// 不设置 UTF-8 标志、文件名含 CP437 字节 0x82（é）的 ZIP
///
/// 先用占位名 "aX.txt" 写出，再把本地头和中央目录中的文件名字节替换掉。
pub fn make_legacy_name_zip(dir: &Path) -> PathBuf {
    let path = dir.join("legacy.zip");
    write_zip(
        &path,
        &[
            (
                ZipEntry::new("aX.txt").with_method(CompressionMethod::Stored),
                &b"legacy"[..],
            ),
            (ZipEntry::new("b.txt"), &b"plain"[..]),
        ],
    );

    let bytes = fs::read(&path).expect("Failed to read zip file");
    let mut patched = bytes.clone();
    for (at, window) in bytes.windows(LEGACY_PLACEHOLDER.len()).enumerate() {
        if window == LEGACY_PLACEHOLDER {
            patched[at..at + LEGACY_RAW_NAME.len()].copy_from_slice(LEGACY_RAW_NAME);
        }
    }
    fs::write(&path, patched).expect("Failed to write zip file");
    path
}

const LEGACY_PLACEHOLDER: &[u8] = b"aX.txt";

/// 原始文件名字节
pub const LEGACY_RAW_NAME: &[u8] = b"a\x82.txt";

/// 按 CP437 解码后的文件名
pub const LEGACY_NAME: &str = "a\u{e9}.txt";

/// `needle` 在 `haystack` 中出现的次数
pub fn occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|window| *window == needle).count()
}
