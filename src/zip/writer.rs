//! 纯 Rust ZIP Writer 实现
//!
//! DEFLATE 条目边读边压缩，本地文件头不带大小，数据之后紧跟数据描述符（bit 3）。
//! STORE 条目先整体读入以计算 CRC32，本地文件头中直接写出确定的大小。
//! 中央目录和 EOCD 只在 [`ZipWriter::finish`] 时写出。

use crate::entry::{CompressionMethod, ZipEntry};
use crate::error::{CompressionLevel, Result, ZipError};
use crate::zip::format::{
    decode_cp437, CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, LocalFileHeader,
    FLAG_DATA_DESCRIPTOR, FLAG_UTF8, VERSION_NEEDED,
};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// 记录已写出字节数，用于计算本地文件头偏移量
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// 已写出的条目（用于写入中央目录）
struct CentralRecord {
    entry: ZipEntry,
    flags: u16,
    local_header_offset: u32,
}

/// 纯 Rust ZIP Writer
///
/// Dropping a writer without calling [`finish`](ZipWriter::finish) leaves the
/// output without a central directory, so it is never mistaken for a complete archive.
pub struct ZipWriter<W: Write> {
    writer: CountingWriter<W>,
    entries: Vec<CentralRecord>,
    compression_level: CompressionLevel,
}

impl<W: Write> ZipWriter<W> {
    pub fn new(inner: W, compression_level: CompressionLevel) -> Self {
        Self {
            writer: CountingWriter { inner, written: 0 },
            entries: Vec::new(),
            compression_level,
        }
    }

    /// 验证新建条目的文件名
    ///
    /// 规则：
    /// 1. 不能为空
    /// 2. 不能以 '/' 开头（绝对路径）
    /// 3. 不能包含反斜杠 '\'（DOS风格路径分隔符）
    pub fn validate_archive_name(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ZipError::invalid_path(name, "entry name is empty"));
        }
        if name.starts_with('/') {
            return Err(ZipError::invalid_path(name, "entry name cannot start with '/'"));
        }
        if name.contains('\\') {
            return Err(ZipError::invalid_path(name, "entry name cannot contain '\\'"));
        }
        Ok(())
    }

    /// Writes one entry with `entry`'s metadata and the full content of `content`.
    ///
    /// CRC32 and both sizes are computed here; the values carried by `entry` are ignored.
    /// Deflated content is streamed through the encoder and followed by a data
    /// descriptor; stored content is buffered so its sizes can go into the local header.
    pub fn add_entry<S: Read + ?Sized>(&mut self, entry: &ZipEntry, content: &mut S) -> Result<()> {
        let (name, comment, text_flags) = encoded_text(entry);
        let name_len = u16_field(name.len(), &entry.name, "name")?;
        let extra_len = u16_field(entry.extra.len(), &entry.name, "extra field")?;
        u16_field(comment.len(), &entry.name, "comment")?;
        let local_header_offset = u32_field(self.writer.written, &entry.name, "header offset")?;

        let mut header = LocalFileHeader {
            version_needed: VERSION_NEEDED,
            flags: text_flags,
            method: entry.method.as_u16(),
            modified: entry.modified,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            name_len,
            extra_len,
        };

        let descriptor = match entry.method {
            CompressionMethod::Stored => {
                let mut buffer = Vec::new();
                content.read_to_end(&mut buffer)?;
                let size = u32_field(buffer.len() as u64, &entry.name, "size")?;
                header.crc32 = crc32fast::hash(&buffer);
                header.compressed_size = size;
                header.uncompressed_size = size;

                self.write_local_header(&header, name, &entry.extra)?;
                self.writer.write_all(&buffer)?;
                DataDescriptor {
                    crc32: header.crc32,
                    compressed_size: size,
                    uncompressed_size: size,
                }
            }
            CompressionMethod::Deflated => {
                header.flags |= FLAG_DATA_DESCRIPTOR;
                self.write_local_header(&header, name, &entry.extra)?;

                let data_start = self.writer.written;
                let (crc32, uncompressed_size) = self.deflate_stream(content)?;
                let descriptor = DataDescriptor {
                    crc32,
                    compressed_size: u32_field(
                        self.writer.written - data_start,
                        &entry.name,
                        "compressed size",
                    )?,
                    uncompressed_size: u32_field(uncompressed_size, &entry.name, "size")?,
                };
                self.writer.write_all(&descriptor.to_bytes())?;
                descriptor
            }
            CompressionMethod::Other(method) => {
                return Err(ZipError::UnsupportedCompression {
                    name: entry.name.clone(),
                    method,
                })
            }
        };

        log::trace!(
            "wrote entry '{}' ({} -> {} bytes) at offset {}",
            entry.name,
            descriptor.uncompressed_size,
            descriptor.compressed_size,
            local_header_offset
        );

        self.entries.push(CentralRecord {
            entry: ZipEntry {
                crc32: descriptor.crc32,
                compressed_size: Some(descriptor.compressed_size as u64),
                uncompressed_size: descriptor.uncompressed_size as u64,
                ..entry.clone()
            },
            flags: header.flags,
            local_header_offset,
        });

        Ok(())
    }

    fn write_local_header(&mut self, header: &LocalFileHeader, name: &[u8], extra: &[u8]) -> Result<()> {
        self.writer.write_all(&header.to_bytes())?;
        self.writer.write_all(name)?;
        self.writer.write_all(extra)?;
        Ok(())
    }

    /// 边读边压缩，返回 (CRC32, 原始大小)
    fn deflate_stream<S: Read + ?Sized>(&mut self, content: &mut S) -> Result<(u32, u64)> {
        let level = Compression::new(self.compression_level.as_u8() as u32);
        let mut encoder = DeflateEncoder::new(&mut self.writer, level);
        let mut hasher = crc32fast::Hasher::new();
        let mut total = 0u64;
        let mut buf = vec![0u8; STREAM_BUFFER_SIZE];

        loop {
            let n = match content.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buf[..n]);
            encoder.write_all(&buf[..n])?;
            total += n as u64;
        }
        encoder.finish()?;

        Ok((hasher.finalize(), total))
    }

    /// 写入中央目录和 EOCD，返回底层 writer
    pub fn finish(mut self) -> Result<W> {
        let central_dir_offset = self.writer.written;

        for record in &self.entries {
            let entry = &record.entry;
            let (name, comment, _) = encoded_text(entry);
            let header = CentralDirectoryHeader {
                version_made_by: entry.version_made_by,
                version_needed: VERSION_NEEDED,
                flags: record.flags,
                method: entry.method.as_u16(),
                modified: entry.modified,
                crc32: entry.crc32,
                // 已在 add_entry 中验证过范围
                compressed_size: entry.compressed_size.unwrap_or(0) as u32,
                uncompressed_size: entry.uncompressed_size as u32,
                name_len: name.len() as u16,
                extra_len: entry.extra.len() as u16,
                comment_len: comment.len() as u16,
                disk_number_start: 0,
                internal_attr: 0,
                external_attr: entry.external_attr,
                local_header_offset: record.local_header_offset,
            };

            self.writer.write_all(&header.to_bytes())?;
            self.writer.write_all(name)?;
            self.writer.write_all(&entry.extra)?;
            self.writer.write_all(comment)?;
        }

        let central_dir_size = self.writer.written - central_dir_offset;
        let total_entries = u16::try_from(self.entries.len()).map_err(|_| {
            ZipError::Unsupported(format!("{} entries need zip64", self.entries.len()))
        })?;

        let eocd = EndOfCentralDirectory {
            disk_number: 0,
            central_dir_disk: 0,
            entries_this_disk: total_entries,
            total_entries,
            central_dir_size: u32_field(central_dir_size, "", "central directory size")?,
            central_dir_offset: u32_field(central_dir_offset, "", "central directory offset")?,
            comment_len: 0,
        };
        self.writer.write_all(&eocd.to_bytes())?;
        self.writer.flush()?;

        Ok(self.writer.inner)
    }
}

/// 文件名和注释实际写出的字节，以及对应的 UTF-8 标志
///
/// 读入时未设置 UTF-8 标志的条目，只要文本未被修改就写回原始字节且不设标志。
fn encoded_text(entry: &ZipEntry) -> (&[u8], &[u8], u16) {
    let raw_name = legacy_bytes(&entry.name, entry.raw_name.as_deref());
    let raw_comment = legacy_bytes(&entry.comment, entry.raw_comment.as_deref());

    let legacy = (raw_name.is_some() || entry.name.is_ascii())
        && (raw_comment.is_some() || entry.comment.is_ascii());
    if legacy {
        (
            raw_name.unwrap_or(entry.name.as_bytes()),
            raw_comment.unwrap_or(entry.comment.as_bytes()),
            0,
        )
    } else {
        (entry.name.as_bytes(), entry.comment.as_bytes(), FLAG_UTF8)
    }
}

fn legacy_bytes<'a>(text: &str, raw: Option<&'a [u8]>) -> Option<&'a [u8]> {
    raw.filter(|raw| decode_cp437(raw) == text)
}

fn u32_field(value: u64, name: &str, what: &str) -> Result<u32> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v != u32::MAX)
        .ok_or_else(|| ZipError::Unsupported(format!("{} of '{}' needs zip64", what, name)))
}

fn u16_field(len: usize, name: &str, what: &str) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| ZipError::Unsupported(format!("{} of '{}' is longer than 65535 bytes", what, name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DosDateTime;
    use crate::zip::format::{DATA_DESCRIPTOR_SIZE, LOCAL_FILE_HEADER_SIZE, LOCAL_FILE_HEADER_SIG};
    use crate::zip::reader::ZipReader;
    use std::io::Cursor;

    #[test]
    fn test_validate_archive_name() {
        assert!(ZipWriter::<Vec<u8>>::validate_archive_name("inner/name.txt").is_ok());
        assert!(ZipWriter::<Vec<u8>>::validate_archive_name("/abs.txt").is_err());
        assert!(ZipWriter::<Vec<u8>>::validate_archive_name("dir\\file.txt").is_err());
        assert!(ZipWriter::<Vec<u8>>::validate_archive_name("").is_err());
    }

    #[test]
    fn test_local_header_layout() {
        let entry = ZipEntry::new("a.txt")
            .with_method(CompressionMethod::Stored)
            .with_extra(vec![0xfe, 0xca, 0x01, 0x00, 0x2a])
            .with_modified(DosDateTime::from_raw(0x6a21, 0x5421));

        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        writer.add_entry(&entry, &mut &b"hello"[..]).unwrap();
        let bytes = writer.finish().unwrap();

        let mut fixed = [0u8; LOCAL_FILE_HEADER_SIZE];
        fixed.copy_from_slice(&bytes[..LOCAL_FILE_HEADER_SIZE]);
        let header = LocalFileHeader::parse(&fixed).unwrap();

        assert_eq!(u32::from_le_bytes(bytes[0..4].try_into().unwrap()), LOCAL_FILE_HEADER_SIG);
        assert_eq!(header.method, 0);
        assert_eq!(header.flags, 0);
        assert_eq!(header.crc32, crc32fast::hash(b"hello"));
        assert_eq!(header.compressed_size, 5);
        assert_eq!(header.uncompressed_size, 5);
        assert_eq!(header.extra_len, 5);
        assert_eq!(header.modified, DosDateTime::from_raw(0x6a21, 0x5421));
        assert_eq!(&bytes[30..35], b"a.txt");
        assert_eq!(&bytes[35..40], &[0xfe, 0xca, 0x01, 0x00, 0x2a]);
        assert_eq!(&bytes[40..45], b"hello");
    }

    #[test]
    fn test_utf8_flag_for_non_ascii_names() {
        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        writer
            .add_entry(&ZipEntry::new("文件.txt"), &mut io::empty())
            .unwrap();
        let bytes = writer.finish().unwrap();

        let flags = u16::from_le_bytes([bytes[6], bytes[7]]);
        assert_eq!(flags & FLAG_UTF8, FLAG_UTF8);
    }

    #[test]
    fn test_unsupported_method_rejected() {
        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        let entry = ZipEntry::new("a.bz2").with_method(CompressionMethod::Other(12));
        let err = writer.add_entry(&entry, &mut io::empty()).unwrap_err();
        assert!(matches!(err, ZipError::UnsupportedCompression { method: 12, .. }));
    }

    #[test]
    fn test_higher_level_compresses_repetitive_data() {
        let content = "build plugin ".repeat(500);
        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::MAX);
        writer
            .add_entry(&ZipEntry::new("big.txt"), &mut content.as_bytes())
            .unwrap();
        let bytes = writer.finish().unwrap();

        assert!(bytes.len() < content.len() / 4);
    }

    #[test]
    fn test_deflated_entry_uses_data_descriptor() {
        let content = b"hello hello hello hello";
        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        writer
            .add_entry(&ZipEntry::new("d.txt"), &mut &content[..])
            .unwrap();
        let bytes = writer.finish().unwrap();

        let mut fixed = [0u8; LOCAL_FILE_HEADER_SIZE];
        fixed.copy_from_slice(&bytes[..LOCAL_FILE_HEADER_SIZE]);
        let header = LocalFileHeader::parse(&fixed).unwrap();
        assert_eq!(header.flags & FLAG_DATA_DESCRIPTOR, FLAG_DATA_DESCRIPTOR);
        assert_eq!(header.crc32, 0);
        assert_eq!(header.compressed_size, 0);

        let reader = ZipReader::new(Cursor::new(bytes.clone())).unwrap();
        let entry = &reader.entries()[0];
        assert_eq!(entry.crc32, crc32fast::hash(content));
        assert_eq!(entry.uncompressed_size, content.len() as u64);

        let descriptor_at = LOCAL_FILE_HEADER_SIZE + 5 + entry.compressed_size.unwrap() as usize;
        let descriptor = DataDescriptor {
            crc32: entry.crc32,
            compressed_size: entry.compressed_size.unwrap() as u32,
            uncompressed_size: content.len() as u32,
        };
        assert_eq!(
            &bytes[descriptor_at..descriptor_at + DATA_DESCRIPTOR_SIZE],
            &descriptor.to_bytes()[..]
        );
    }

    #[test]
    fn test_legacy_name_written_back_unchanged() {
        let mut entry = ZipEntry::new("aé.txt").with_method(CompressionMethod::Stored);
        entry.raw_name = Some(b"a\x82.txt".to_vec());

        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        writer.add_entry(&entry, &mut &b"x"[..]).unwrap();
        let bytes = writer.finish().unwrap();

        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]) & FLAG_UTF8, 0);
        assert_eq!(&bytes[30..36], b"a\x82.txt");
        let reader = ZipReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.entries()[0].name, "aé.txt");
        assert_eq!(reader.entries()[0].raw_name.as_deref(), Some(&b"a\x82.txt"[..]));
    }

    #[test]
    fn test_renamed_legacy_entry_falls_back_to_utf8() {
        let mut entry = ZipEntry::new("bé.txt").with_method(CompressionMethod::Stored);
        entry.raw_name = Some(b"a\x82.txt".to_vec());

        let mut writer = ZipWriter::new(Vec::new(), CompressionLevel::default());
        writer.add_entry(&entry, &mut &b"x"[..]).unwrap();
        let bytes = writer.finish().unwrap();

        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]) & FLAG_UTF8, FLAG_UTF8);
        assert_eq!(&bytes[30..30 + "bé.txt".len()], "bé.txt".as_bytes());
    }
}
