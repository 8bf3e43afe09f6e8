//! 纯 Rust ZIP Reader 实现
//!
//! 从文件末尾定位 EOCD，解析中央目录，按需解压单个条目。
//! 条目的注释和权威大小只存在于中央目录中，所以这里要求 `Read + Seek`。

use crate::entry::{CompressionMethod, ZipEntry};
use crate::error::{Result, ZipError};
use crate::zip::format::{
    decode_cp437, find_eocd, CentralDirectoryHeader, EndOfCentralDirectory, LocalFileHeader,
    CENTRAL_DIR_HEADER_SIZE, END_OF_CENTRAL_DIR_SIZE, FLAG_ENCRYPTED, FLAG_UTF8,
    LOCAL_FILE_HEADER_SIZE, MAX_EOCD_SEARCH_LEN, ZIP64_EOCD_LOCATOR_SIG, ZIP64_EOCD_LOCATOR_SIZE,
};
use flate2::read::DeflateDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// 纯 Rust ZIP Reader
pub struct ZipReader<R> {
    inner: R,
    /// 中央目录顺序的条目
    entries: Vec<ZipEntry>,
    /// 每个条目的本地文件头偏移量
    header_offsets: Vec<u64>,
}

impl ZipReader<BufReader<File>> {
    /// 打开 ZIP 文件并读取中央目录
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ZipError::file_open(path, e))?;
        ZipReader::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        let eocd = Self::find_and_parse_eocd(&mut inner)?;
        let (entries, header_offsets) = Self::parse_central_directory(&mut inner, &eocd)?;

        Ok(Self {
            inner,
            entries,
            header_offsets,
        })
    }

    /// 查找并解析 EOCD 记录
    fn find_and_parse_eocd(reader: &mut R) -> Result<EndOfCentralDirectory> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < END_OF_CENTRAL_DIR_SIZE as u64 {
            return Err(ZipError::corrupt_archive("file too small to be a ZIP archive"));
        }

        // 只需要读取末尾最多 65557 字节
        let tail_len = file_size.min(MAX_EOCD_SEARCH_LEN);
        let tail_start = file_size - tail_len;
        let mut tail = vec![0u8; tail_len as usize];
        reader.seek(SeekFrom::Start(tail_start))?;
        reader.read_exact(&mut tail)?;

        let pos = find_eocd(&tail)
            .ok_or_else(|| ZipError::corrupt_archive("cannot find end of central directory"))?;
        let eocd = EndOfCentralDirectory::parse(&tail[pos..])?;

        if eocd.disk_number != 0 || eocd.central_dir_disk != 0 {
            return Err(ZipError::Unsupported("multi-disk archives".to_string()));
        }

        let has_zip64_locator = pos >= ZIP64_EOCD_LOCATOR_SIZE
            && tail[pos - ZIP64_EOCD_LOCATOR_SIZE..pos - ZIP64_EOCD_LOCATOR_SIZE + 4]
                == ZIP64_EOCD_LOCATOR_SIG.to_le_bytes();
        if has_zip64_locator || eocd.needs_zip64() {
            return Err(ZipError::Unsupported("zip64 archives".to_string()));
        }

        let eocd_offset = tail_start + pos as u64;
        let central_dir_end = eocd.central_dir_offset as u64 + eocd.central_dir_size as u64;
        if central_dir_end > eocd_offset {
            return Err(ZipError::corrupt_archive(format!(
                "central directory ends at {} but the end record starts at {}",
                central_dir_end, eocd_offset
            )));
        }

        Ok(eocd)
    }

    /// 解析中央目录
    fn parse_central_directory(
        reader: &mut R,
        eocd: &EndOfCentralDirectory,
    ) -> Result<(Vec<ZipEntry>, Vec<u64>)> {
        let total = eocd.total_entries as usize;
        let mut entries = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(total);

        reader.seek(SeekFrom::Start(eocd.central_dir_offset as u64))?;
        log::trace!(
            "central directory: {} entries at offset {}",
            total,
            eocd.central_dir_offset
        );

        for _ in 0..total {
            let mut fixed = [0u8; CENTRAL_DIR_HEADER_SIZE];
            reader.read_exact(&mut fixed)?;
            let header = CentralDirectoryHeader::parse(&fixed)?;

            let name_bytes = read_bytes(reader, header.name_len as usize)?;
            let extra = read_bytes(reader, header.extra_len as usize)?;
            let comment_bytes = read_bytes(reader, header.comment_len as usize)?;

            let utf8 = header.flags & FLAG_UTF8 != 0;
            let (name, raw_name) = decode_text(name_bytes, utf8);
            let (comment, raw_comment) = decode_text(comment_bytes, utf8);

            if header.needs_zip64() {
                return Err(ZipError::Unsupported(format!("zip64 entry '{}'", name)));
            }
            if header.flags & FLAG_ENCRYPTED != 0 {
                return Err(ZipError::Unsupported(format!("encrypted entry '{}'", name)));
            }

            offsets.push(header.local_header_offset as u64);
            entries.push(ZipEntry {
                name,
                comment,
                extra,
                method: CompressionMethod::from_u16(header.method),
                modified: header.modified,
                external_attr: header.external_attr,
                version_made_by: header.version_made_by,
                crc32: header.crc32,
                compressed_size: Some(header.compressed_size as u64),
                uncompressed_size: header.uncompressed_size as u64,
                raw_name,
                raw_comment,
            });
        }

        Ok((entries, offsets))
    }

    /// 获取所有文件条目（中央目录顺序）
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry named `name`; with duplicate names the last one wins.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.name == name)
    }

    /// Opens the decoded content stream of the entry at `index`.
    pub fn by_index(&mut self, index: usize) -> Result<EntryReader<'_>> {
        let entry = self.entries.get(index).ok_or_else(|| {
            ZipError::corrupt_archive(format!("entry index {} out of bounds", index))
        })?;

        // 定位到本地文件头，跳过文件名和 extra field
        // 本地头中的长度可能与中央目录不同，必须以本地头为准
        self.inner.seek(SeekFrom::Start(self.header_offsets[index]))?;
        let mut fixed = [0u8; LOCAL_FILE_HEADER_SIZE];
        self.inner.read_exact(&mut fixed)?;
        let local = LocalFileHeader::parse(&fixed)?;
        self.inner
            .seek(SeekFrom::Current(local.variable_len() as i64))?;

        let raw = (&mut self.inner).take(entry.compressed_size.unwrap_or(0));
        let decoded: Box<dyn Read + '_> = match entry.method {
            CompressionMethod::Stored => Box::new(raw),
            CompressionMethod::Deflated => Box::new(DeflateDecoder::new(raw)),
            CompressionMethod::Other(method) => {
                return Err(ZipError::UnsupportedCompression {
                    name: entry.name.clone(),
                    method,
                })
            }
        };

        Ok(EntryReader {
            entry,
            inner: decoded,
            hasher: crc32fast::Hasher::new(),
            bytes_read: 0,
            verified: false,
        })
    }

    /// Opens the entry named `name`, or `None` when the archive has no such entry.
    pub fn by_name(&mut self, name: &str) -> Result<Option<EntryReader<'_>>> {
        match self.index_of(name) {
            Some(index) => self.by_index(index).map(Some),
            None => Ok(None),
        }
    }
}

fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// 解码文件名或注释
///
/// 设置了 UTF-8 标志时按 UTF-8 解码（非法字节替换），否则按 CP437 解码，
/// 并保留原始字节以便重写时原样写回。
fn decode_text(bytes: Vec<u8>, utf8: bool) -> (String, Option<Vec<u8>>) {
    if utf8 || bytes.is_ascii() {
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        (text, None)
    } else {
        (decode_cp437(&bytes), Some(bytes))
    }
}

/// Decoded content of one entry.
///
/// The CRC32 and size recorded in the central directory are checked once the
/// stream reports EOF; a mismatch surfaces as an `InvalidData` read error.
pub struct EntryReader<'a> {
    entry: &'a ZipEntry,
    inner: Box<dyn Read + 'a>,
    hasher: crc32fast::Hasher,
    bytes_read: u64,
    verified: bool,
}

impl EntryReader<'_> {
    pub fn entry(&self) -> &ZipEntry {
        self.entry
    }

    fn verify(&self) -> io::Result<()> {
        if self.bytes_read != self.entry.uncompressed_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                ZipError::corrupt_entry(
                    self.entry.name.clone(),
                    format!(
                        "expected {} bytes, got {}",
                        self.entry.uncompressed_size, self.bytes_read
                    ),
                ),
            ));
        }

        let actual = self.hasher.clone().finalize();
        if actual != self.entry.crc32 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                ZipError::Crc32Mismatch {
                    name: self.entry.name.clone(),
                    expected: self.entry.crc32,
                    actual,
                },
            ));
        }
        Ok(())
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        } else if !buf.is_empty() && !self.verified {
            self.verified = true;
            self.verify()?;
        }
        Ok(n)
    }
}
