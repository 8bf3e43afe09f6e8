//! ZIP 文件格式常量与记录编解码
//!
//! 只处理经典（非 zip64）格式的三种记录：本地文件头、中央目录头、EOCD。

use crate::entry::DosDateTime;
use crate::error::{Result, ZipError};

// 签名
pub const LOCAL_FILE_HEADER_SIG: u32 = 0x04034b50;
pub const CENTRAL_DIR_HEADER_SIG: u32 = 0x02014b50;
pub const END_OF_CENTRAL_DIR_SIG: u32 = 0x06054b50;
pub const ZIP64_EOCD_LOCATOR_SIG: u32 = 0x07064b50;
pub const DATA_DESCRIPTOR_SIG: u32 = 0x08074b50;

// 头大小
pub const LOCAL_FILE_HEADER_SIZE: usize = 30;
pub const CENTRAL_DIR_HEADER_SIZE: usize = 46;
pub const END_OF_CENTRAL_DIR_SIZE: usize = 22;
pub const ZIP64_EOCD_LOCATOR_SIZE: usize = 20;
pub const DATA_DESCRIPTOR_SIZE: usize = 16;

/// EOCD 最大搜索长度（最大注释长度 + 记录大小）
pub const MAX_EOCD_SEARCH_LEN: u64 = 65535 + END_OF_CENTRAL_DIR_SIZE as u64;

// 版本
pub const VERSION_NEEDED: u16 = 20; // 2.0（兼容大多数工具）
pub const VERSION_MADE_BY: u16 = 0x0317; // Unix (3) + 2.3 (23)

// 通用标志位
pub const FLAG_ENCRYPTED: u16 = 1 << 0;
pub const FLAG_DATA_DESCRIPTOR: u16 = 1 << 3;
pub const FLAG_UTF8: u16 = 1 << 11;

// DOS 目录属性标志
pub const DOS_DIR_ATTR: u32 = 0x10;

// zip64 占位值
pub const ZIP64_MARKER_U16: u16 = 0xFFFF;
pub const ZIP64_MARKER_U32: u32 = 0xFFFF_FFFF;

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Local file header, fixed 30-byte part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
}

impl LocalFileHeader {
    pub fn parse(buf: &[u8; LOCAL_FILE_HEADER_SIZE]) -> Result<Self> {
        let sig = le_u32(buf, 0);
        if sig != LOCAL_FILE_HEADER_SIG {
            return Err(ZipError::corrupt_archive(format!(
                "invalid local header signature: 0x{:08x}",
                sig
            )));
        }

        Ok(LocalFileHeader {
            version_needed: le_u16(buf, 4),
            flags: le_u16(buf, 6),
            method: le_u16(buf, 8),
            modified: DosDateTime::from_raw(le_u16(buf, 10), le_u16(buf, 12)),
            crc32: le_u32(buf, 14),
            compressed_size: le_u32(buf, 18),
            uncompressed_size: le_u32(buf, 22),
            name_len: le_u16(buf, 26),
            extra_len: le_u16(buf, 28),
        })
    }

    pub fn to_bytes(&self) -> [u8; LOCAL_FILE_HEADER_SIZE] {
        let mut buf = [0u8; LOCAL_FILE_HEADER_SIZE];
        put_u32(&mut buf, 0, LOCAL_FILE_HEADER_SIG);
        put_u16(&mut buf, 4, self.version_needed);
        put_u16(&mut buf, 6, self.flags);
        put_u16(&mut buf, 8, self.method);
        put_u16(&mut buf, 10, self.modified.time);
        put_u16(&mut buf, 12, self.modified.date);
        put_u32(&mut buf, 14, self.crc32);
        put_u32(&mut buf, 18, self.compressed_size);
        put_u32(&mut buf, 22, self.uncompressed_size);
        put_u16(&mut buf, 26, self.name_len);
        put_u16(&mut buf, 28, self.extra_len);
        buf
    }

    /// Bytes between the fixed header and the entry data
    pub fn variable_len(&self) -> u64 {
        self.name_len as u64 + self.extra_len as u64
    }
}

/// Central directory file header, fixed 46-byte part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub modified: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub name_len: u16,
    pub extra_len: u16,
    pub comment_len: u16,
    pub disk_number_start: u16,
    pub internal_attr: u16,
    pub external_attr: u32,
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    pub fn parse(buf: &[u8; CENTRAL_DIR_HEADER_SIZE]) -> Result<Self> {
        let sig = le_u32(buf, 0);
        if sig != CENTRAL_DIR_HEADER_SIG {
            return Err(ZipError::corrupt_archive(format!(
                "invalid central directory header signature: 0x{:08x}",
                sig
            )));
        }

        Ok(CentralDirectoryHeader {
            version_made_by: le_u16(buf, 4),
            version_needed: le_u16(buf, 6),
            flags: le_u16(buf, 8),
            method: le_u16(buf, 10),
            modified: DosDateTime::from_raw(le_u16(buf, 12), le_u16(buf, 14)),
            crc32: le_u32(buf, 16),
            compressed_size: le_u32(buf, 20),
            uncompressed_size: le_u32(buf, 24),
            name_len: le_u16(buf, 28),
            extra_len: le_u16(buf, 30),
            comment_len: le_u16(buf, 32),
            disk_number_start: le_u16(buf, 34),
            internal_attr: le_u16(buf, 36),
            external_attr: le_u32(buf, 38),
            local_header_offset: le_u32(buf, 42),
        })
    }

    pub fn to_bytes(&self) -> [u8; CENTRAL_DIR_HEADER_SIZE] {
        let mut buf = [0u8; CENTRAL_DIR_HEADER_SIZE];
        put_u32(&mut buf, 0, CENTRAL_DIR_HEADER_SIG);
        put_u16(&mut buf, 4, self.version_made_by);
        put_u16(&mut buf, 6, self.version_needed);
        put_u16(&mut buf, 8, self.flags);
        put_u16(&mut buf, 10, self.method);
        put_u16(&mut buf, 12, self.modified.time);
        put_u16(&mut buf, 14, self.modified.date);
        put_u32(&mut buf, 16, self.crc32);
        put_u32(&mut buf, 20, self.compressed_size);
        put_u32(&mut buf, 24, self.uncompressed_size);
        put_u16(&mut buf, 28, self.name_len);
        put_u16(&mut buf, 30, self.extra_len);
        put_u16(&mut buf, 32, self.comment_len);
        put_u16(&mut buf, 34, self.disk_number_start);
        put_u16(&mut buf, 36, self.internal_attr);
        put_u32(&mut buf, 38, self.external_attr);
        put_u32(&mut buf, 42, self.local_header_offset);
        buf
    }

    /// Any size or offset field holding the zip64 placeholder
    pub fn needs_zip64(&self) -> bool {
        self.compressed_size == ZIP64_MARKER_U32
            || self.uncompressed_size == ZIP64_MARKER_U32
            || self.local_header_offset == ZIP64_MARKER_U32
            || self.disk_number_start == ZIP64_MARKER_U16
    }
}

/// End of central directory record, without the trailing archive comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub central_dir_disk: u16,
    pub entries_this_disk: u16,
    pub total_entries: u16,
    pub central_dir_size: u32,
    pub central_dir_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < END_OF_CENTRAL_DIR_SIZE || le_u32(buf, 0) != END_OF_CENTRAL_DIR_SIG {
            return Err(ZipError::corrupt_archive("invalid end of central directory record"));
        }

        Ok(EndOfCentralDirectory {
            disk_number: le_u16(buf, 4),
            central_dir_disk: le_u16(buf, 6),
            entries_this_disk: le_u16(buf, 8),
            total_entries: le_u16(buf, 10),
            central_dir_size: le_u32(buf, 12),
            central_dir_offset: le_u32(buf, 16),
            comment_len: le_u16(buf, 20),
        })
    }

    pub fn to_bytes(&self) -> [u8; END_OF_CENTRAL_DIR_SIZE] {
        let mut buf = [0u8; END_OF_CENTRAL_DIR_SIZE];
        put_u32(&mut buf, 0, END_OF_CENTRAL_DIR_SIG);
        put_u16(&mut buf, 4, self.disk_number);
        put_u16(&mut buf, 6, self.central_dir_disk);
        put_u16(&mut buf, 8, self.entries_this_disk);
        put_u16(&mut buf, 10, self.total_entries);
        put_u32(&mut buf, 12, self.central_dir_size);
        put_u32(&mut buf, 16, self.central_dir_offset);
        put_u16(&mut buf, 20, self.comment_len);
        buf
    }

    pub fn needs_zip64(&self) -> bool {
        self.total_entries == ZIP64_MARKER_U16
            || self.central_dir_size == ZIP64_MARKER_U32
            || self.central_dir_offset == ZIP64_MARKER_U32
    }
}

/// Data descriptor following entry data when the local header carries no sizes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub fn to_bytes(&self) -> [u8; DATA_DESCRIPTOR_SIZE] {
        let mut buf = [0u8; DATA_DESCRIPTOR_SIZE];
        put_u32(&mut buf, 0, DATA_DESCRIPTOR_SIG);
        put_u32(&mut buf, 4, self.crc32);
        put_u32(&mut buf, 8, self.compressed_size);
        put_u32(&mut buf, 12, self.uncompressed_size);
        buf
    }
}

/// IBM 代码页 437 的 0x80..=0xFF 部分
///
/// 未设置 UTF-8 标志（bit 11）的文件名和注释按此编码解释。
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

pub fn decode_cp437(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// Finds the offset of the EOCD record inside `tail`, scanning backwards.
///
/// The candidate closest to the end wins, since the signature bytes may also
/// appear inside entry data or the archive comment.
pub fn find_eocd(tail: &[u8]) -> Option<usize> {
    if tail.len() < END_OF_CENTRAL_DIR_SIZE {
        return None;
    }
    let sig = END_OF_CENTRAL_DIR_SIG.to_le_bytes();
    (0..=tail.len() - END_OF_CENTRAL_DIR_SIZE)
        .rev()
        .find(|&i| tail[i..i + 4] == sig)
}
