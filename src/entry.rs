//! ZIP 条目元数据
//!
//! `ZipEntry` 是一个纯值类型：读取时从中央目录构造，写入时原样写回。
//! 替换内容时通过 [`ZipEntry::with_new_content`] 复制一份新值，而不是逐字段修改。

use crate::zip::format::{DOS_DIR_ATTR, VERSION_MADE_BY};
use std::time::SystemTime;
use time::{OffsetDateTime, UtcOffset};

/// Compression method of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    /// 0 = 无压缩
    Stored,
    /// 8 = DEFLATE
    Deflated,
    /// 其他方法（bzip2、lzma 等），只保留编号
    Other(u16),
}

impl CompressionMethod {
    pub fn from_u16(method: u16) -> Self {
        match method {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            other => CompressionMethod::Other(other),
        }
    }

    pub fn as_u16(self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
            CompressionMethod::Other(other) => other,
        }
    }
}

/// Modification time as stored in the archive (DOS format, 2 second resolution).
///
/// - 时间: HHHHHMMMMMMSSSSS (5+6+5 bits, 秒除以 2)
/// - 日期: YYYYYYYMMMMDDDDD (7+4+5 bits, 年份从 1980 开始)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    /// 1980-01-01 00:00:00, the earliest representable instant
    pub const MIN: DosDateTime = DosDateTime {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// 2107-12-31 23:59:58, the latest representable instant
    pub const MAX: DosDateTime = DosDateTime {
        time: (23 << 11) | (59 << 5) | 29,
        date: (127 << 9) | (12 << 5) | 31,
    };

    pub fn from_raw(time: u16, date: u16) -> Self {
        DosDateTime { time, date }
    }

    /// Converts to DOS format in UTC, clamping to the representable range.
    pub fn from_offset_datetime(datetime: OffsetDateTime) -> Self {
        let datetime = datetime.to_offset(UtcOffset::UTC);
        let year = datetime.year();
        if year < 1980 {
            return DosDateTime::MIN;
        }
        if year > 2107 {
            return DosDateTime::MAX;
        }

        let month = u8::from(datetime.month()) as u16;
        let day = datetime.day() as u16;
        let hour = datetime.hour() as u16;
        let minute = datetime.minute() as u16;
        let second = datetime.second() as u16;

        DosDateTime {
            time: (hour << 11) | (minute << 5) | (second >> 1),
            date: (((year - 1980) as u16) << 9) | (month << 5) | day,
        }
    }

    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_offset_datetime(OffsetDateTime::from(time))
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        DosDateTime::MIN
    }
}

/// ZIP entry metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// 条目名（UTF-8，`/` 分隔，目录以 `/` 结尾）
    pub name: String,
    /// 条目注释（只存在于中央目录）
    pub comment: String,
    /// 原始 extra field 字节
    pub extra: Vec<u8>,
    pub method: CompressionMethod,
    pub modified: DosDateTime,
    /// 外部属性（高 16 位为 Unix 权限，低 16 位为 DOS 属性）
    pub external_attr: u32,
    pub version_made_by: u16,
    pub crc32: u32,
    /// `None` means unknown; the writer always recomputes it
    pub compressed_size: Option<u64>,
    pub uncompressed_size: u64,
    /// 未设置 UTF-8 标志时文件名的原始字节（CP437 等旧编码），写回时原样保留
    pub(crate) raw_name: Option<Vec<u8>>,
    /// 同上，条目注释的原始字节
    pub(crate) raw_comment: Option<Vec<u8>>,
}

impl ZipEntry {
    /// Create a new entry stamped with the current time.
    ///
    /// Names ending in `/` become stored directory entries.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_dir = name.ends_with('/');
        ZipEntry {
            name,
            comment: String::new(),
            extra: Vec::new(),
            method: if is_dir {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            },
            modified: DosDateTime::now(),
            external_attr: if is_dir {
                (0o755 << 16) | DOS_DIR_ATTR
            } else {
                0o644 << 16
            },
            version_made_by: VERSION_MADE_BY,
            crc32: 0,
            compressed_size: None,
            uncompressed_size: 0,
            raw_name: None,
            raw_comment: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/') || (self.external_attr & DOS_DIR_ATTR) != 0
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the raw extra field
    pub fn with_extra(mut self, extra: impl Into<Vec<u8>>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Set the compression method
    pub fn with_method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the modification time
    pub fn with_modified(mut self, modified: DosDateTime) -> Self {
        self.modified = modified;
        self
    }

    /// Same metadata, content-derived fields reset for new content.
    pub fn with_new_content(&self) -> Self {
        ZipEntry {
            crc32: 0,
            compressed_size: None,
            uncompressed_size: 0,
            ..self.clone()
        }
    }
}
