//! Error types for zip-util
//!
//! This module defines all error types that can occur during archive operations.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;
use thiserror::Error;

/// Coarse error category, used by callers that only care about the class of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipErrorKind {
    /// Requested entry is absent from the archive
    NotFound,
    /// Underlying read/write/open failure
    Io,
    /// Entry bytes are not valid UTF-8
    Encoding,
    /// Archive or entry structure is broken
    Corrupt,
    /// Valid zip feature this crate does not handle
    Unsupported,
    /// Entry name would escape the extraction directory
    UnsafePath,
}

/// Main error type for zip-util
#[derive(Error, Debug)]
pub enum ZipError {
    /// File open failed
    #[error("cannot open file '{path}': {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Open for writing failed
    #[error("cannot open file '{path}' for writing: {source}")]
    OpenWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory creation failed
    #[error("cannot create directory '{path}': {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Rewrite target is the archive being read
    #[error("cannot rewrite '{path}' in place: output is the input archive")]
    SameFile { path: PathBuf },

    /// Entry not found in archive
    #[error("entry '{name}' not found in archive '{archive}'")]
    EntryNotFound { name: String, archive: PathBuf },

    /// Corrupt archive
    #[error("corrupt ZIP archive: {reason}")]
    CorruptArchive { reason: String },

    /// Corrupt entry in archive
    #[error("corrupt ZIP entry '{name}': {reason}")]
    CorruptEntry { name: String, reason: String },

    /// Unsupported compression method
    #[error("unsupported compression method {method} for entry '{name}'")]
    UnsupportedCompression { name: String, method: u16 },

    /// Zip64, multi-disk and similar
    #[error("unsupported ZIP feature: {0}")]
    Unsupported(String),

    /// CRC32 mismatch
    #[error("CRC32 mismatch for entry '{name}': expected 0x{expected:08x}, got 0x{actual:08x}")]
    Crc32Mismatch {
        name: String,
        expected: u32,
        actual: u32,
    },

    /// Path error
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Entry is not valid UTF-8
    #[error("entry '{name}' in archive '{archive}' is not valid UTF-8: {source}")]
    Encoding {
        name: String,
        archive: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    /// IO error with context
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ZipError {
    pub fn kind(&self) -> ZipErrorKind {
        match self {
            ZipError::FileOpen { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ZipErrorKind::NotFound
            }
            ZipError::FileOpen { .. } => ZipErrorKind::Io,
            ZipError::OpenWriteFailed { .. } => ZipErrorKind::Io,
            ZipError::CreateDirFailed { .. } => ZipErrorKind::Io,
            ZipError::SameFile { .. } => ZipErrorKind::Io,
            ZipError::EntryNotFound { .. } => ZipErrorKind::NotFound,
            ZipError::CorruptArchive { .. } => ZipErrorKind::Corrupt,
            ZipError::CorruptEntry { .. } => ZipErrorKind::Corrupt,
            ZipError::Crc32Mismatch { .. } => ZipErrorKind::Corrupt,
            ZipError::UnsupportedCompression { .. } => ZipErrorKind::Unsupported,
            ZipError::Unsupported(_) => ZipErrorKind::Unsupported,
            ZipError::InvalidPath { .. } => ZipErrorKind::UnsafePath,
            ZipError::Encoding { .. } => ZipErrorKind::Encoding,
            ZipError::Io(_) => ZipErrorKind::Io,
        }
    }

    /// Create a file open error
    pub fn file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ZipError::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Create an open-for-write error
    pub fn open_write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ZipError::OpenWriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a directory creation error
    pub fn create_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ZipError::CreateDirFailed {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt archive error
    pub fn corrupt_archive(reason: impl Into<String>) -> Self {
        ZipError::CorruptArchive {
            reason: reason.into(),
        }
    }

    /// Create a corrupt entry error
    pub fn corrupt_entry(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ZipError::CorruptEntry {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ZipError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for zip-util operations
pub type Result<T> = std::result::Result<T, ZipError>;

/// Compression level (0-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    NoCompression = 0,
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    #[default]
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    Level9 = 9,
}

impl CompressionLevel {
    /// Highest level deflate offers
    pub const MAX: CompressionLevel = CompressionLevel::Level9;

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
