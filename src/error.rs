//! Error types for weightblob
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::dtype::DataType;

/// Result type alias using BlobError
pub type Result<T> = std::result::Result<T, BlobError>;

/// Unified error type for weightblob operations
#[derive(Debug, Error)]
pub enum BlobError {
    // -------------------------------------------------------------------------
    // Resource Errors
    // -------------------------------------------------------------------------
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Access denied: {0}")]
    FileAccessDenied(PathBuf),

    #[error("File is empty: {0}")]
    FileEmpty(PathBuf),

    #[error("File already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Truncated header: file has {actual} bytes, header needs {expected}")]
    TruncatedHeader { expected: u64, actual: u64 },

    #[error("Truncated metadata at offset {offset}")]
    TruncatedMetadata { offset: u64 },

    #[error("Truncated data at offset {offset}: record needs {needed} bytes, {available} available")]
    TruncatedData {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("Corrupt metadata at offset {offset}: {reason}")]
    CorruptMetadata { offset: u64, reason: String },

    #[error("Checksum mismatch at offset {offset}: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch {
        offset: u64,
        expected: u32,
        actual: u32,
    },

    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Storage handle is not open")]
    NotOpen,

    #[error("No record starts at offset {0}")]
    OffsetNotFound(u64),

    #[error("Offset out of range: offset={offset}, length={length}, limit={limit}")]
    OffsetOutOfRange { offset: u64, length: u64, limit: u64 },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: DataType, found: DataType },

    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("Invalid slice bounds [{lower}, {upper}) for dimension of size {size}")]
    InvalidSliceBounds {
        lower: usize,
        upper: usize,
        size: usize,
    },

    #[error("Invalid dimension {dim} for span of rank {rank}")]
    InvalidDimension { dim: usize, rank: usize },

    #[error("Cannot iterate a span of rank 0")]
    NotIterable,

    #[error("Incompatible cast: {0}")]
    IncompatibleCast(String),

    #[error("Blob file is encrypted; typed views are not available")]
    Encrypted,
}

impl BlobError {
    /// Missing, unreadable, empty or occupied files, and raw OS failures
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::FileAccessDenied(_)
                | Self::FileEmpty(_)
                | Self::AlreadyExists(_)
                | Self::Io(_)
        )
    }

    /// The file is damaged or not a blob file
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidHeader(_)
                | Self::TruncatedHeader { .. }
                | Self::TruncatedMetadata { .. }
                | Self::TruncatedData { .. }
                | Self::CorruptMetadata { .. }
                | Self::ChecksumMismatch { .. }
                | Self::Codec(_)
        )
    }

    /// The file is truncated somewhere (header, metadata or payload)
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::TruncatedMetadata { .. } | Self::TruncatedData { .. }
        )
    }

    /// The caller violated a precondition
    pub fn is_usage_error(&self) -> bool {
        !self.is_resource_error() && !self.is_format_error()
    }
}

impl From<bincode::Error> for BlobError {
    fn from(err: bincode::Error) -> Self {
        BlobError::Codec(err.to_string())
    }
}
