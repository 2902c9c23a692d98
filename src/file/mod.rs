//! Raw File Access
//!
//! Offset-addressed primitives underneath the storage reader and writer.
//!
//! ## Responsibilities
//! - Classify open failures (missing / unreadable / empty)
//! - Read-only memory mapping of a whole file
//! - Alignment-checked positional writes and padded appends
//! - Fixed-size block decoding at arbitrary offsets

mod file_writer;
mod mapped_file;

use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{BlobError, Result};

pub use file_writer::FileWriter;
pub use mapped_file::MappedFile;

/// A block with a fixed on-disk size (headers, metadata)
pub trait FixedBlock: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes
    fn decode(bytes: &[u8]) -> Result<Self>;

    /// Encode to exactly `SIZE` bytes
    fn encode(&self) -> Result<Vec<u8>>;
}

/// Open a file for reading
///
/// Returns the file and its length. An empty file is reported as
/// `FileEmpty`, distinct from a missing one.
pub fn open_for_read(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).map_err(|e| classify_open_error(e, path))?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Err(BlobError::FileEmpty(path.to_path_buf()));
    }
    Ok((file, len))
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Map an OS error from opening `path` onto the resource error taxonomy
pub(crate) fn classify_open_error(err: io::Error, path: &Path) -> BlobError {
    match err.kind() {
        io::ErrorKind::NotFound => BlobError::FileNotFound(path.to_path_buf()),
        io::ErrorKind::PermissionDenied => BlobError::FileAccessDenied(path.to_path_buf()),
        io::ErrorKind::AlreadyExists => BlobError::AlreadyExists(path.to_path_buf()),
        _ => BlobError::Io(err),
    }
}

/// Bounds check shared by both file types
pub(crate) fn check_range(offset: u64, length: u64, limit: u64) -> Result<()> {
    match offset.checked_add(length) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(BlobError::OffsetOutOfRange {
            offset,
            length,
            limit,
        }),
    }
}
