//! Read-only memory-mapped file

use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::debug;

use crate::error::Result;

use super::{check_range, open_for_read, FixedBlock};

/// Read-only mapping of a whole file
///
/// The mapping is pointer-stable for the life of this value. Slices handed
/// out by `read_at` borrow it, so they cannot outlive the mapping.
#[derive(Debug)]
pub struct MappedFile {
    path: PathBuf,
    mmap: Mmap,
}

impl MappedFile {
    /// Open and map `path`
    ///
    /// Fails with `FileNotFound`, `FileAccessDenied` or `FileEmpty`.
    pub fn open(path: &Path) -> Result<Self> {
        let (file, len) = open_for_read(path)?;

        // SAFETY: the mapping is read-only. Blob files are append-only and
        // callers serialize writers against readers of the same file, so the
        // mapped range is not truncated underneath us.
        let mmap = unsafe { MmapOptions::new().map(&file)? };

        debug!(path = %path.display(), len, "Mapped file");

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    /// Mapped length in bytes
    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Always false for a successfully opened file
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The whole mapping
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// Borrow `length` bytes starting at `offset`
    pub fn read_at(&self, offset: u64, length: u64) -> Result<&[u8]> {
        check_range(offset, length, self.len())?;
        let start = offset as usize;
        Ok(&self.mmap[start..start + length as usize])
    }

    /// Decode a fixed-size block starting at `offset`
    pub fn read_struct<T: FixedBlock>(&self, offset: u64) -> Result<T> {
        let bytes = self.read_at(offset, T::SIZE as u64)?;
        T::decode(bytes)
    }
}
