//! Positional file writer
//!
//! Writes land at alignment-unit boundaries; appends are zero-padded so the
//! data starts on the next boundary.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{BlobError, Result};

use super::{align_up, check_range, classify_open_error, FixedBlock};

/// Read/write handle with alignment-aware positional writes
pub struct FileWriter {
    path: PathBuf,
    file: File,
    /// Current file extent
    len: u64,
    /// Alignment unit in bytes (power of two)
    alignment: u64,
}

impl FileWriter {
    /// Create a new file
    ///
    /// Fails with `AlreadyExists` if `path` is occupied and `truncate` is false.
    pub fn create(path: &Path, truncate: bool, alignment: u64) -> Result<Self> {
        debug_assert!(alignment.is_power_of_two());

        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if truncate {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let file = options.open(path).map_err(|e| classify_open_error(e, path))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: 0,
            alignment,
        })
    }

    /// Open an existing file for reading and writing
    pub fn open_existing(path: &Path, alignment: u64) -> Result<Self> {
        debug_assert!(alignment.is_power_of_two());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| classify_open_error(e, path))?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len,
            alignment,
        })
    }

    /// Current file length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read `length` bytes at `offset`
    pub fn read_at(&mut self, offset: u64, length: u64) -> Result<Vec<u8>> {
        check_range(offset, length, self.len)?;
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = vec![0u8; length as usize];
        self.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Decode a fixed-size block at `offset`
    pub fn read_struct<T: FixedBlock>(&mut self, offset: u64) -> Result<T> {
        let bytes = self.read_at(offset, T::SIZE as u64)?;
        T::decode(&bytes)
    }

    /// Write `bytes` at an aligned `offset`
    ///
    /// Writing past the end extends the file; any gap reads back as zeros.
    pub fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        if offset % self.alignment != 0 {
            return Err(BlobError::OffsetOutOfRange {
                offset,
                length: bytes.len() as u64,
                limit: self.len,
            });
        }

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.len = self.len.max(offset + bytes.len() as u64);

        trace!(offset, len = bytes.len(), "write_at");
        Ok(())
    }

    /// Append `bytes` at the next alignment boundary
    ///
    /// Zero padding fills the gap from the current end. Returns the offset
    /// the bytes were written at.
    pub fn write_aligned(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = align_up(self.len, self.alignment);
        let padding = (offset - self.len) as usize;

        // Zero-fill up to the boundary, then the data
        self.file.seek(SeekFrom::Start(self.len))?;
        if padding > 0 {
            self.file.write_all(&vec![0u8; padding])?;
        }
        self.file.write_all(bytes)?;
        self.len = offset + bytes.len() as u64;

        trace!(offset, padding, len = bytes.len(), "write_aligned");
        Ok(offset)
    }

    /// Append `bytes` directly at the current end, without padding
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.len;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.len += bytes.len() as u64;
        Ok(offset)
    }

    /// Cut the file to `len` bytes; everything after is discarded
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.len = len;

        trace!(len, "truncate");
        Ok(())
    }

    /// Flush OS buffers to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}
