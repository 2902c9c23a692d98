//! Storage Reader
//!
//! Maps a blob file, validates every record once on open, and hands out
//! zero-copy Spans over the mapped payloads.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dtype::DataType;
use crate::error::{BlobError, Result};
use crate::file::MappedFile;
use crate::span::{AnySpan, Element, Span};

use super::format::{scan, BlobHeader, RecordMetadata};

/// State held while the reader is open
struct OpenState {
    file: MappedFile,
    header: BlobHeader,
    /// payload offset → record
    index: BTreeMap<u64, RecordMetadata>,
}

/// Read-only access to the records of a blob file
///
/// Spans borrow the reader, so they cannot outlive it or a call to `close`.
pub struct StorageReader {
    path: PathBuf,
    state: Option<OpenState>,
}

impl StorageReader {
    /// Open and validate a blob file with the default configuration
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, &Config::default())
    }

    /// Open and validate a blob file
    ///
    /// With `verify_checksums` set, every payload CRC is checked as well.
    pub fn open_with_config(path: &Path, config: &Config) -> Result<Self> {
        // Map the whole file
        let file = MappedFile::open(path)?;

        // Validate header and every record block, in file order
        let (header, records) = scan(&file).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "Rejected blob file");
        })?;

        // Build the in-memory index (payload offset -> metadata)
        let index = records.into_iter().map(|r| (r.offset, r)).collect();

        let reader = Self {
            path: path.to_path_buf(),
            state: Some(OpenState {
                file,
                header,
                index,
            }),
        };

        // Optional full payload check
        if config.verify_checksums {
            reader.verify()?;
        }

        info!(
            path = %path.display(),
            records = header.record_count,
            encrypted = header.is_encrypted(),
            "Opened blob file"
        );

        Ok(reader)
    }

    fn state(&self) -> Result<&OpenState> {
        self.state.as_ref().ok_or(BlobError::NotOpen)
    }

    fn record(&self, offset: u64) -> Result<&RecordMetadata> {
        self.state()?
            .index
            .get(&offset)
            .ok_or(BlobError::OffsetNotFound(offset))
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Release the mapping; later queries fail with `NotOpen`
    pub fn close(&mut self) {
        if self.state.take().is_some() {
            debug!(path = %self.path.display(), "Closed blob file");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // File Properties
    // =========================================================================

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.state()?.index.len())
    }

    pub fn is_encrypted(&self) -> Result<bool> {
        Ok(self.state()?.header.is_encrypted())
    }

    /// Format version from the header
    pub fn version(&self) -> Result<u32> {
        Ok(self.state()?.header.version)
    }

    /// Mapped file length in bytes
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.state()?.file.len())
    }

    /// Payload offsets of every record, in file order
    pub fn offsets(&self) -> Result<Vec<u64>> {
        Ok(self.state()?.index.keys().copied().collect())
    }

    /// Every record, in file order
    pub fn records(&self) -> Result<Vec<RecordMetadata>> {
        Ok(self.state()?.index.values().copied().collect())
    }

    pub fn metadata(&self, offset: u64) -> Result<RecordMetadata> {
        self.record(offset).copied()
    }

    pub fn data_type(&self, offset: u64) -> Result<DataType> {
        Ok(self.record(offset)?.data_type)
    }

    // =========================================================================
    // Payload Access
    // =========================================================================

    /// Payload bytes as stored, encrypted or not
    pub fn raw_bytes(&self, offset: u64) -> Result<&[u8]> {
        let record = self.record(offset)?;
        self.state()?
            .file
            .read_at(record.offset, record.byte_length)
    }

    /// Payload and element count of a record that may be viewed as typed data
    fn typed_payload(&self, offset: u64, requested: DataType) -> Result<(&[u8], usize)> {
        let record = *self.record(offset)?;

        if self.state()?.header.is_encrypted() {
            return Err(BlobError::Encrypted);
        }
        if record.data_type != requested {
            return Err(BlobError::TypeMismatch {
                expected: requested,
                found: record.data_type,
            });
        }

        let count = usize::try_from(record.element_count).map_err(|_| {
            BlobError::CorruptMetadata {
                offset: record.block_offset(),
                reason: format!("{} elements do not fit in memory", record.element_count),
            }
        })?;

        Ok((self.raw_bytes(offset)?, count))
    }

    /// One-dimensional typed view of the record starting at `offset`
    ///
    /// # Errors
    /// - `OffsetNotFound` if no record starts at `offset`
    /// - `TypeMismatch` if `T` is not the stored element type
    /// - `Encrypted` if the file is flagged encrypted
    pub fn view_at<T: Element>(&self, offset: u64) -> Result<Span<'_, T>> {
        let (bytes, count) = self.typed_payload(offset, T::DATA_TYPE)?;
        Span::new(bytes, &[count])
    }

    /// Like `view_at`, for an element type only known at run time
    pub fn view_any(&self, offset: u64, expected: DataType) -> Result<AnySpan<'_>> {
        let (bytes, count) = self.typed_payload(offset, expected)?;
        AnySpan::new(expected, bytes, &[count])
    }

    /// View a record as whatever type it stores
    pub fn view_dyn(&self, offset: u64) -> Result<AnySpan<'_>> {
        let stored = self.data_type(offset)?;
        self.view_any(offset, stored)
    }

    // =========================================================================
    // Checksums
    // =========================================================================

    /// Compare one payload against its stored CRC-32
    pub fn verify_record(&self, offset: u64) -> Result<()> {
        let expected = self.record(offset)?.payload_crc;
        let actual = crc32fast::hash(self.raw_bytes(offset)?);

        if actual != expected {
            warn!(offset, expected, actual, "Payload checksum mismatch");
            return Err(BlobError::ChecksumMismatch {
                offset,
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify every payload checksum, stopping at the first mismatch
    pub fn verify(&self) -> Result<()> {
        for offset in self.state()?.index.keys() {
            self.verify_record(*offset)?;
        }
        debug!(path = %self.path.display(), "Verified payload checksums");
        Ok(())
    }
}

impl std::fmt::Debug for StorageReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageReader")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
