//! Storage Writer
//!
//! Appends records to a blob file.
//!
//! ## Write Order (per record)
//! 1. Pad to the next alignment boundary
//! 2. Metadata block
//! 3. Payload (starts right after the block, so it is aligned too)
//! 4. Header with the new record count
//!
//! With `SyncStrategy::EveryRecord` steps 1-3 are synced before the header
//! is written, and the header is synced after. A crash before step 4 leaves
//! a record the header does not count, which the reader rejects on open.
//! A failed write is rolled back: the file is cut to its previous length and
//! the previous header restored. If that fails too, the writer closes.

use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};

use crate::config::{Config, SyncStrategy};
use crate::dtype::DataType;
use crate::error::{BlobError, Result};
use crate::file::{align_up, FileWriter, FixedBlock, MappedFile};
use crate::span::{pack, Element, Span};

use super::format::{scan, BlobHeader, MetadataBlock, RecordMetadata, ALIGNMENT, METADATA_SIZE};

/// Append-only writer for a blob file
pub struct StorageWriter {
    path: PathBuf,
    sync_strategy: SyncStrategy,
    /// `None` once finalized
    file: Option<FileWriter>,
    header: BlobHeader,
}

impl StorageWriter {
    /// Create a new blob file holding just a header
    ///
    /// Fails with `AlreadyExists` if `path` exists, unless
    /// `config.truncate_existing` is set.
    pub fn create(path: &Path, config: &Config) -> Result<Self> {
        let mut file = FileWriter::create(path, config.truncate_existing, ALIGNMENT)?;

        let header = BlobHeader::new(config.encrypted);
        file.write_at(0, &header.encode()?)?;

        let mut writer = Self {
            path: path.to_path_buf(),
            sync_strategy: config.sync_strategy,
            file: Some(file),
            header,
        };
        writer.sync_record()?;

        info!(path = %path.display(), encrypted = config.encrypted, "Created blob file");
        Ok(writer)
    }

    /// Reopen an existing blob file to add records after the last one
    ///
    /// The file is fully validated first; any format error is returned.
    pub fn append(path: &Path, config: &Config) -> Result<Self> {
        let header = {
            let mapped = MappedFile::open(path)?;
            scan(&mapped)?.0
        };

        let file = FileWriter::open_existing(path, ALIGNMENT)?;

        info!(
            path = %path.display(),
            records = header.record_count,
            len = file.len(),
            "Opened blob file for append"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sync_strategy: config.sync_strategy,
            file: Some(file),
            header,
        })
    }

    fn file(&mut self) -> Result<&mut FileWriter> {
        self.file.as_mut().ok_or(BlobError::NotOpen)
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record_count(&self) -> Result<u64> {
        if !self.is_open() {
            return Err(BlobError::NotOpen);
        }
        Ok(self.header.record_count)
    }

    pub fn is_encrypted(&self) -> Result<bool> {
        if !self.is_open() {
            return Err(BlobError::NotOpen);
        }
        Ok(self.header.is_encrypted())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Append one record and return its payload offset
    ///
    /// The span may have any shape or strides; it is written in row-major
    /// order and stored as a flat record.
    ///
    /// # Errors
    /// - `TypeMismatch` if `T` is not `element_type`
    /// - `SizeMismatch` if the span does not hold `element_count` elements
    pub fn write_record<T: Element>(
        &mut self,
        element_type: DataType,
        element_count: u64,
        span: &Span<'_, T>,
    ) -> Result<u64> {
        // Validate arguments
        if T::DATA_TYPE != element_type {
            return Err(BlobError::TypeMismatch {
                expected: element_type,
                found: T::DATA_TYPE,
            });
        }
        if span.len() as u64 != element_count {
            return Err(BlobError::SizeMismatch {
                expected: element_count,
                actual: span.len() as u64,
            });
        }

        // Borrow dense payloads, pack strided or sub-byte-offset ones
        let packed;
        let payload = match span.contiguous_bytes() {
            Some(bytes) => bytes,
            None => {
                packed = span.to_bytes();
                &packed[..]
            }
        };

        // Place the record after the current end
        let start_len = self.file()?.len();
        let block_offset = align_up(start_len, ALIGNMENT);
        let record = RecordMetadata {
            data_type: element_type,
            element_count,
            offset: block_offset + METADATA_SIZE,
            byte_length: payload.len() as u64,
            payload_crc: crc32fast::hash(payload),
        };

        if let Err(err) = self.commit_record(&record, payload) {
            self.rollback(start_len);
            return Err(err);
        }

        trace!(
            offset = record.offset,
            data_type = %element_type,
            elements = element_count,
            bytes = record.byte_length,
            "Wrote record"
        );
        Ok(record.offset)
    }

    /// Append `values` as a flat record
    pub fn write_values<T: Element>(&mut self, values: &[T]) -> Result<u64> {
        let packed = pack(values);
        let span = Span::<T>::new(&packed, &[values.len()])?;
        self.write_record(T::DATA_TYPE, values.len() as u64, &span)
    }

    /// Block, payload, then the header that counts them
    fn commit_record(&mut self, record: &RecordMetadata, payload: &[u8]) -> Result<()> {
        let block = MetadataBlock::from_record(record).encode()?;
        let mut header = self.header;
        header.record_count += 1;
        let header_bytes = header.encode()?;

        let file = self.file()?;
        let written_at = file.write_aligned(&block)?;
        debug_assert_eq!(written_at, record.block_offset());
        file.append(payload)?;

        // Record durable before the header counts it
        self.sync_record()?;
        self.file()?.write_at(0, &header_bytes)?;
        self.sync_record()?;

        self.header = header;
        Ok(())
    }

    /// Cut the file back to `len` and rewrite the last committed header
    ///
    /// Closes the writer if the file cannot be restored.
    fn rollback(&mut self, len: u64) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let restored = self.header.encode().and_then(|header| {
            file.truncate(len)?;
            file.write_at(0, &header)
        });

        match restored {
            Ok(()) => debug!(path = %self.path.display(), len, "Rolled back partial record"),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to roll back partial record; closing writer"
                );
                self.file = None;
            }
        }
    }

    fn sync_record(&mut self) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryRecord {
            self.file()?.sync()?;
        }
        Ok(())
    }

    /// Flush and sync; later calls fail with `NotOpen`
    pub fn finalize(&mut self) -> Result<()> {
        let mut file = self.file.take().ok_or(BlobError::NotOpen)?;
        file.sync()?;

        info!(
            path = %self.path.display(),
            records = self.header.record_count,
            len = file.len(),
            "Finalized blob file"
        );
        Ok(())
    }
}

impl Drop for StorageWriter {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.sync() {
                warn!(path = %self.path.display(), error = %e, "Failed to sync blob file on drop");
            }
        }
    }
}

impl std::fmt::Debug for StorageWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageWriter")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("records", &self.header.record_count)
            .finish()
    }
}
