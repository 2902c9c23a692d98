//! Blob file format
//!
//! Header and metadata blocks, and the sequential scan that validates a file.
//!
//! ## Header (64 bytes)
//! ```text
//!   Magic "WBLB" (4) | Version: u32 (4) | Flags: u32 (4) | Reserved (4)
//!   RecordCount: u64 (8) | Reserved (40)
//! ```
//!
//! ## Metadata block (64 bytes, aligned, payload follows immediately)
//! ```text
//!   Sentinel: u32 (4) | DataType: u32 (4) | ElementCount: u64 (8)
//!   Offset: u64 (8) | ByteLength: u64 (8) | PayloadCRC: u32 (4)
//!   MetadataCRC: u32 (4) | Reserved (24)
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dtype::DataType;
use crate::error::{BlobError, Result};
use crate::file::{align_up, FixedBlock, MappedFile};

/// Magic bytes identifying a blob file
pub const MAGIC: [u8; 4] = *b"WBLB";

/// Current format version
pub const VERSION: u32 = 1;

/// Every metadata block and payload starts on a multiple of this
pub const ALIGNMENT: u64 = 64;

pub const HEADER_SIZE: u64 = 64;

pub const METADATA_SIZE: u64 = 64;

/// First word of every metadata block
pub const METADATA_SENTINEL: u32 = 0x424C_4F42;

/// Header flag bit: payloads are encrypted
pub const FLAG_ENCRYPTED: u32 = 1;

/// The first `T::SIZE` bytes of `bytes`
fn block_bytes<T: FixedBlock>(bytes: &[u8]) -> Result<&[u8]> {
    bytes.get(..T::SIZE).ok_or_else(|| {
        BlobError::Codec(format!("need {} bytes, got {}", T::SIZE, bytes.len()))
    })
}

// =============================================================================
// Header
// =============================================================================

/// File header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub flags: u32,
    reserved0: u32,
    /// Records committed so far (updated after each payload write)
    pub record_count: u64,
    reserved: [u64; 5],
}

impl BlobHeader {
    pub fn new(encrypted: bool) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: if encrypted { FLAG_ENCRYPTED } else { 0 },
            reserved0: 0,
            record_count: 0,
            reserved: [0; 5],
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// Check magic and version
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(BlobError::InvalidHeader(format!(
                "bad magic {:?}, expected {:?}",
                self.magic, MAGIC
            )));
        }
        if self.version != VERSION {
            return Err(BlobError::InvalidHeader(format!(
                "unsupported version {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl FixedBlock for BlobHeader {
    const SIZE: usize = HEADER_SIZE as usize;

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(block_bytes::<Self>(bytes)?)?)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

// =============================================================================
// Record Metadata
// =============================================================================

/// Validated description of one stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMetadata {
    pub data_type: DataType,
    pub element_count: u64,
    /// Payload start (the record handle)
    pub offset: u64,
    pub byte_length: u64,
    pub payload_crc: u32,
}

impl RecordMetadata {
    /// Offset of the metadata block preceding the payload
    pub fn block_offset(&self) -> u64 {
        self.offset - METADATA_SIZE
    }

    /// One past the last payload byte
    pub fn end(&self) -> u64 {
        self.offset + self.byte_length
    }
}

/// Metadata block exactly as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    pub sentinel: u32,
    pub data_type: u32,
    pub element_count: u64,
    pub offset: u64,
    pub byte_length: u64,
    pub payload_crc: u32,
    pub metadata_crc: u32,
    reserved: [u64; 3],
}

impl MetadataBlock {
    /// Sealed block describing `record`
    pub fn from_record(record: &RecordMetadata) -> Self {
        let mut block = Self {
            sentinel: METADATA_SENTINEL,
            data_type: record.data_type.code(),
            element_count: record.element_count,
            offset: record.offset,
            byte_length: record.byte_length,
            payload_crc: record.payload_crc,
            metadata_crc: 0,
            reserved: [0; 3],
        };
        block.seal();
        block
    }

    /// CRC-32 of the encoded bytes preceding `metadata_crc`
    pub fn compute_crc(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.sentinel.to_le_bytes());
        hasher.update(&self.data_type.to_le_bytes());
        hasher.update(&self.element_count.to_le_bytes());
        hasher.update(&self.offset.to_le_bytes());
        hasher.update(&self.byte_length.to_le_bytes());
        hasher.update(&self.payload_crc.to_le_bytes());
        hasher.finalize()
    }

    /// Recompute `metadata_crc` after editing fields
    pub fn seal(&mut self) {
        self.metadata_crc = self.compute_crc();
    }

    /// Check the block found at `block_offset` and turn it into a record
    pub fn validate(&self, block_offset: u64) -> Result<RecordMetadata> {
        let corrupt = |reason: String| BlobError::CorruptMetadata {
            offset: block_offset,
            reason,
        };

        if self.sentinel != METADATA_SENTINEL {
            return Err(corrupt(format!("bad sentinel {:#010x}", self.sentinel)));
        }
        if self.metadata_crc != self.compute_crc() {
            return Err(corrupt("metadata checksum mismatch".to_string()));
        }

        let data_type = DataType::from_code(self.data_type)
            .ok_or_else(|| corrupt(format!("unknown data type code {}", self.data_type)))?;

        if self.offset % ALIGNMENT != 0 {
            return Err(corrupt(format!("payload offset {} is not aligned", self.offset)));
        }
        if self.offset != block_offset + METADATA_SIZE {
            return Err(corrupt(format!(
                "payload offset {} does not follow its metadata",
                self.offset
            )));
        }

        let expected = data_type.byte_len(self.element_count).ok_or_else(|| {
            corrupt(format!("element count {} overflows", self.element_count))
        })?;
        if expected != self.byte_length {
            return Err(corrupt(format!(
                "{} elements of {} need {} bytes, metadata says {}",
                self.element_count, data_type, expected, self.byte_length
            )));
        }

        Ok(RecordMetadata {
            data_type,
            element_count: self.element_count,
            offset: self.offset,
            byte_length: self.byte_length,
            payload_crc: self.payload_crc,
        })
    }
}

impl FixedBlock for MetadataBlock {
    const SIZE: usize = METADATA_SIZE as usize;

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(block_bytes::<Self>(bytes)?)?)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

// =============================================================================
// Scan
// =============================================================================

/// Validate the header and every record of a mapped blob file
///
/// Records are returned in file order. The header's record count must match
/// the number of records found.
pub fn scan(file: &MappedFile) -> Result<(BlobHeader, Vec<RecordMetadata>)> {
    let len = file.len();
    if len < HEADER_SIZE {
        return Err(BlobError::TruncatedHeader {
            expected: HEADER_SIZE,
            actual: len,
        });
    }

    let header: BlobHeader = file.read_struct(0)?;
    header.validate()?;

    let mut records = Vec::new();
    let mut pos = align_up(HEADER_SIZE, ALIGNMENT);

    while pos < len {
        if pos + METADATA_SIZE > len {
            return Err(BlobError::TruncatedMetadata { offset: pos });
        }

        let block: MetadataBlock = file.read_struct(pos)?;
        let record = block.validate(pos)?;

        if record.end() > len {
            return Err(BlobError::TruncatedData {
                offset: record.offset,
                needed: record.byte_length,
                available: len - record.offset,
            });
        }

        records.push(record);
        pos = align_up(record.end(), ALIGNMENT);
    }

    if records.len() as u64 != header.record_count {
        return Err(BlobError::CorruptMetadata {
            offset: 0,
            reason: format!(
                "header declares {} records, found {}",
                header.record_count,
                records.len()
            ),
        });
    }

    debug!(
        path = %file.path().display(),
        records = records.len(),
        encrypted = header.is_encrypted(),
        "Scanned blob file"
    );

    Ok((header, records))
}
