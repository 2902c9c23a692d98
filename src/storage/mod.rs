//! Storage Module
//!
//! Blob files: a fixed header followed by aligned, self-describing records.
//!
//! ## File Format (V1)
//! ```text
//! ┌────────────────────────────────────────┐  0
//! │ Header (64)                            │
//! │ ┌──────────┬─────────┬───────┬───────┐ │
//! │ │Magic (4) │Version  │Flags  │Count  │ │
//! │ └──────────┴─────────┴───────┴───────┘ │
//! ├────────────────────────────────────────┤  64
//! │ Metadata block (64)                    │
//! │ ┌────────┬──────┬───────┬─────┬─────┐ │
//! │ │Sentinel│Type  │Count  │Off  │Len  │ │  + CRCs
//! │ └────────┴──────┴───────┴─────┴─────┘ │
//! ├────────────────────────────────────────┤  128 (record offset)
//! │ Payload (Len bytes) + zero padding     │
//! ├────────────────────────────────────────┤  next multiple of 64
//! │ ... (repeated for each record)         │
//! └────────────────────────────────────────┘
//! ```
//!
//! A record is addressed by its payload offset, which is always a multiple
//! of [`ALIGNMENT`].

mod format;
mod reader;
mod writer;

pub use format::{
    scan, BlobHeader, MetadataBlock, RecordMetadata, ALIGNMENT, FLAG_ENCRYPTED, HEADER_SIZE,
    MAGIC, METADATA_SENTINEL, METADATA_SIZE, VERSION as FORMAT_VERSION,
};
pub use reader::StorageReader;
pub use writer::StorageWriter;
