//! # weightblob
//!
//! Storage for large binary weight arrays:
//! - Append-only blob files of aligned, typed records
//! - Zero-copy, memory-mapped reads
//! - Strided multi-dimensional Spans, including packed 1-, 2- and 4-bit types
//! - Bit-preserving reinterpretation between element types
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────┐          ┌─────────────────────────┐
//! │     StorageWriter       │          │     StorageReader       │
//! │  (append, header count) │          │ (validate, index, view) │
//! └───────────┬─────────────┘          └───────────┬─────────────┘
//!             │                                    │
//!             ▼                                    ▼
//!   ┌──────────────────┐   format.rs    ┌──────────────────┐
//!   │   FileWriter     │ ─────────────▶ │   MappedFile     │
//!   │ (aligned writes) │  header/meta   │  (memmap2, ro)   │
//!   └──────────────────┘                └────────┬─────────┘
//!                                                │ borrowed bytes
//!                                                ▼
//!                                       ┌──────────────────┐
//!                                       │ Span / SpanCast  │
//!                                       │ (typed views)    │
//!                                       └──────────────────┘
//! ```

#[cfg(not(target_endian = "little"))]
compile_error!("weightblob views payloads in place and requires a little-endian target");

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod dtype;

pub mod file;
pub mod span;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlobError, Result};
pub use config::{Config, SyncStrategy};
pub use dtype::DataType;
pub use span::{AnySpan, Element, Int4, Span, SpanMut, UInt1, UInt2, UInt4};
pub use storage::{RecordMetadata, StorageReader, StorageWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of weightblob
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
