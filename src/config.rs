//! Configuration for weightblob
//!
//! Centralized configuration with sensible defaults. The alignment unit and
//! format version are format constants (see `storage::format`), not settings.

/// Options shared by the storage reader and writer
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Writer Configuration
    // -------------------------------------------------------------------------
    /// When to fsync the blob file
    pub sync_strategy: SyncStrategy,

    /// Allow `StorageWriter::create` to overwrite an existing file
    pub truncate_existing: bool,

    /// Header flag written by `StorageWriter::create`.
    /// Payloads are written as given; encryption happens upstream.
    pub encrypted: bool,

    // -------------------------------------------------------------------------
    // Reader Configuration
    // -------------------------------------------------------------------------
    /// Verify every payload checksum while opening (touches every mapped page)
    pub verify_checksums: bool,
}

/// Writer sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every record (safest, slowest)
    EveryRecord,

    /// fsync once, when the writer is finalized
    OnFinalize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync_strategy: SyncStrategy::OnFinalize,
            truncate_existing: false,
            encrypted: false,
            verify_checksums: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the writer sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Allow `create` to truncate an existing file
    pub fn truncate_existing(mut self, truncate: bool) -> Self {
        self.config.truncate_existing = truncate;
        self
    }

    /// Mark newly created files as encrypted
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.config.encrypted = encrypted;
        self
    }

    /// Verify payload checksums on open
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.config.verify_checksums = verify;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
