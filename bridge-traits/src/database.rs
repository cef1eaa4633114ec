//! Record Database Abstraction
//!
//! Provides a platform-agnostic trait over the keyed random-access record
//! store that persists song metadata.
//!
//! ## Design
//!
//! The store is a sequence of fixed-size slots addressed by a 1-based record
//! number. Slots may be empty (never written, or cleared); reading an empty
//! slot yields `None` and is not an error. The store owns its own
//! housekeeping (record count, free-slot allocation) and may defer it while a
//! batch is open.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::database::RecordStore;
//!
//! store.open(path, 10)?;
//! for rrn in 1..=store.count()? {
//!     if let Some(bytes) = store.read(rrn)? {
//!         // decode
//!     }
//! }
//! store.close()?;
//! ```

use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Physical slot identifier in the record store (1-based).
pub type RecordNumber = u32;

/// Default slot size in bytes.
pub const DEFAULT_RECORD_SIZE: usize = 2048;

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStoreConfig {
    /// Path of the store file
    pub path: PathBuf,

    /// Format version written to (and expected in) the store header
    pub version: u32,

    /// Size of one slot in bytes
    pub record_size: usize,
}

impl RecordStoreConfig {
    /// Create a configuration with the default slot size
    pub fn new(path: impl Into<PathBuf>, version: u32) -> Self {
        Self {
            path: path.into(),
            version,
            record_size: DEFAULT_RECORD_SIZE,
        }
    }

    /// Override the slot size
    pub fn with_record_size(mut self, record_size: usize) -> Self {
        self.record_size = record_size;
        self
    }
}

/// Keyed random-access record store
///
/// Implementations hold at most one open handle. Every method other than
/// `open`, `close` and `is_open` requires the store to be open and should
/// return an error otherwise.
pub trait RecordStore: Send {
    /// Open (creating if needed) the store at `path`
    ///
    /// # Errors
    /// Fails if the file cannot be opened or its header carries a different
    /// version.
    fn open(&mut self, path: &Path, version: u32) -> Result<()>;

    /// Release the handle. Closing a closed store is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Whether a handle is currently held
    fn is_open(&self) -> bool;

    /// Read the slot at `rrn`
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` for a written slot
    /// - `Ok(None)` for an empty slot or one beyond the record count
    fn read(&mut self, rrn: RecordNumber) -> Result<Option<Bytes>>;

    /// Write `data` into the slot at `rrn`, growing the record count if needed
    fn write(&mut self, rrn: RecordNumber, data: &[u8]) -> Result<()>;

    /// Empty the slot at `rrn`
    fn clear(&mut self, rrn: RecordNumber) -> Result<()>;

    /// Highest record number in use
    fn count(&self) -> Result<RecordNumber>;

    /// Allocate the record number a new record should be written to
    fn next_free(&mut self) -> Result<RecordNumber>;

    /// Maximum payload size of one slot
    fn record_size(&self) -> usize;

    /// Defer per-write housekeeping until [`end_batch`](Self::end_batch)
    fn start_batch(&mut self) -> Result<()>;

    /// Flush deferred housekeeping
    fn end_batch(&mut self) -> Result<()>;
}
