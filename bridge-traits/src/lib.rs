//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host.
//!
//! ## Overview
//!
//! This crate defines the contract between the library core and the
//! host-specific collaborators it leans on. Each trait represents a capability
//! the core requires but does not own: the keyed record store that persists
//! song metadata, the filesystem used to confirm audio files still exist, the
//! key-value settings file, and the clock used to stamp writes.
//!
//! ## Traits
//!
//! ### Storage
//! - [`RecordStore`](database::RecordStore) - Fixed-size slot store addressed by record number
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Existence checks for audio files
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LogLevel`](time::LogLevel) - Shared log severity used by runtime configuration
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type for consistent
//! error handling. Implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., file paths, record numbers)
//!
//! ## Threading
//!
//! The core is single-threaded and never shares a bridge between threads at
//! the same time. Bridges are required to be `Send` so a host may move the
//! whole core onto a worker thread; `Sync` is only required where the core
//! holds the bridge behind an `Arc`.

pub mod database;
pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use database::{RecordNumber, RecordStore, RecordStoreConfig};
pub use storage::{FileSystemAccess, SettingsStore};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
