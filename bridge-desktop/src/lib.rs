//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using plain `std::fs` I/O:
//! - `RecordStore` as a single fixed-slot file (`FileRecordStore`)
//! - `FileSystemAccess` rooted at the user's music directory (`StdFileSystem`)
//! - `SettingsStore` as a flat JSON object on disk (`JsonSettingsStore`)
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileRecordStore, StdFileSystem};
//! use bridge_traits::RecordStore;
//!
//! let mut store = FileRecordStore::new();
//! store.open(Path::new("data/musicdb.dat"), 10)?;
//! let fs = StdFileSystem::with_music_dir("/srv/music");
//! ```

mod filesystem;
mod record_store;
mod settings;

pub use filesystem::StdFileSystem;
pub use record_store::FileRecordStore;
pub use settings::JsonSettingsStore;
