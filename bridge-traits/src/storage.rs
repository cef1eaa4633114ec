//! Storage and File System Abstractions
//!
//! Provides platform-agnostic traits for filesystem queries and key-value
//! settings storage.

use std::path::Path;

use crate::error::Result;

/// File system access trait
///
/// The library only needs to know whether the audio file a record points at
/// is still present. Relative paths are resolved against the implementation's music directory.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// fn still_there(fs: &dyn FileSystemAccess, song_path: &str) -> bool {
///     fs.exists(Path::new(song_path)).unwrap_or(false)
/// }
/// ```
pub trait FileSystemAccess: Send + Sync {
    /// Check if a file or directory exists
    fn exists(&self, path: &Path) -> Result<bool>;
}

/// Key-value settings storage trait
///
/// Abstracts small persisted preference files:
/// - Desktop: JSON file next to the record store
/// - Tests: in-memory maps
///
/// Setters mutate an in-memory view; [`flush`](SettingsStore::flush) persists it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// fn save_preference(store: &mut dyn SettingsStore) -> Result<()> {
///     store.set_bool("DANCE", true)?;
///     store.flush()
/// }
/// ```
pub trait SettingsStore: Send {
    /// Store a boolean value
    fn set_bool(&mut self, key: &str, value: bool) -> Result<()>;

    /// Retrieve a boolean value
    ///
    /// Returns `Ok(None)` when the key is absent.
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;

    /// Persist pending changes
    fn flush(&mut self) -> Result<()>;
}
