//! # Core Configuration Module
//!
//! Provides configuration management for the dance library core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the paths, record store parameters and bridges the
//! core needs. It enforces fail-fast validation so a bad path or slot size is
//! reported before anything touches the disk.
//!
//! ## Required Settings
//!
//! - `database_path` - Record store file holding song metadata
//! - `music_dir` - Directory song paths are stored relative to
//!
//! ## Optional Settings (with defaults)
//!
//! - `settings_path` - Filter-display preferences (default: `filterdisplay.json`
//!   next to the record store)
//! - `record_size` - Slot size for newly created stores (default: 2048)
//! - `store_version` - Record store format version (default: 10)
//! - `FileSystemAccess` - Audio file existence checks
//!
//! When the `desktop-shims` feature is enabled, a `StdFileSystem` rooted at
//! `music_dir` is injected automatically if no file system is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/musicdb.dat")
//!     .music_dir("/path/to/music")
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::database::{RecordStoreConfig, DEFAULT_RECORD_SIZE};
use bridge_traits::FileSystemAccess;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Record store format version written by this release
pub const DEFAULT_STORE_VERSION: u32 = 10;

/// Smallest accepted slot size in bytes
pub const MIN_RECORD_SIZE: usize = 256;

/// Largest accepted slot size in bytes
pub const MAX_RECORD_SIZE: usize = 65_536;

const DEFAULT_SETTINGS_FILE: &str = "filterdisplay.json";

/// Core configuration for the dance library core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the record store file
    pub database_path: PathBuf,

    /// Directory relative song paths are resolved against
    pub music_dir: PathBuf,

    /// Path to the filter-display settings file
    pub settings_path: PathBuf,

    /// Slot size used when creating a new record store
    pub record_size: usize,

    /// Record store format version
    pub store_version: u32,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// File system access abstraction (required, desktop default available)
    pub file_system: Arc<dyn FileSystemAccess>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("music_dir", &self.music_dir)
            .field("settings_path", &self.settings_path)
            .field("record_size", &self.record_size)
            .field("store_version", &self.store_version)
            .field("logging", &self.logging)
            .field("file_system", &"FileSystemAccess { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Record store parameters derived from this configuration
    pub fn record_store(&self) -> RecordStoreConfig {
        RecordStoreConfig::new(&self.database_path, self.store_version)
            .with_record_size(self.record_size)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path, music directory and settings path are not empty
    /// - Record size is within 256..=65536 bytes
    /// - Store version is greater than 0
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if self.music_dir.as_os_str().is_empty() {
            return Err(Error::Config("Music directory cannot be empty".to_string()));
        }

        if self.settings_path.as_os_str().is_empty() {
            return Err(Error::Config("Settings path cannot be empty".to_string()));
        }

        if !(MIN_RECORD_SIZE..=MAX_RECORD_SIZE).contains(&self.record_size) {
            return Err(Error::Config(format!(
                "Record size {} is out of range. Use a value between {} and {} bytes.",
                self.record_size, MIN_RECORD_SIZE, MAX_RECORD_SIZE
            )));
        }

        if self.store_version == 0 {
            return Err(Error::Config(
                "Store version must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to check audio files. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default StdFileSystem. \
                 Other hosts: inject a FileSystemAccess rooted at the music directory."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system(music_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::StdFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(StdFileSystem::with_music_dir(music_dir));
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system(_music_dir: &Path) -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

fn default_settings_path(database_path: &Path) -> PathBuf {
    match database_path.parent() {
        Some(parent) => parent.join(DEFAULT_SETTINGS_FILE),
        None => PathBuf::from(DEFAULT_SETTINGS_FILE),
    }
}

/// Builder for constructing a [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    music_dir: Option<PathBuf>,
    settings_path: Option<PathBuf>,
    record_size: Option<usize>,
    store_version: Option<u32>,
    logging: Option<LoggingConfig>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl CoreConfigBuilder {
    /// Sets the record store path.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .database_path("/path/to/musicdb.dat");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the music directory.
    pub fn music_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.music_dir = Some(path.into());
        self
    }

    /// Sets the filter-display settings file.
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Sets the slot size used when a new record store is created.
    ///
    /// Default: 2048 bytes. Existing stores keep the size in their header.
    pub fn record_size(mut self, size: usize) -> Self {
        self.record_size = Some(size);
        self
    }

    /// Sets the record store format version.
    pub fn store_version(mut self, version: u32) -> Self {
        self.store_version = Some(version);
        self
    }

    /// Sets the logging configuration.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Sets the file system implementation.
    ///
    /// Relative song paths handed to it are expected to resolve against the
    /// music directory.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required paths are missing
    /// - No `FileSystemAccess` is available
    /// - Configuration values are invalid
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use core_runtime::config::CoreConfig;
    /// let config = CoreConfig::builder()
    ///     .database_path("/path/to/musicdb.dat")
    ///     .music_dir("/path/to/music")
    ///     .build()?;
    /// # Ok::<(), core_runtime::Error>(())
    /// ```
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let music_dir = self.music_dir.ok_or_else(|| {
            Error::Config("Music directory is required. Use .music_dir() to set it.".to_string())
        })?;

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system(&music_dir)?,
        };

        let settings_path = self
            .settings_path
            .unwrap_or_else(|| default_settings_path(&database_path));

        let config = CoreConfig {
            database_path,
            music_dir,
            settings_path,
            record_size: self.record_size.unwrap_or(DEFAULT_RECORD_SIZE),
            store_version: self.store_version.unwrap_or(DEFAULT_STORE_VERSION),
            logging: self.logging.unwrap_or_default(),
            file_system,
        };

        config.validate()?;

        Ok(config)
    }
}
