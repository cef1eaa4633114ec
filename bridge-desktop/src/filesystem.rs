//! File System Access Implementation using `std::fs`

use bridge_traits::{
    error::{BridgeError, Result},
    storage::FileSystemAccess,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Blocking file system implementation
///
/// Song records store paths relative to the music directory; absolute paths
/// are used as-is.
pub struct StdFileSystem {
    music_dir: PathBuf,
}

impl StdFileSystem {
    /// Create a new file system accessor rooted at the platform music directory
    pub fn new() -> Self {
        let music_dir = dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Music")))
            .unwrap_or_else(|| PathBuf::from("."));

        Self { music_dir }
    }

    /// Create a new file system accessor rooted at a custom music directory
    pub fn with_music_dir(music_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_dir: music_dir.into(),
        }
    }

    /// Directory relative song paths are resolved against
    pub fn music_dir(&self) -> &Path {
        &self.music_dir
    }

    /// Resolve a song path against the music directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.music_dir.join(path)
        }
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }
}

impl Default for StdFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemAccess for StdFileSystem {
    fn exists(&self, path: &Path) -> Result<bool> {
        let full = self.resolve(path);
        let found = full.try_exists().map_err(Self::map_io_error)?;
        debug!(path = ?full, found, "Checked file");
        Ok(found)
    }
}
