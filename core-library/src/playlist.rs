//! Playlist source
//!
//! Playlist files are parsed by the host. The filter engine only needs to
//! fetch a playlist by name and know whether it is a plain song list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// What a playlist contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistKind {
    /// Explicit songs in a fixed order
    SongList,
    /// Dance sequence; songs are chosen by the filter
    Sequence,
    /// Rule-based; songs are chosen by the filter
    Automatic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub kind: PlaylistKind,
    /// Song paths, in playlist order
    #[serde(default)]
    pub songs: Vec<String>,
}

impl Playlist {
    pub fn song_list(name: impl Into<String>, songs: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: PlaylistKind::SongList,
            songs,
        }
    }

    pub fn is_song_list(&self) -> bool {
        self.kind == PlaylistKind::SongList
    }
}

/// Playlist lookup interface
pub trait PlaylistSource: Send + Sync {
    /// Load a playlist by name
    ///
    /// # Returns
    /// - `Ok(Some(playlist))` if found
    /// - `Ok(None)` if no playlist has that name
    /// - `Err` if the playlist exists but cannot be read
    fn load(&self, name: &str) -> Result<Option<Playlist>>;
}

/// Map-backed [`PlaylistSource`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlaylists {
    playlists: HashMap<String, Playlist>,
}

impl InMemoryPlaylists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a playlist
    pub fn insert(&mut self, playlist: Playlist) {
        self.playlists.insert(playlist.name.clone(), playlist);
    }

    pub fn with_playlist(mut self, playlist: Playlist) -> Self {
        self.insert(playlist);
        self
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

impl PlaylistSource for InMemoryPlaylists {
    fn load(&self, name: &str) -> Result<Option<Playlist>> {
        Ok(self.playlists.get(name).cloned())
    }
}
