//! # Library Core
//!
//! Loads the persisted song collection into memory and answers "which songs
//! match, in what order".
//!
//! ## Overview
//!
//! This crate manages:
//! - The song model and the data tables that give dance, rating, level,
//!   status, genre and favorite indices their names
//! - The record format shared with other tools reading the same store
//! - [`MusicDb`], the path-ordered library index with stable logical indices
//! - [`SongFilter`], the predicate chain and composite sort keys used by every
//!   song list, automatic playlist and export
//! - Filter display preferences
//!
//! All I/O goes through the bridge traits in `bridge-traits`, so the crate
//! itself has no platform code.

pub mod error;
pub mod filter_display;
pub mod models;
pub mod musicdb;
pub mod playlist;
pub mod record;
pub mod songfilter;
pub mod sortkey;
pub mod store;
pub mod tables;

pub use error::{LibraryError, Result};
pub use filter_display::{FilterDisplay, FilterDisplayKey};
pub use models::{DbIdx, Song, Tag, TagKind, TagValue};
pub use musicdb::MusicDb;
pub use playlist::{InMemoryPlaylists, Playlist, PlaylistKind, PlaylistSource};
pub use songfilter::{FilterSlot, SlotKind, SongFilter};
pub use sortkey::SortSpec;
pub use store::RecordStoreAdapter;
pub use tables::{BpmRange, DataTables, TableKind};
