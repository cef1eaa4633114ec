//! # Library Index
//!
//! In-memory index over every song in the record store.
//!
//! ## Overview
//!
//! [`MusicDb::open`] reads every slot from 1 upward, skipping empty or
//! unreadable slots and songs whose audio file is gone, then sorts by path and
//! hands out logical indices `0..count` in that order. Lookups by path and by
//! logical index are O(1).
//!
//! Songs added with [`add_temporary_song`](MusicDb::add_temporary_song) live
//! for the session only. Their indices start after the last persisted song
//! and are never reused. They are visible to
//! [`get_by_index`](MusicDb::get_by_index) but not to [`count`](MusicDb::count)
//! or [`iter`](MusicDb::iter), and are never written.
//!
//! ## Usage
//!
//! ```ignore
//! let mut db = MusicDb::open(adapter, fs, tables, clock)?;
//! for (dbidx, song) in db.iter() {
//!     println!("{} {:?}", dbidx, song.str(Tag::Title));
//! }
//!
//! db.start_batch()?;
//! for song in edited.iter_mut() {
//!     db.write_song(song)?;
//! }
//! db.end_batch()?;
//! ```

use bridge_traits::{Clock, FileSystemAccess, RecordNumber};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::error::Result;
use crate::models::{DbIdx, Song, Tag};
use crate::record::{self, WriteStamp, ADD_DATE_FORMAT};
use crate::store::RecordStoreAdapter;
use crate::tables::{DataTables, TableKind};

pub struct MusicDb {
    store: RecordStoreAdapter,
    fs: Arc<dyn FileSystemAccess>,
    tables: Arc<DataTables>,
    clock: Arc<dyn Clock>,
    /// Persisted songs in path order; `songs[i]` has logical index `i`
    songs: Vec<Song>,
    by_path: HashMap<String, usize>,
    temporary: BTreeMap<DbIdx, Song>,
    next_temporary: DbIdx,
    dance_counts: Vec<u32>,
}

impl MusicDb {
    /// Load every song from the record store
    ///
    /// # Errors
    /// Fails only if the store cannot be opened, counted or closed. Bad
    /// slots and missing audio files are logged and skipped.
    pub fn open(
        store: RecordStoreAdapter,
        fs: Arc<dyn FileSystemAccess>,
        tables: Arc<DataTables>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dance_counts = vec![0; tables.len(TableKind::Dance)];
        let mut db = Self {
            store,
            fs,
            tables,
            clock,
            songs: Vec::new(),
            by_path: HashMap::new(),
            temporary: BTreeMap::new(),
            next_temporary: 0,
            dance_counts,
        };
        db.load()?;
        Ok(db)
    }

    fn load(&mut self) -> Result<()> {
        self.store.open()?;
        let count = match self.store.count() {
            Ok(count) => count,
            Err(e) => {
                if let Err(close_err) = self.store.close() {
                    warn!(error = %close_err, "Cannot close record store");
                }
                return Err(e);
            }
        };
        debug!(path = ?self.store.path(), count, "Scanning record store");

        let mut songs = Vec::new();
        let mut seen = HashMap::new();
        for rrn in 1..=count {
            let Some(mut song) = self.read_slot(rrn) else {
                continue;
            };
            song.set_rrn(rrn);

            let path = song.path().unwrap_or_default().to_string();
            if !self.audio_exists(&path) {
                debug!(rrn, path = %path, "Audio file missing, skipping");
                continue;
            }
            if let Some(first) = seen.get(&path) {
                warn!(rrn, first, path = %path, "Duplicate path, skipping");
                continue;
            }

            self.count_dance(&song, 1);
            seen.insert(path, rrn);
            songs.push(song);
        }
        self.store.close()?;

        songs.sort_by(|a, b| a.path().cmp(&b.path()));
        for (idx, song) in songs.iter_mut().enumerate() {
            song.set_dbidx(idx as DbIdx);
            if let Some(path) = song.path() {
                self.by_path.insert(path.to_string(), idx);
            }
        }
        self.next_temporary = songs.len() as DbIdx;
        self.songs = songs;

        info!(
            path = ?self.store.path(),
            count = self.songs.len(),
            slots = count,
            "Loaded music database"
        );
        Ok(())
    }

    fn read_slot(&mut self, rrn: RecordNumber) -> Option<Song> {
        let bytes = match self.store.read(rrn) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                trace!(rrn, "Empty slot");
                return None;
            }
            Err(e) => {
                warn!(rrn, error = %e, "Unreadable slot, skipping");
                return None;
            }
        };
        match record::decode(&bytes, &self.tables) {
            Ok(song) => Some(song),
            Err(e) => {
                warn!(rrn, error = %e, "Unreadable record, skipping");
                None
            }
        }
    }

    fn audio_exists(&self, path: &str) -> bool {
        match self.fs.exists(Path::new(path)) {
            Ok(found) => found,
            Err(e) => {
                debug!(path = %path, error = %e, "Cannot check audio file");
                false
            }
        }
    }

    fn count_dance(&mut self, song: &Song, delta: i32) {
        let Some(dance) = song.num(Tag::Dance) else {
            return;
        };
        if let Some(slot) = usize::try_from(dance)
            .ok()
            .and_then(|idx| self.dance_counts.get_mut(idx))
        {
            *slot = slot.saturating_add_signed(delta);
        }
    }

    /// Release the store handle and every song. Safe to call twice.
    pub fn close(&mut self) -> Result<()> {
        self.store.close()?;
        self.songs.clear();
        self.by_path.clear();
        self.temporary.clear();
        self.next_temporary = 0;
        self.dance_counts.iter_mut().for_each(|count| *count = 0);
        Ok(())
    }

    /// Number of persisted songs
    pub fn count(&self) -> usize {
        self.songs.len()
    }

    pub fn get_by_path(&self, path: &str) -> Option<&Song> {
        self.by_path.get(path).and_then(|&idx| self.songs.get(idx))
    }

    /// Song at `dbidx`; indices past the persisted songs reach temporary ones
    pub fn get_by_index(&self, dbidx: DbIdx) -> Option<&Song> {
        let idx = usize::try_from(dbidx).ok()?;
        if idx < self.songs.len() {
            self.songs.get(idx)
        } else {
            self.temporary.get(&dbidx)
        }
    }

    /// Re-read one persisted song from the store, keeping its logical index
    ///
    /// Returns `None` if `dbidx` is not a persisted song or its slot is empty.
    pub fn load_entry(&mut self, dbidx: DbIdx) -> Result<Option<&Song>> {
        let Some(idx) = usize::try_from(dbidx)
            .ok()
            .filter(|idx| *idx < self.songs.len())
        else {
            return Ok(None);
        };
        let Some(rrn) = self.songs[idx].rrn() else {
            debug!(dbidx, "Song has no record number");
            return Ok(None);
        };

        let Some(bytes) = self.store.read_single(rrn)? else {
            debug!(dbidx, rrn, "Slot is empty");
            return Ok(None);
        };
        let mut song = record::decode(&bytes, &self.tables)?;
        if song.path() != self.songs[idx].path() {
            warn!(
                dbidx,
                rrn,
                expected = ?self.songs[idx].path(),
                found = ?song.path(),
                "Slot now holds a different file, not reloading"
            );
            return Ok(None);
        }
        song.set_rrn(rrn);
        song.set_dbidx(dbidx);
        self.replace(idx, song);

        debug!(dbidx, rrn, "Reloaded song");
        Ok(self.songs.get(idx))
    }

    fn replace(&mut self, idx: usize, song: Song) {
        let old = std::mem::replace(&mut self.songs[idx], song);
        self.count_dance(&old, -1);
        let new = self.songs[idx].clone();
        self.count_dance(&new, 1);

        if old.path() != new.path() {
            if let Some(path) = old.path() {
                self.by_path.remove(path);
            }
            if let Some(path) = new.path() {
                self.by_path.insert(path.to_string(), idx);
            }
        }
    }

    pub fn start_batch(&mut self) -> Result<()> {
        self.store.start_batch()
    }

    /// End the batch and close the store handle
    pub fn end_batch(&mut self) -> Result<()> {
        self.store.end_batch()
    }

    /// Write `song` to the record store
    ///
    /// New songs get a record number from the store; it is stored back onto
    /// `song`. A song without one whose path is already indexed reuses the
    /// indexed song's record. If the song's path is indexed, the in-memory copy is refreshed.
    /// Songs not yet indexed become visible at the next [`open`](Self::open).
    ///
    /// Returns the record length, or 0 for temporary songs, which are never
    /// written.
    pub fn write_song(&mut self, song: &mut Song) -> Result<usize> {
        if song.is_temporary() {
            return Ok(0);
        }

        let indexed = song
            .path()
            .and_then(|path| self.by_path.get(path))
            .and_then(|&idx| self.songs.get(idx));
        let (rrn, is_new) = match (song.rrn(), indexed.and_then(Song::rrn)) {
            (Some(rrn), _) => (rrn, false),
            (None, Some(rrn)) => {
                if let Some(added) = indexed.and_then(|s| s.str(Tag::DbAddDate)) {
                    if !song.has(Tag::DbAddDate) {
                        let added = added.to_string();
                        song.set(Tag::DbAddDate, added);
                    }
                }
                (rrn, false)
            }
            (None, None) => (self.store.allocate()?, true),
        };
        let stamp = WriteStamp {
            rrn,
            is_new,
            now: self.clock.now(),
        };
        let data = record::encode(song, &stamp, &self.tables);
        self.store.write(rrn, data.as_bytes())?;

        song.set_rrn(rrn);
        song.set(Tag::LastUpdated, stamp.now.timestamp());
        if is_new {
            song.set(
                Tag::DbAddDate,
                stamp.now.format(ADD_DATE_FORMAT).to_string(),
            );
        }
        if !song.has(Tag::Status) {
            song.set(
                Tag::Status,
                record::parse_value(Tag::Status, self.tables.default_status(), &self.tables),
            );
        }

        let indexed_at = song
            .path()
            .and_then(|path| self.by_path.get(path))
            .copied();
        if let Some(idx) = indexed_at {
            let mut indexed = song.clone();
            indexed.set_dbidx(idx as DbIdx);
            song.set_dbidx(idx as DbIdx);
            self.replace(idx, indexed);
        }

        debug!(rrn, is_new, len = data.len(), "Wrote song");
        Ok(data.len())
    }

    /// Add a session-only song and return its logical index
    pub fn add_temporary_song(&mut self, mut song: Song) -> DbIdx {
        let dbidx = self.next_temporary.max(self.songs.len() as DbIdx);
        self.next_temporary = dbidx + 1;
        song.mark_temporary();
        song.set_dbidx(dbidx);
        debug!(dbidx, path = ?song.path(), "Added temporary song");
        self.temporary.insert(dbidx, song);
        dbidx
    }

    /// Remove a session-only song. Its index is not handed out again.
    pub fn remove_temporary_song(&mut self, dbidx: DbIdx) -> Option<Song> {
        self.temporary.remove(&dbidx)
    }

    /// Number of session-only songs
    pub fn temporary_count(&self) -> usize {
        self.temporary.len()
    }

    /// Persisted songs in path order with their logical indices
    pub fn iter(&self) -> impl Iterator<Item = (DbIdx, &Song)> + '_ {
        self.songs
            .iter()
            .enumerate()
            .map(|(idx, song)| (idx as DbIdx, song))
    }

    /// Songs per dance, indexed like the dance table
    pub fn dance_counts(&self) -> &[u32] {
        &self.dance_counts
    }

    /// Display name of the dance of the song at `dbidx`
    pub fn dance_name(&self, dbidx: DbIdx) -> Option<&str> {
        let song = self.get_by_index(dbidx)?;
        match song.num(Tag::Dance) {
            Some(dance) => self.tables.name(TableKind::Dance, dance),
            None => song.str(Tag::Dance),
        }
    }

    pub fn tables(&self) -> &DataTables {
        &self.tables
    }

    /// Shared handle on the tables, for building filters
    pub fn tables_arc(&self) -> Arc<DataTables> {
        Arc::clone(&self.tables)
    }
}
