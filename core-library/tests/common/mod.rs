//! Shared on-disk library fixture

#![allow(dead_code)]

use bridge_desktop::{FileRecordStore, StdFileSystem};
use bridge_traits::{FixedClock, RecordStoreConfig};
use core_library::{DataTables, MusicDb, RecordStoreAdapter, Song, Tag};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const VERSION: u32 = 10;
pub const NOW: i64 = 1_700_000_000;

pub struct Library {
    _dir: TempDir,
    pub music: PathBuf,
    pub store: PathBuf,
}

impl Library {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let music = dir.path().join("music");
        fs::create_dir_all(&music).unwrap();
        let store = dir.path().join("musicdb.dat");
        Self {
            _dir: dir,
            music,
            store,
        }
    }

    pub fn touch(&self, name: &str) {
        let path = self.music.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"audio").unwrap();
    }

    pub fn open(&self) -> MusicDb {
        let adapter = RecordStoreAdapter::new(
            Box::new(FileRecordStore::new()),
            RecordStoreConfig::new(&self.store, VERSION),
        );
        MusicDb::open(
            adapter,
            Arc::new(StdFileSystem::with_music_dir(&self.music)),
            Arc::new(DataTables::standard()),
            Arc::new(FixedClock::at(NOW)),
        )
        .expect("Failed to open library")
    }

    /// Write one record per song, creating the audio files
    pub fn seed(&self, songs: Vec<Song>) {
        let mut db = self.open();
        db.start_batch().unwrap();
        for mut song in songs {
            self.touch(song.path().unwrap());
            db.write_song(&mut song).unwrap();
        }
        db.end_batch().unwrap();
        db.close().unwrap();
    }
}

pub fn song(path: &str, title: &str) -> Song {
    let mut song = Song::new(path);
    song.set(Tag::Title, title);
    song
}
