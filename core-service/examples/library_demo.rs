//! Library bootstrap and query demonstration
//!
//! Loads (or creates) a record store, adds any audio files found directly in
//! the music directory, then lists them grouped by dance.
//!
//! Run with:
//! ```bash
//! cargo run -p core-service --example library_demo -- /tmp/dancelib/musicdb.dat ~/Music
//!
//! # Only one dance, newest first
//! cargo run -p core-service --example library_demo -- /tmp/dancelib/musicdb.dat ~/Music Waltz
//! ```

use anyhow::{bail, Context, Result};
use bridge_traits::time::LogLevel;
use core_library::{FilterSlot, Song, TableKind, Tag};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use core_service::bootstrap_desktop;
use std::env;
use std::fs;
use tracing::info;

const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "flac", "ogg", "m4a"];

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let (Some(database), Some(music)) = (args.get(1), args.get(2)) else {
        bail!("usage: library_demo <database-path> <music-dir> [dance]");
    };

    let logging = LoggingConfig::default()
        .with_level(LogLevel::Debug)
        .with_filter("warn,core_library=info,core_service=info,library_demo=info");
    init_logging(logging.clone()).context("Failed to initialize logging")?;

    let config = CoreConfig::builder()
        .database_path(database)
        .music_dir(music)
        .logging(logging)
        .build()
        .context("Invalid configuration")?;

    let mut core = bootstrap_desktop(&config).context("Failed to open library")?;
    info!(songs = core.library().count(), "Library opened");

    let mut added = 0;
    let library = core.library_mut();
    library.start_batch()?;
    for entry in fs::read_dir(&config.music_dir)
        .with_context(|| format!("Cannot read {}", config.music_dir.display()))?
    {
        let path = entry?.path();
        let is_audio = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_audio || library.get_by_path(name).is_some() {
            continue;
        }

        let mut song = Song::new(name);
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            song.set(Tag::Title, stem);
        }
        library.write_song(&mut song)?;
        added += 1;
    }
    library.end_batch()?;

    if added > 0 {
        info!(added, "Added new songs, reopening");
        core.close()?;
        core = bootstrap_desktop(&config)?;
    }

    let mut filter = core.new_filter();
    match args.get(3) {
        Some(dance) => {
            let Some(idx) = core.library().tables().index(TableKind::Dance, dance) else {
                bail!("unknown dance: {}", dance);
            };
            filter.set_num(FilterSlot::Dance, idx)?;
            filter.set_sort("DBADDDATE");
        }
        None => filter.set_sort("DANCE TITLE"),
    }

    let songs = core.query(&mut filter);
    println!("{} of {} songs", songs.len(), core.library().count());
    for (dbidx, song) in songs {
        println!(
            "{:>5}  {:<16} {}",
            dbidx,
            core.library().dance_name(dbidx).unwrap_or("-"),
            song.str(Tag::Title).or(song.path()).unwrap_or_default()
        );
    }

    core.close()?;
    Ok(())
}
