//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (record store,
//! filesystem, settings, clock) into the library core. Desktop apps typically
//! enable the `desktop-shims` feature (which depends on `bridge-desktop`) and
//! call [`bootstrap_desktop`]; other hosts build a [`CoreDependencies`] from
//! their own bridges and call [`CoreService::open`].

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{
    database::RecordStore,
    storage::{FileSystemAccess, SettingsStore},
    time::{Clock, SystemClock},
};
use core_library::{
    DataTables, DbIdx, FilterDisplay, FilterDisplayKey, MusicDb, PlaylistSource,
    RecordStoreAdapter, Song, SongFilter,
};
use core_runtime::config::CoreConfig;
use tracing::info;

/// Aggregated handle to all bridge dependencies the core requires.
pub struct CoreDependencies {
    pub record_store: Box<dyn RecordStore>,
    pub filesystem: Arc<dyn FileSystemAccess>,
    pub settings_store: Box<dyn SettingsStore>,
    pub clock: Arc<dyn Clock>,
    pub tables: Arc<DataTables>,
    pub playlists: Option<Arc<dyn PlaylistSource>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    ///
    /// Uses the system clock, the built-in data tables and no playlists.
    pub fn new(
        record_store: Box<dyn RecordStore>,
        filesystem: Arc<dyn FileSystemAccess>,
        settings_store: Box<dyn SettingsStore>,
    ) -> Self {
        Self {
            record_store,
            filesystem,
            settings_store,
            clock: Arc::new(SystemClock),
            tables: Arc::new(DataTables::standard()),
            playlists: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_tables(mut self, tables: Arc<DataTables>) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_playlists(mut self, playlists: Arc<dyn PlaylistSource>) -> Self {
        self.playlists = Some(playlists);
        self
    }
}

/// Primary façade exposed to host applications.
pub struct CoreService {
    library: MusicDb,
    settings: Box<dyn SettingsStore>,
    filter_display: FilterDisplay,
    playlists: Option<Arc<dyn PlaylistSource>>,
}

impl CoreService {
    /// Load the library described by `config` using the provided bridges.
    pub fn open(config: &CoreConfig, deps: CoreDependencies) -> Result<Self> {
        config.validate()?;

        let adapter = RecordStoreAdapter::new(deps.record_store, config.record_store());
        let library = MusicDb::open(adapter, deps.filesystem, deps.tables, deps.clock)?;
        let filter_display = FilterDisplay::load(deps.settings_store.as_ref())?;

        info!(
            database = ?config.database_path,
            songs = library.count(),
            "Core service ready"
        );
        Ok(Self {
            library,
            settings: deps.settings_store,
            filter_display,
            playlists: deps.playlists,
        })
    }

    pub fn library(&self) -> &MusicDb {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut MusicDb {
        &mut self.library
    }

    /// A fresh filter over this library's tables and playlists.
    pub fn new_filter(&self) -> SongFilter {
        let filter = SongFilter::new(self.library.tables_arc());
        match &self.playlists {
            Some(playlists) => filter.with_playlists(Arc::clone(playlists)),
            None => filter,
        }
    }

    /// Run `filter` and return the matching songs in result order.
    pub fn query<'a>(&'a self, filter: &mut SongFilter) -> Vec<(DbIdx, &'a Song)> {
        let count = filter.process(&self.library);
        (0..count)
            .filter_map(|pos| filter.get_by_position(pos))
            .filter_map(|dbidx| self.library.get_by_index(dbidx).map(|song| (dbidx, song)))
            .collect()
    }

    pub fn filter_display(&self) -> &FilterDisplay {
        &self.filter_display
    }

    /// Show or hide a filter category and persist the change.
    pub fn set_filter_visible(&mut self, key: FilterDisplayKey, visible: bool) -> Result<()> {
        self.filter_display.set_visible(key, visible);
        self.filter_display.save(self.settings.as_mut())?;
        Ok(())
    }

    /// Close the record store and drop the loaded library.
    pub fn close(&mut self) -> Result<()> {
        self.library.close()?;
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses a `FileRecordStore` at `config.database_path`, the configured file
/// system and a `JsonSettingsStore` at `config.settings_path`.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # fn example() -> core_service::Result<()> {
/// use core_runtime::config::CoreConfig;
/// use core_service::bootstrap_desktop;
///
/// let config = CoreConfig::builder()
///     .database_path("/data/musicdb.dat")
///     .music_dir("/music")
///     .build()?;
/// let core = bootstrap_desktop(&config)?;
/// println!("{} songs", core.library().count());
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(config: &CoreConfig) -> Result<CoreService> {
    use bridge_desktop::{FileRecordStore, JsonSettingsStore};

    let settings = JsonSettingsStore::open(&config.settings_path)?;
    let deps = CoreDependencies::new(
        Box::new(FileRecordStore::with_record_size(config.record_size)),
        Arc::clone(&config.file_system),
        Box::new(settings),
    );
    CoreService::open(config, deps)
}
