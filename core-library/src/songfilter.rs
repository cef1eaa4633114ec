//! # Song Filter
//!
//! Selects and orders songs from a [`MusicDb`].
//!
//! ## Overview
//!
//! A [`SongFilter`] holds one value per [`FilterSlot`] plus an independent
//! in-use flag, so a predicate can be suspended with [`off`](SongFilter::off)
//! and restored with [`on`](SongFilter::on) without losing its value.
//! [`process`](SongFilter::process) runs every persisted song through the
//! armed predicates and orders the matches by their sort key.
//!
//! Results are positional: [`get_by_position`](SongFilter::get_by_position)
//! maps a result row to a logical index. Changing any slot or the sort
//! specification marks the results stale; stale results read as empty until
//! the next `process`.
//!
//! When the playlist slot names a plain song list, `process` returns that
//! playlist's songs in playlist order and ignores every other predicate and
//! the sort.
//!
//! ## Usage
//!
//! ```ignore
//! let mut filter = SongFilter::new(db.tables_arc());
//! filter.set_num(FilterSlot::Dance, 0)?;
//! filter.set_num(FilterSlot::Rating, 2)?;
//! filter.set_sort("DBADDDATE");
//!
//! let count = filter.process(&db);
//! for pos in 0..count {
//!     let dbidx = filter.get_by_position(pos);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::models::{DbIdx, Song, Tag};
use crate::musicdb::MusicDb;
use crate::playlist::PlaylistSource;
use crate::sortkey::SortSpec;
use crate::tables::{BpmRange, DataTables, TableKind};

// =============================================================================
// Slots
// =============================================================================

/// One filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterSlot {
    /// Exact dance index
    Dance,
    /// Allowed dances, each with optional BPM bounds
    DanceList,
    /// Exact genre index
    Genre,
    /// Minimum rating index
    Rating,
    /// Lowest allowed level index; only applied together with `LevelHigh`
    LevelLow,
    /// Highest allowed level index; only applied together with `LevelLow`
    LevelHigh,
    /// Exact status index
    Status,
    /// Exact favorite index
    Favorite,
    /// Only songs whose status is playable; any value arms it
    StatusPlayable,
    /// Keyword allow-list
    Keyword,
    /// Case-insensitive text search
    Search,
    /// Playlist name
    Playlist,
}

impl FilterSlot {
    pub const ALL: [FilterSlot; 12] = [
        FilterSlot::Dance,
        FilterSlot::DanceList,
        FilterSlot::Genre,
        FilterSlot::Rating,
        FilterSlot::LevelLow,
        FilterSlot::LevelHigh,
        FilterSlot::Status,
        FilterSlot::Favorite,
        FilterSlot::StatusPlayable,
        FilterSlot::Keyword,
        FilterSlot::Search,
        FilterSlot::Playlist,
    ];

    pub fn kind(&self) -> SlotKind {
        match self {
            FilterSlot::DanceList => SlotKind::DanceList,
            FilterSlot::Keyword => SlotKind::Keywords,
            FilterSlot::Search | FilterSlot::Playlist => SlotKind::Str,
            _ => SlotKind::Num,
        }
    }

    fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FilterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Value kind a slot accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Num,
    Str,
    DanceList,
    Keywords,
}

#[derive(Debug, Clone)]
enum SlotValue {
    /// -1 when clear
    Num(i64),
    Str(Option<String>),
    DanceList(BTreeMap<i64, BpmRange>),
    /// Owned by the caller; the filter only reads it
    Keywords(Option<Arc<BTreeSet<String>>>),
}

impl SlotValue {
    fn empty(kind: SlotKind) -> Self {
        match kind {
            SlotKind::Num => SlotValue::Num(-1),
            SlotKind::Str => SlotValue::Str(None),
            SlotKind::DanceList => SlotValue::DanceList(BTreeMap::new()),
            SlotKind::Keywords => SlotValue::Keywords(None),
        }
    }

    fn is_set(&self) -> bool {
        match self {
            SlotValue::Num(n) => *n >= 0,
            SlotValue::Str(s) => s.is_some(),
            SlotValue::DanceList(dances) => !dances.is_empty(),
            SlotValue::Keywords(words) => words.is_some(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    value: SlotValue,
    in_use: bool,
}

impl Slot {
    fn new(slot: FilterSlot) -> Self {
        Self {
            value: SlotValue::empty(slot.kind()),
            in_use: false,
        }
    }
}

/// One matched song
#[derive(Debug, Clone)]
struct Hit {
    key: String,
    seq: usize,
    dbidx: DbIdx,
}

// =============================================================================
// Filter
// =============================================================================

pub struct SongFilter {
    tables: Arc<DataTables>,
    playlists: Option<Arc<dyn PlaylistSource>>,
    slots: Vec<Slot>,
    sort: SortSpec,
    hits: Vec<Hit>,
    processed: bool,
    dance_counts: Vec<u32>,
}

impl SongFilter {
    pub fn new(tables: Arc<DataTables>) -> Self {
        let dance_counts = vec![0; tables.len(TableKind::Dance)];
        Self {
            tables,
            playlists: None,
            slots: FilterSlot::ALL.iter().map(|s| Slot::new(*s)).collect(),
            sort: SortSpec::default(),
            hits: Vec::new(),
            processed: false,
            dance_counts,
        }
    }

    /// Resolve the playlist slot against `playlists`
    pub fn with_playlists(mut self, playlists: Arc<dyn PlaylistSource>) -> Self {
        self.playlists = Some(playlists);
        self
    }

    fn slot(&self, slot: FilterSlot) -> &Slot {
        &self.slots[slot.position()]
    }

    fn slot_mut(&mut self, slot: FilterSlot) -> &mut Slot {
        self.processed = false;
        &mut self.slots[slot.position()]
    }

    fn check_kind(slot: FilterSlot, kind: SlotKind) -> Result<()> {
        if slot.kind() == kind {
            Ok(())
        } else {
            Err(LibraryError::InvalidInput {
                field: slot.to_string(),
                message: format!("expects a {:?} value, got {:?}", slot.kind(), kind),
            })
        }
    }

    /// Set and arm a string slot. Search text is stored lowercased.
    pub fn set_str(&mut self, slot: FilterSlot, value: &str) -> Result<()> {
        Self::check_kind(slot, SlotKind::Str)?;
        let value = if slot == FilterSlot::Search {
            value.to_lowercase()
        } else {
            value.to_string()
        };
        let entry = self.slot_mut(slot);
        entry.value = SlotValue::Str(Some(value));
        entry.in_use = true;
        Ok(())
    }

    /// Set and arm a numeric slot
    pub fn set_num(&mut self, slot: FilterSlot, value: i64) -> Result<()> {
        Self::check_kind(slot, SlotKind::Num)?;
        let entry = self.slot_mut(slot);
        entry.value = SlotValue::Num(value);
        entry.in_use = true;
        Ok(())
    }

    /// Set and arm the dance list
    pub fn set_dance_list(&mut self, dances: BTreeMap<i64, BpmRange>) {
        let entry = self.slot_mut(FilterSlot::DanceList);
        entry.value = SlotValue::DanceList(dances);
        entry.in_use = true;
    }

    /// Set and arm the keyword allow-list
    pub fn set_keywords(&mut self, keywords: Arc<BTreeSet<String>>) {
        let entry = self.slot_mut(FilterSlot::Keyword);
        entry.value = SlotValue::Keywords(Some(keywords));
        entry.in_use = true;
    }

    /// Drop the slot's value and disarm it
    pub fn clear(&mut self, slot: FilterSlot) {
        let entry = self.slot_mut(slot);
        entry.value = SlotValue::empty(slot.kind());
        entry.in_use = false;
    }

    /// Disarm the slot, keeping its value
    pub fn off(&mut self, slot: FilterSlot) {
        self.slot_mut(slot).in_use = false;
    }

    /// Re-arm the slot if it holds a value; returns whether it is armed
    pub fn on(&mut self, slot: FilterSlot) -> bool {
        let entry = self.slot_mut(slot);
        if entry.value.is_set() {
            entry.in_use = true;
        }
        entry.in_use
    }

    /// Clear every slot
    pub fn reset(&mut self) {
        for slot in FilterSlot::ALL {
            self.clear(slot);
        }
    }

    pub fn in_use(&self, slot: FilterSlot) -> bool {
        self.slot(slot).in_use
    }

    /// Stored number, armed or not
    pub fn num(&self, slot: FilterSlot) -> Option<i64> {
        match self.slot(slot).value {
            SlotValue::Num(n) if n >= 0 => Some(n),
            _ => None,
        }
    }

    /// Stored string, armed or not
    pub fn str(&self, slot: FilterSlot) -> Option<&str> {
        match &self.slot(slot).value {
            SlotValue::Str(s) => s.as_deref(),
            _ => None,
        }
    }

    /// Set the sort specification, e.g. `"DANCE TITLE"`
    pub fn set_sort(&mut self, spec: &str) {
        self.sort = SortSpec::parse(spec);
        self.processed = false;
    }

    pub fn sort_spec(&self) -> &SortSpec {
        &self.sort
    }

    /// True until [`process`](Self::process) has run against the current settings
    pub fn needs_process(&self) -> bool {
        !self.processed
    }

    /// Number of matches from the last [`process`](Self::process); 0 when stale
    pub fn count(&self) -> usize {
        if self.processed {
            self.hits.len()
        } else {
            0
        }
    }

    /// Logical index of the song at result row `pos`
    pub fn get_by_position(&self, pos: usize) -> Option<DbIdx> {
        if !self.processed {
            return None;
        }
        self.hits.get(pos).map(|hit| hit.dbidx)
    }

    /// Matches per dance from the last [`process`](Self::process)
    pub fn filtered_dance_counts(&self) -> &[u32] {
        &self.dance_counts
    }

    /// Build `song`'s sort key under the current specification
    pub fn make_sort_key(&self, song: &Song) -> String {
        self.sort.key_for(song, &self.tables)
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Run the filter over `db` and return the number of matches
    pub fn process(&mut self, db: &MusicDb) -> usize {
        self.hits.clear();
        self.dance_counts = vec![0; self.tables.len(TableKind::Dance)];

        if !self.process_song_list(db) {
            for (dbidx, song) in db.iter() {
                if !self.filter_song(song) {
                    continue;
                }
                let key = if self.sort.is_empty() {
                    String::new()
                } else {
                    self.make_sort_key(song)
                };
                let seq = self.hits.len();
                self.hits.push(Hit { key, seq, dbidx });
            }
            if !self.sort.is_empty() {
                self.hits
                    .sort_by(|a, b| a.key.cmp(&b.key).then(a.seq.cmp(&b.seq)));
            }
        }

        for hit in &self.hits {
            let dance = db.get_by_index(hit.dbidx).and_then(|s| s.num(Tag::Dance));
            if let Some(count) = dance
                .and_then(|d| usize::try_from(d).ok())
                .and_then(|d| self.dance_counts.get_mut(d))
            {
                *count += 1;
            }
        }

        self.processed = true;
        debug!(count = self.hits.len(), sort = ?self.sort.tags(), "Processed song filter");
        self.hits.len()
    }

    /// Fill the results from a plain song-list playlist, if one is armed
    fn process_song_list(&mut self, db: &MusicDb) -> bool {
        let slot = self.slot(FilterSlot::Playlist);
        let SlotValue::Str(Some(name)) = &slot.value else {
            return false;
        };
        if !slot.in_use {
            return false;
        }
        let Some(source) = &self.playlists else {
            warn!(playlist = %name, "No playlist source configured");
            return false;
        };

        let playlist = match source.load(name) {
            Ok(Some(playlist)) => playlist,
            Ok(None) => {
                warn!(playlist = %name, "Playlist not found");
                return false;
            }
            Err(e) => {
                warn!(playlist = %name, error = %e, "Cannot load playlist");
                return false;
            }
        };
        if !playlist.is_song_list() {
            return false;
        }

        let mut hits = Vec::with_capacity(playlist.songs.len());
        for path in &playlist.songs {
            match db.get_by_path(path).and_then(Song::dbidx) {
                Some(dbidx) => hits.push(Hit {
                    key: String::new(),
                    seq: hits.len(),
                    dbidx,
                }),
                None => debug!(playlist = %playlist.name, path = %path, "Playlist song not in library"),
            }
        }
        self.hits = hits;
        true
    }

    fn armed(&self, slot: FilterSlot) -> Option<&SlotValue> {
        let entry = self.slot(slot);
        entry.in_use.then_some(&entry.value)
    }

    fn armed_num(&self, slot: FilterSlot) -> Option<i64> {
        match self.armed(slot) {
            Some(SlotValue::Num(n)) => Some(*n),
            _ => None,
        }
    }

    /// True if `song` passes every armed predicate
    pub fn filter_song(&self, song: &Song) -> bool {
        let dance = song.num(Tag::Dance);

        if let Some(want) = self.armed_num(FilterSlot::Dance) {
            if dance != Some(want) {
                return false;
            }
        }

        let dance_list = match self.armed(FilterSlot::DanceList) {
            Some(SlotValue::DanceList(list)) => Some(list),
            _ => None,
        };
        if let Some(list) = dance_list {
            if !dance.is_some_and(|d| list.contains_key(&d)) {
                return false;
            }
        }

        if let Some(want) = self.armed_num(FilterSlot::Genre) {
            if song.num(Tag::Genre) != Some(want) {
                return false;
            }
        }

        if let Some(min) = self.armed_num(FilterSlot::Rating) {
            let Some(rating) = song.num(Tag::DanceRating) else {
                return false;
            };
            let weight = self.tables.rating(rating).map_or(0, |r| r.weight);
            if weight == 0 || rating < min {
                return false;
            }
        }

        if let (Some(low), Some(high)) = (
            self.armed_num(FilterSlot::LevelLow),
            self.armed_num(FilterSlot::LevelHigh),
        ) {
            let Some(level) = song.num(Tag::DanceLevel) else {
                return false;
            };
            let weight = self.tables.level(level).map_or(0, |l| l.weight);
            if weight == 0 || level < low || level > high {
                return false;
            }
        }

        if let Some(want) = self.armed_num(FilterSlot::Status) {
            if song.num(Tag::Status) != Some(want) {
                return false;
            }
        }

        if let Some(want) = self.armed_num(FilterSlot::Favorite) {
            if song.num(Tag::Favorite).unwrap_or(0) != want {
                return false;
            }
        }

        if self.armed(FilterSlot::StatusPlayable).is_some() {
            let status = song.num(Tag::Status).unwrap_or(0);
            if !self.tables.status(status).is_some_and(|s| s.playable) {
                return false;
            }
        }

        if let Some(list) = dance_list {
            let range = dance.and_then(|d| list.get(&d)).copied().unwrap_or_default();
            if range.is_active() && !song.num(Tag::Bpm).is_some_and(|bpm| range.contains(bpm)) {
                return false;
            }
        }

        if let Some(SlotValue::Keywords(Some(allowed))) = self.armed(FilterSlot::Keyword) {
            if let Some(keyword) = song.str(Tag::Keyword).filter(|k| !k.is_empty()) {
                if !allowed.contains(keyword) {
                    return false;
                }
            }
        }

        if let Some(SlotValue::Str(Some(needle))) = self.armed(FilterSlot::Search) {
            if !needle.is_empty() && !matches_search(song, needle) {
                return false;
            }
        }

        true
    }
}

/// Case-insensitive substring search; `needle` is already lowercase
fn matches_search(song: &Song, needle: &str) -> bool {
    let hit = |text: &str| text.to_lowercase().contains(needle);

    let leading = [Tag::Title, Tag::Artist, Tag::AlbumArtist, Tag::Notes, Tag::Keyword];
    let trailing = [Tag::Album, Tag::Composer, Tag::Conductor];

    leading.iter().any(|tag| song.str(*tag).is_some_and(hit))
        || song
            .list(Tag::Tags)
            .is_some_and(|tags| tags.iter().any(|t| hit(t.as_str())))
        || trailing.iter().any(|tag| song.str(*tag).is_some_and(hit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> SongFilter {
        SongFilter::new(Arc::new(DataTables::standard()))
    }

    fn song(dance: i64, rating: i64) -> Song {
        let mut song = Song::new("a.mp3");
        song.set(Tag::Dance, dance);
        song.set(Tag::DanceRating, rating);
        song
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let mut f = filter();
        assert!(matches!(
            f.set_str(FilterSlot::Dance, "Waltz"),
            Err(LibraryError::InvalidInput { .. })
        ));
        assert!(f.set_num(FilterSlot::Search, 1).is_err());
        assert!(!f.in_use(FilterSlot::Dance));
        assert!(!f.in_use(FilterSlot::Search));
    }

    #[test]
    fn test_search_stored_lowercase() {
        let mut f = filter();
        f.set_str(FilterSlot::Search, "MoOn").unwrap();
        assert_eq!(f.str(FilterSlot::Search), Some("moon"));
        f.set_str(FilterSlot::Playlist, "Friday Mix").unwrap();
        assert_eq!(f.str(FilterSlot::Playlist), Some("Friday Mix"));
    }

    #[test]
    fn test_off_keeps_value_and_on_rearms() {
        let mut f = filter();
        f.set_num(FilterSlot::Dance, 1).unwrap();
        f.off(FilterSlot::Dance);
        assert!(!f.in_use(FilterSlot::Dance));
        assert_eq!(f.num(FilterSlot::Dance), Some(1));
        assert!(f.filter_song(&song(0, 2)));

        assert!(f.on(FilterSlot::Dance));
        assert!(!f.filter_song(&song(0, 2)));

        f.clear(FilterSlot::Dance);
        assert!(!f.on(FilterSlot::Dance));
        assert_eq!(f.num(FilterSlot::Dance), None);
    }

    #[test]
    fn test_on_needs_non_trivial_value() {
        let mut f = filter();
        f.set_num(FilterSlot::Genre, -1).unwrap();
        f.off(FilterSlot::Genre);
        assert!(!f.on(FilterSlot::Genre));

        f.set_dance_list(BTreeMap::new());
        f.off(FilterSlot::DanceList);
        assert!(!f.on(FilterSlot::DanceList));

        f.set_keywords(Arc::new(BTreeSet::new()));
        f.off(FilterSlot::Keyword);
        assert!(f.on(FilterSlot::Keyword));
    }

    #[test]
    fn test_rating_weight_zero_always_rejects() {
        let mut f = filter();
        f.set_num(FilterSlot::Rating, 0).unwrap();

        // "Bad" has weight 0
        assert!(!f.filter_song(&song(0, 1)));
        assert!(f.filter_song(&song(0, 0)));
        assert!(!f.filter_song(&Song::new("unrated.mp3")));
    }

    #[test]
    fn test_rating_threshold() {
        let mut f = filter();
        f.set_num(FilterSlot::Rating, 3).unwrap();
        assert!(!f.filter_song(&song(0, 2)));
        assert!(f.filter_song(&song(0, 3)));
        assert!(f.filter_song(&song(0, 4)));
    }

    #[test]
    fn test_level_needs_both_bounds() {
        let mut f = filter();
        let mut easy = Song::new("a.mp3");
        easy.set(Tag::DanceLevel, 0);

        f.set_num(FilterSlot::LevelLow, 1).unwrap();
        assert!(f.filter_song(&easy));

        f.set_num(FilterSlot::LevelHigh, 2).unwrap();
        assert!(!f.filter_song(&easy));
        easy.set(Tag::DanceLevel, 2);
        assert!(f.filter_song(&easy));
        assert!(!f.filter_song(&Song::new("b.mp3")));
    }

    #[test]
    fn test_status_and_favorite() {
        let mut f = filter();
        let mut s = Song::new("a.mp3");

        f.set_num(FilterSlot::Favorite, 0).unwrap();
        assert!(f.filter_song(&s));
        s.set(Tag::Favorite, 2);
        assert!(!f.filter_song(&s));
        f.clear(FilterSlot::Favorite);

        f.set_num(FilterSlot::Status, 1).unwrap();
        assert!(!f.filter_song(&s));
        s.set(Tag::Status, 1);
        assert!(f.filter_song(&s));
    }

    #[test]
    fn test_status_playable() {
        let mut f = filter();
        f.set_num(FilterSlot::StatusPlayable, 1).unwrap();

        let mut s = Song::new("a.mp3");
        assert!(f.filter_song(&s));
        s.set(Tag::Status, 2);
        assert!(!f.filter_song(&s));
        s.set(Tag::Status, 1);
        assert!(f.filter_song(&s));
    }

    #[test]
    fn test_dance_list_and_bpm() {
        let mut f = filter();
        let mut dances = BTreeMap::new();
        dances.insert(0, BpmRange::new(84, 90));
        dances.insert(1, BpmRange::default());
        f.set_dance_list(dances);

        let mut waltz = song(0, 2);
        assert!(!f.filter_song(&waltz));
        waltz.set(Tag::Bpm, 87);
        assert!(f.filter_song(&waltz));
        waltz.set(Tag::Bpm, 120);
        assert!(!f.filter_song(&waltz));

        // Tango has no bounds, BPM ignored
        assert!(f.filter_song(&song(1, 2)));
        assert!(!f.filter_song(&song(3, 2)));
        assert!(!f.filter_song(&Song::new("none.mp3")));
    }

    #[test]
    fn test_keyword_allow_list() {
        let mut f = filter();
        let allowed: BTreeSet<String> = ["competition".to_string()].into();
        f.set_keywords(Arc::new(allowed));

        let mut s = Song::new("a.mp3");
        assert!(f.filter_song(&s));
        s.set(Tag::Keyword, "");
        assert!(f.filter_song(&s));
        s.set(Tag::Keyword, "competition");
        assert!(f.filter_song(&s));
        s.set(Tag::Keyword, "practice");
        assert!(!f.filter_song(&s));

        f.set_keywords(Arc::new(BTreeSet::new()));
        assert!(!f.filter_song(&s));
        s.remove(Tag::Keyword);
        assert!(f.filter_song(&s));
    }

    #[test]
    fn test_search_fields() {
        let mut f = filter();
        f.set_str(FilterSlot::Search, "RIVER").unwrap();

        let mut s = Song::new("a.mp3");
        assert!(!f.filter_song(&s));
        s.set(Tag::Tags, vec!["slow".to_string(), "Riverside".to_string()]);
        assert!(f.filter_song(&s));

        let mut t = Song::new("river.mp3");
        assert!(!f.filter_song(&t));
        t.set(Tag::Conductor, "Jack Rivers");
        assert!(f.filter_song(&t));
    }

    #[test]
    fn test_mutation_marks_stale() {
        let mut f = filter();
        assert!(f.needs_process());
        f.processed = true;
        f.hits.push(Hit {
            key: String::new(),
            seq: 0,
            dbidx: 4,
        });
        assert_eq!(f.get_by_position(0), Some(4));

        f.set_sort("TITLE");
        assert!(f.needs_process());
        assert_eq!(f.get_by_position(0), None);
        assert_eq!(f.count(), 0);
    }
}
