//! Domain models for the dance library
//!
//! A [`Song`] is a flat map from [`Tag`] to [`TagValue`], mirroring the
//! tag-name/value lists produced by audio tag readers. The handful of fields
//! the library itself relies on (path, record number, logical index) have
//! typed accessors.

use bridge_traits::RecordNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::tables::TableKind;

// =============================================================================
// ID Types
// =============================================================================

/// Logical index of a song within a loaded library session.
///
/// Persisted songs occupy `0..count` in path order; temporary songs follow.
/// Signed so callers can pass through "no selection" values, which lookups
/// reject.
pub type DbIdx = i64;

// =============================================================================
// Tags
// =============================================================================

/// Known song tags.
///
/// Declaration order is the order tags are written to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tag {
    File,
    DbAddDate,
    LastUpdated,
    Rrn,
    Dance,
    DanceLevel,
    DanceRating,
    Genre,
    Status,
    Favorite,
    Title,
    Artist,
    AlbumArtist,
    Album,
    Composer,
    Conductor,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    DiscTotal,
    Bpm,
    Duration,
    Date,
    Keyword,
    Tags,
    Notes,
}

/// How a tag's value is held in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// Free text
    Str,
    /// Integer
    Num,
    /// Space-separated words
    List,
    /// Display name persisted, table index held in memory
    Indexed(TableKind),
}

impl Tag {
    pub const ALL: [Tag; 26] = [
        Tag::File,
        Tag::DbAddDate,
        Tag::LastUpdated,
        Tag::Rrn,
        Tag::Dance,
        Tag::DanceLevel,
        Tag::DanceRating,
        Tag::Genre,
        Tag::Status,
        Tag::Favorite,
        Tag::Title,
        Tag::Artist,
        Tag::AlbumArtist,
        Tag::Album,
        Tag::Composer,
        Tag::Conductor,
        Tag::TrackNumber,
        Tag::TrackTotal,
        Tag::DiscNumber,
        Tag::DiscTotal,
        Tag::Bpm,
        Tag::Duration,
        Tag::Date,
        Tag::Keyword,
        Tag::Tags,
        Tag::Notes,
    ];

    /// Name used in records and sort specifications
    pub fn name(&self) -> &'static str {
        match self {
            Tag::File => "FILE",
            Tag::DbAddDate => "DBADDDATE",
            Tag::LastUpdated => "LASTUPDATED",
            Tag::Rrn => "RRN",
            Tag::Dance => "DANCE",
            Tag::DanceLevel => "DANCELEVEL",
            Tag::DanceRating => "DANCERATING",
            Tag::Genre => "GENRE",
            Tag::Status => "STATUS",
            Tag::Favorite => "FAVORITE",
            Tag::Title => "TITLE",
            Tag::Artist => "ARTIST",
            Tag::AlbumArtist => "ALBUMARTIST",
            Tag::Album => "ALBUM",
            Tag::Composer => "COMPOSER",
            Tag::Conductor => "CONDUCTOR",
            Tag::TrackNumber => "TRACKNUMBER",
            Tag::TrackTotal => "TRACKTOTAL",
            Tag::DiscNumber => "DISCNUMBER",
            Tag::DiscTotal => "DISCTOTAL",
            Tag::Bpm => "BPM",
            Tag::Duration => "DURATION",
            Tag::Date => "DATE",
            Tag::Keyword => "KEYWORD",
            Tag::Tags => "TAGS",
            Tag::Notes => "NOTES",
        }
    }

    /// Look up a tag by name, ignoring ASCII case
    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name().eq_ignore_ascii_case(name))
    }

    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Dance => TagKind::Indexed(TableKind::Dance),
            Tag::DanceLevel => TagKind::Indexed(TableKind::Level),
            Tag::DanceRating => TagKind::Indexed(TableKind::Rating),
            Tag::Genre => TagKind::Indexed(TableKind::Genre),
            Tag::Status => TagKind::Indexed(TableKind::Status),
            Tag::Favorite => TagKind::Indexed(TableKind::Favorite),
            Tag::LastUpdated
            | Tag::Rrn
            | Tag::TrackNumber
            | Tag::TrackTotal
            | Tag::DiscNumber
            | Tag::DiscTotal
            | Tag::Bpm
            | Tag::Duration => TagKind::Num,
            Tag::Tags => TagKind::List,
            _ => TagKind::Str,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single tag value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagValue {
    Str(String),
    Num(i64),
    List(Vec<String>),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<i64> {
        match self {
            TagValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TagValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(s) => f.write_str(s),
            TagValue::Num(n) => write!(f, "{}", n),
            TagValue::List(items) => f.write_str(&items.join(" ")),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Num(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Num(i64::from(value))
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        TagValue::Num(i64::from(value))
    }
}

impl From<Vec<String>> for TagValue {
    fn from(value: Vec<String>) -> Self {
        TagValue::List(value)
    }
}

// =============================================================================
// Song
// =============================================================================

/// One audio file's metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Song {
    tags: BTreeMap<Tag, TagValue>,
    dbidx: Option<DbIdx>,
    temporary: bool,
}

impl Song {
    /// Create a song for the audio file at `path` (relative to the music
    /// directory, or absolute)
    pub fn new(path: impl Into<String>) -> Self {
        let mut song = Self::default();
        song.set(Tag::File, TagValue::Str(path.into()));
        song
    }

    pub fn get(&self, tag: Tag) -> Option<&TagValue> {
        self.tags.get(&tag)
    }

    pub fn set(&mut self, tag: Tag, value: impl Into<TagValue>) {
        self.tags.insert(tag, value.into());
    }

    pub fn remove(&mut self, tag: Tag) -> Option<TagValue> {
        self.tags.remove(&tag)
    }

    pub fn has(&self, tag: Tag) -> bool {
        self.tags.contains_key(&tag)
    }

    /// String value of `tag`, if it holds one
    pub fn str(&self, tag: Tag) -> Option<&str> {
        self.get(tag).and_then(TagValue::as_str)
    }

    /// Numeric value of `tag`, if it holds one
    ///
    /// Indexed tags whose name had no table entry read as unset here.
    pub fn num(&self, tag: Tag) -> Option<i64> {
        self.get(tag).and_then(TagValue::as_num)
    }

    pub fn list(&self, tag: Tag) -> Option<&[String]> {
        self.get(tag).and_then(TagValue::as_list)
    }

    /// All tags in record order
    pub fn tags(&self) -> impl Iterator<Item = (Tag, &TagValue)> {
        self.tags.iter().map(|(tag, value)| (*tag, value))
    }

    /// Storage path, the song's unique key
    pub fn path(&self) -> Option<&str> {
        self.str(Tag::File)
    }

    /// Record number, if the song has been written
    pub fn rrn(&self) -> Option<RecordNumber> {
        self.num(Tag::Rrn)
            .filter(|rrn| *rrn > 0)
            .and_then(|rrn| RecordNumber::try_from(rrn).ok())
    }

    pub fn set_rrn(&mut self, rrn: RecordNumber) {
        self.set(Tag::Rrn, i64::from(rrn));
    }

    /// Logical index assigned by the library index
    pub fn dbidx(&self) -> Option<DbIdx> {
        self.dbidx
    }

    pub(crate) fn set_dbidx(&mut self, dbidx: DbIdx) {
        self.dbidx = Some(dbidx);
    }

    /// Session-only songs are never written to the record store
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    pub(crate) fn mark_temporary(&mut self) {
        self.temporary = true;
    }
}
