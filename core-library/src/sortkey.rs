//! Composite sort keys
//!
//! A sort specification is a whitespace-separated list of tag names such as
//! `"DANCE TITLE"`. Each song gets one string key built from `/`-prefixed
//! segments, one per tag, so plain string comparison orders songs by the
//! first tag, then the second, and so on.
//!
//! Numeric segments are zero-padded. Date and timestamp segments are
//! inverted so newer songs sort first.

use chrono::{Datelike, NaiveDate};
use std::fmt::Write;
use tracing::warn;

use crate::models::{Song, Tag};
use crate::record::{self, ADD_DATE_FORMAT};
use crate::tables::{DataTables, TableKind};

/// Add-date segment for songs without a readable creation date
const UNKNOWN_DATE: &str = "9999-99-99";

/// Parsed sort specification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    tags: Vec<Tag>,
}

impl SortSpec {
    /// Parse a sort specification. Unknown tag names are logged and skipped.
    pub fn parse(spec: &str) -> Self {
        let mut tags = Vec::new();
        for token in spec.split_whitespace() {
            let Some(tag) = Tag::from_name(token) else {
                warn!(token, "Ignoring unknown sort tag");
                continue;
            };
            tags.push(tag);
            // Same-day additions fall back to title order
            if tag == Tag::DbAddDate {
                tags.push(Tag::Title);
            }
        }
        Self { tags }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Build `song`'s key under this specification
    pub fn key_for(&self, song: &Song, tables: &DataTables) -> String {
        let mut key = String::new();
        for &tag in &self.tags {
            push_segment(&mut key, song, tag, tables);
        }
        key
    }
}

fn push_segment(key: &mut String, song: &Song, tag: Tag, tables: &DataTables) {
    // Writing to a String cannot fail
    let _ = match tag {
        Tag::Dance => {
            let name = song
                .num(Tag::Dance)
                .and_then(|idx| tables.name(TableKind::Dance, idx))
                .or_else(|| song.str(Tag::Dance))
                .unwrap_or_default();
            write!(key, "/{}", name)
        }
        Tag::DanceLevel | Tag::DanceRating | Tag::Genre => {
            write!(key, "/{:02}", song.num(tag).unwrap_or(0))
        }
        Tag::DbAddDate => match song
            .str(Tag::DbAddDate)
            .and_then(|raw| NaiveDate::parse_from_str(raw, ADD_DATE_FORMAT).ok())
        {
            Some(date) => write!(
                key,
                "/{:04}-{:02}-{:02}",
                9999 - date.year(),
                99 - date.month(),
                99 - date.day()
            ),
            None => write!(key, "/{}", UNKNOWN_DATE),
        },
        Tag::LastUpdated => {
            let ts = song.num(Tag::LastUpdated).unwrap_or(0);
            write!(key, "/{:016x}", !(ts as u64))
        }
        Tag::TrackNumber => write!(
            key,
            "/{:03}/{:04}",
            song.num(Tag::DiscNumber).unwrap_or(1),
            song.num(Tag::TrackNumber).unwrap_or(1)
        ),
        Tag::Bpm => write!(key, "/{:03}", song.num(Tag::Bpm).unwrap_or(1)),
        _ => match song.get(tag) {
            Some(value) => write!(key, "/{}", record::format_value(tag, value, tables)),
            None => write!(key, "/"),
        },
    };
}
