//! Record codec
//!
//! A record is a flat list of `NAME\n..value\n` pairs. `FILE` always comes
//! first; `LASTUPDATED` and `RRN` always come last, wherever they sit in the
//! song. Other tools read the same store, so the layout is fixed.
//!
//! ```text
//! FILE
//! ..waltz/moon-river.mp3
//! DANCE
//! ..Waltz
//! TITLE
//! ..Moon River
//! STATUS
//! ..New
//! LASTUPDATED
//! ..1700000000
//! RRN
//! ..12
//! ```

use bridge_traits::RecordNumber;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::debug;

use crate::error::{LibraryError, Result};
use crate::models::{Song, Tag, TagKind, TagValue};
use crate::tables::DataTables;

/// Marker in front of every value line
pub const VALUE_PREFIX: &str = "..";

/// Creation date format used by `DBADDDATE`
pub const ADD_DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-write values the encoder stamps onto a record
#[derive(Debug, Clone, Copy)]
pub struct WriteStamp {
    /// Slot the record is written to
    pub rrn: RecordNumber,
    /// First write of this song
    pub is_new: bool,
    /// Write time
    pub now: DateTime<Utc>,
}

/// Convert a raw record value into its in-memory form
pub fn parse_value(tag: Tag, raw: &str, tables: &DataTables) -> TagValue {
    match tag.kind() {
        TagKind::Str => TagValue::Str(raw.to_string()),
        TagKind::List => TagValue::List(raw.split_whitespace().map(str::to_string).collect()),
        TagKind::Num => parse_number(raw)
            .map(TagValue::Num)
            .unwrap_or_else(|| TagValue::Str(raw.to_string())),
        TagKind::Indexed(kind) => tables
            .index(kind, raw)
            .map(TagValue::Num)
            .unwrap_or_else(|| TagValue::Str(raw.to_string())),
    }
}

/// Leading integer of a numeric tag (`"3/12"` reads as 3, `"120.6"` as 121)
fn parse_number(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let head = raw.split('/').next().unwrap_or(raw).trim();
    head.parse::<i64>()
        .ok()
        .or_else(|| head.parse::<f64>().ok().map(|f| f.round() as i64))
}

/// Render an in-memory value for a record
pub fn format_value(tag: Tag, value: &TagValue, tables: &DataTables) -> String {
    let text = match (tag.kind(), value) {
        (TagKind::Indexed(kind), TagValue::Num(idx)) => tables
            .name(kind, *idx)
            .map(str::to_string)
            .unwrap_or_else(|| idx.to_string()),
        _ => value.to_string(),
    };
    flatten(text)
}

/// Values are line-delimited and slots end at the first NUL
fn flatten(text: String) -> String {
    if text.contains(['\n', '\r', '\0']) {
        text.replace(['\n', '\r'], " ").replace('\0', "")
    } else {
        text
    }
}

fn push_pair(buf: &mut String, tag: Tag, value: &str) {
    // Writing to a String cannot fail
    let _ = write!(buf, "{}\n{}{}\n", tag.name(), VALUE_PREFIX, value);
}

/// Serialize `song` for the slot in `stamp`
pub fn encode(song: &Song, stamp: &WriteStamp, tables: &DataTables) -> String {
    let mut buf = String::new();
    push_pair(
        &mut buf,
        Tag::File,
        &flatten(song.path().unwrap_or_default().to_string()),
    );

    let mut has_status = false;
    for (tag, value) in song.tags() {
        match tag {
            Tag::File | Tag::LastUpdated | Tag::Rrn => continue,
            Tag::DbAddDate if stamp.is_new => continue,
            Tag::Status => has_status = true,
            _ => {}
        }
        push_pair(&mut buf, tag, &format_value(tag, value, tables));
    }

    if stamp.is_new {
        let date = stamp.now.format(ADD_DATE_FORMAT).to_string();
        push_pair(&mut buf, Tag::DbAddDate, &date);
    }
    if !has_status {
        push_pair(&mut buf, Tag::Status, tables.default_status());
    }
    push_pair(&mut buf, Tag::LastUpdated, &stamp.now.timestamp().to_string());
    push_pair(&mut buf, Tag::Rrn, &stamp.rrn.to_string());

    buf
}

/// Deserialize a record
///
/// Unknown tag names are dropped. The record must name its audio file.
pub fn decode(bytes: &[u8], tables: &DataTables) -> Result<Song> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LibraryError::Decode(format!("record is not UTF-8: {}", e)))?;

    let mut song = Song::default();
    let mut lines = text.lines();
    while let Some(name) = lines.next() {
        if name.is_empty() {
            continue;
        }
        let value_line = lines
            .next()
            .ok_or_else(|| LibraryError::Decode(format!("tag {} has no value", name)))?;
        let raw = value_line.strip_prefix(VALUE_PREFIX).ok_or_else(|| {
            LibraryError::Decode(format!("value for {} lacks the value marker", name))
        })?;

        match Tag::from_name(name) {
            Some(tag) => song.set(tag, parse_value(tag, raw, tables)),
            None => debug!(tag = name, "Dropping unknown tag"),
        }
    }

    match song.path() {
        Some(path) if !path.is_empty() => Ok(song),
        _ => Err(LibraryError::Decode("record has no FILE tag".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(rrn: RecordNumber, is_new: bool) -> WriteStamp {
        WriteStamp {
            rrn,
            is_new,
            now: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn test_encode_new_record_layout() {
        let tables = DataTables::standard();
        let mut song = Song::new("waltz/moon-river.mp3");
        song.set(Tag::Title, "Moon River");
        song.set(Tag::Dance, 0);

        let text = encode(&song, &stamp(12, true), &tables);
        assert_eq!(
            text,
            "FILE\n..waltz/moon-river.mp3\n\
             DANCE\n..Waltz\n\
             TITLE\n..Moon River\n\
             DBADDDATE\n..2023-11-14\n\
             STATUS\n..New\n\
             LASTUPDATED\n..1700000000\n\
             RRN\n..12\n"
        );
    }

    #[test]
    fn test_encode_existing_record_moves_trailer_to_end() {
        let tables = DataTables::standard();
        let mut song = Song::new("a.mp3");
        song.set_rrn(3);
        song.set(Tag::LastUpdated, 5);
        song.set(Tag::DbAddDate, "2020-01-01");
        song.set(Tag::Status, 1);

        let text = encode(&song, &stamp(3, false), &tables);
        assert_eq!(
            text,
            "FILE\n..a.mp3\n\
             DBADDDATE\n..2020-01-01\n\
             STATUS\n..Complete\n\
             LASTUPDATED\n..1700000000\n\
             RRN\n..3\n"
        );
    }

    #[test]
    fn test_encode_new_record_replaces_add_date() {
        let tables = DataTables::standard();
        let mut song = Song::new("a.mp3");
        song.set(Tag::DbAddDate, "1999-01-01");

        let text = encode(&song, &stamp(1, true), &tables);
        assert_eq!(text.matches("DBADDDATE").count(), 1);
        assert!(text.contains("DBADDDATE\n..2023-11-14\n"));
    }

    #[test]
    fn test_unknown_table_name_survives() {
        let tables = DataTables::standard();
        let song = decode(b"FILE\n..a.mp3\nDANCE\n..Lindy Hop\n", &tables).unwrap();
        assert_eq!(song.num(Tag::Dance), None);
        assert_eq!(song.str(Tag::Dance), Some("Lindy Hop"));

        let text = encode(&song, &stamp(1, false), &tables);
        assert!(text.contains("DANCE\n..Lindy Hop\n"));
    }

    #[test]
    fn test_decode_values() {
        let tables = DataTables::standard();
        let record = "FILE\n..b.mp3\nDANCE\n..tango\nTRACKNUMBER\n..3/12\nBPM\n..126.4\n\
                      TAGS\n..slow  dramatic\nMOOD\n..happy\nRRN\n..9\n";
        let song = decode(record.as_bytes(), &tables).unwrap();

        assert_eq!(song.num(Tag::Dance), Some(1));
        assert_eq!(song.num(Tag::TrackNumber), Some(3));
        assert_eq!(song.num(Tag::Bpm), Some(126));
        assert_eq!(
            song.list(Tag::Tags),
            Some(&["slow".to_string(), "dramatic".to_string()][..])
        );
        assert_eq!(song.rrn(), Some(9));
        assert_eq!(song.tags().count(), 6);
    }

    #[test]
    fn test_decode_errors() {
        let tables = DataTables::standard();
        assert!(decode(b"TITLE\n..no file\n", &tables).is_err());
        assert!(decode(b"FILE\na.mp3\n", &tables).is_err());
        assert!(decode(b"FILE\n", &tables).is_err());
        assert!(decode(&[0xff, 0xfe], &tables).is_err());
    }

    #[test]
    fn test_multiline_values_flattened() {
        let tables = DataTables::standard();
        let mut song = Song::new("a.mp3");
        song.set(Tag::Notes, "line one\nline two");

        let text = encode(&song, &stamp(1, false), &tables);
        let decoded = decode(text.as_bytes(), &tables).unwrap();
        assert_eq!(decoded.str(Tag::Notes), Some("line one line two"));
    }

    #[test]
    fn test_nul_stripped_from_values() {
        let tables = DataTables::standard();
        let mut song = Song::new("a.mp3");
        song.set(Tag::Title, "Bad\0Title");
        song.set(Tag::Artist, "Someone");

        let text = encode(&song, &stamp(1, false), &tables);
        assert!(!text.contains('\0'));
        let decoded = decode(text.as_bytes(), &tables).unwrap();
        assert_eq!(decoded.str(Tag::Title), Some("BadTitle"));
        assert_eq!(decoded.str(Tag::Artist), Some("Someone"));
    }
}
