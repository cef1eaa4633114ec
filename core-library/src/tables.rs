//! Data tables
//!
//! Dance, rating, level, status, genre and favorite songs store display
//! names on disk and table indices in memory. [`DataTables`] holds the
//! tables for one library session and is shared (behind an `Arc`) by the
//! record codec, the library index and every filter.
//!
//! Hosts normally load the tables from their own configuration files; all
//! types here are serde-friendly for that purpose. [`DataTables::standard`]
//! is a usable built-in set.

use serde::{Deserialize, Serialize};

/// Which table an indexed tag refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Dance,
    Level,
    Rating,
    Genre,
    Status,
    Favorite,
}

/// Inclusive BPM bounds. A zero on either side disables the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BpmRange {
    pub low: u32,
    pub high: u32,
}

impl BpmRange {
    pub fn new(low: u32, high: u32) -> Self {
        Self { low, high }
    }

    pub fn is_active(&self) -> bool {
        self.low > 0 && self.high > 0
    }

    pub fn contains(&self, bpm: i64) -> bool {
        bpm >= i64::from(self.low) && bpm <= i64::from(self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dance {
    pub name: String,
    #[serde(default)]
    pub bpm: BpmRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    pub name: String,
    /// Selection weight; zero excludes the rating from every filter
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    /// Selection weight; zero excludes the level from every filter
    pub weight: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub name: String,
    pub playable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub name: String,
}

/// The lookup tables for one library session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataTables {
    pub dances: Vec<Dance>,
    pub ratings: Vec<Rating>,
    pub levels: Vec<Level>,
    pub statuses: Vec<Status>,
    pub genres: Vec<Genre>,
    pub favorites: Vec<Favorite>,
}

fn to_index(idx: i64) -> Option<usize> {
    usize::try_from(idx).ok()
}

impl DataTables {
    /// Built-in ballroom tables
    pub fn standard() -> Self {
        let dance = |name: &str, low, high| Dance {
            name: name.to_string(),
            bpm: BpmRange::new(low, high),
        };
        let rating = |name: &str, weight| Rating {
            name: name.to_string(),
            weight,
        };
        let level = |name: &str, weight| Level {
            name: name.to_string(),
            weight,
        };
        let status = |name: &str, playable| Status {
            name: name.to_string(),
            playable,
        };
        let genre = |name: &str| Genre {
            name: name.to_string(),
        };
        let favorite = |name: &str| Favorite {
            name: name.to_string(),
        };

        Self {
            dances: vec![
                dance("Waltz", 84, 90),
                dance("Tango", 124, 132),
                dance("Viennese Waltz", 174, 180),
                dance("Foxtrot", 112, 120),
                dance("Quickstep", 200, 208),
                dance("Cha Cha", 120, 128),
                dance("Rumba", 100, 108),
                dance("Samba", 96, 104),
                dance("Jive", 168, 176),
                dance("Paso Doble", 120, 124),
                dance("Bolero", 96, 104),
                dance("West Coast Swing", 0, 0),
            ],
            ratings: vec![
                rating("Unrated", 1),
                rating("Bad", 0),
                rating("Good", 20),
                rating("Great", 40),
                rating("Excellent", 60),
            ],
            levels: vec![
                level("Easy", 10),
                level("Normal", 20),
                level("Advanced", 5),
            ],
            statuses: vec![
                status("New", true),
                status("Complete", true),
                status("Needs Fixing", false),
            ],
            genres: vec![
                genre("Ballroom"),
                genre("Classical"),
                genre("Jazz"),
                genre("Latin"),
                genre("Pop"),
                genre("Rock"),
            ],
            favorites: vec![
                favorite(""),
                favorite("Blue Star"),
                favorite("Red Heart"),
                favorite("Purple Heart"),
            ],
        }
    }

    /// Number of entries in `kind`'s table
    pub fn len(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Dance => self.dances.len(),
            TableKind::Level => self.levels.len(),
            TableKind::Rating => self.ratings.len(),
            TableKind::Genre => self.genres.len(),
            TableKind::Status => self.statuses.len(),
            TableKind::Favorite => self.favorites.len(),
        }
    }

    /// Display name of entry `idx` in `kind`'s table
    pub fn name(&self, kind: TableKind, idx: i64) -> Option<&str> {
        let idx = to_index(idx)?;
        let name = match kind {
            TableKind::Dance => &self.dances.get(idx)?.name,
            TableKind::Level => &self.levels.get(idx)?.name,
            TableKind::Rating => &self.ratings.get(idx)?.name,
            TableKind::Genre => &self.genres.get(idx)?.name,
            TableKind::Status => &self.statuses.get(idx)?.name,
            TableKind::Favorite => &self.favorites.get(idx)?.name,
        };
        Some(name)
    }

    /// Index of the entry named `name` in `kind`'s table, ignoring case
    pub fn index(&self, kind: TableKind, name: &str) -> Option<i64> {
        let names: Box<dyn Iterator<Item = &str>> = match kind {
            TableKind::Dance => Box::new(self.dances.iter().map(|d| d.name.as_str())),
            TableKind::Level => Box::new(self.levels.iter().map(|l| l.name.as_str())),
            TableKind::Rating => Box::new(self.ratings.iter().map(|r| r.name.as_str())),
            TableKind::Genre => Box::new(self.genres.iter().map(|g| g.name.as_str())),
            TableKind::Status => Box::new(self.statuses.iter().map(|s| s.name.as_str())),
            TableKind::Favorite => Box::new(self.favorites.iter().map(|f| f.name.as_str())),
        };
        names
            .into_iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(name))
            .and_then(|idx| i64::try_from(idx).ok())
    }

    pub fn dance(&self, idx: i64) -> Option<&Dance> {
        self.dances.get(to_index(idx)?)
    }

    pub fn rating(&self, idx: i64) -> Option<&Rating> {
        self.ratings.get(to_index(idx)?)
    }

    pub fn level(&self, idx: i64) -> Option<&Level> {
        self.levels.get(to_index(idx)?)
    }

    pub fn status(&self, idx: i64) -> Option<&Status> {
        self.statuses.get(to_index(idx)?)
    }

    /// Status written for songs that have none
    pub fn default_status(&self) -> &str {
        self.statuses
            .first()
            .map(|s| s.name.as_str())
            .unwrap_or("New")
    }
}
