//! Filter display preferences
//!
//! Which filter categories the host shows to the user, persisted as one
//! boolean per category in the settings store.

use bridge_traits::SettingsStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::Result;

/// A filter category the host can show or hide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterDisplayKey {
    Dance,
    DanceLevel,
    DanceRating,
    Favorite,
    Genre,
    Status,
    StatusPlayable,
}

impl FilterDisplayKey {
    pub const ALL: [FilterDisplayKey; 7] = [
        FilterDisplayKey::Dance,
        FilterDisplayKey::DanceLevel,
        FilterDisplayKey::DanceRating,
        FilterDisplayKey::Favorite,
        FilterDisplayKey::Genre,
        FilterDisplayKey::Status,
        FilterDisplayKey::StatusPlayable,
    ];

    /// Settings key
    pub fn name(&self) -> &'static str {
        match self {
            FilterDisplayKey::Dance => "DANCE",
            FilterDisplayKey::DanceLevel => "DANCELEVEL",
            FilterDisplayKey::DanceRating => "DANCERATING",
            FilterDisplayKey::Favorite => "FAVORITE",
            FilterDisplayKey::Genre => "GENRE",
            FilterDisplayKey::Status => "STATUS",
            FilterDisplayKey::StatusPlayable => "STATUSPLAYABLE",
        }
    }

    /// Value used when the settings file has no entry; older files only
    /// knew dance and rating, which were always shown
    pub fn default_visible(&self) -> bool {
        matches!(self, FilterDisplayKey::Dance | FilterDisplayKey::DanceRating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDisplay {
    visible: BTreeMap<FilterDisplayKey, bool>,
}

impl Default for FilterDisplay {
    fn default() -> Self {
        Self {
            visible: FilterDisplayKey::ALL
                .iter()
                .map(|key| (*key, key.default_visible()))
                .collect(),
        }
    }
}

impl FilterDisplay {
    /// Read every key from `settings`, defaulting the missing ones
    pub fn load(settings: &dyn SettingsStore) -> Result<Self> {
        let mut shown = Self::default();
        for key in FilterDisplayKey::ALL {
            if let Some(value) = settings.get_bool(key.name())? {
                shown.visible.insert(key, value);
            }
        }
        debug!(visible = ?shown.visible, "Loaded filter display settings");
        Ok(shown)
    }

    /// Write every key to `settings` and flush
    pub fn save(&self, settings: &mut dyn SettingsStore) -> Result<()> {
        for (key, value) in &self.visible {
            settings.set_bool(key.name(), *value)?;
        }
        settings.flush()?;
        Ok(())
    }

    pub fn is_visible(&self, key: FilterDisplayKey) -> bool {
        self.visible
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.default_visible())
    }

    pub fn set_visible(&mut self, key: FilterDisplayKey, visible: bool) {
        self.visible.insert(key, visible);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::BridgeError;

    mockall::mock! {
        Settings {}
        impl SettingsStore for Settings {
            fn set_bool(&mut self, key: &str, value: bool) -> std::result::Result<(), BridgeError>;
            fn get_bool(&self, key: &str) -> std::result::Result<Option<bool>, BridgeError>;
            fn flush(&mut self) -> std::result::Result<(), BridgeError>;
        }
    }

    #[test]
    fn test_defaults_when_missing() {
        let mut settings = MockSettings::new();
        settings.expect_get_bool().returning(|_| Ok(None));

        let display = FilterDisplay::load(&settings).unwrap();
        assert!(display.is_visible(FilterDisplayKey::Dance));
        assert!(display.is_visible(FilterDisplayKey::DanceRating));
        assert!(!display.is_visible(FilterDisplayKey::Genre));
        assert!(!display.is_visible(FilterDisplayKey::StatusPlayable));
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let mut settings = MockSettings::new();
        settings
            .expect_get_bool()
            .returning(|key| Ok(matches!(key, "DANCE" | "GENRE").then_some(key == "GENRE")));

        let display = FilterDisplay::load(&settings).unwrap();
        assert!(!display.is_visible(FilterDisplayKey::Dance));
        assert!(display.is_visible(FilterDisplayKey::Genre));
        assert!(display.is_visible(FilterDisplayKey::DanceRating));
    }

    #[test]
    fn test_save_writes_every_key() {
        let mut settings = MockSettings::new();
        settings
            .expect_set_bool()
            .withf(|key, value| {
                let key: &str = key;
                *value == matches!(key, "DANCE" | "DANCERATING" | "STATUS")
            })
            .times(7)
            .returning(|_, _| Ok(()));
        settings.expect_flush().times(1).returning(|| Ok(()));

        let mut display = FilterDisplay::default();
        display.set_visible(FilterDisplayKey::Status, true);
        display.save(&mut settings).unwrap();
    }

    #[test]
    fn test_load_propagates_store_errors() {
        let mut settings = MockSettings::new();
        settings
            .expect_get_bool()
            .returning(|_| Err(BridgeError::OperationFailed("corrupt".to_string())));

        assert!(FilterDisplay::load(&settings).is_err());
    }
}
