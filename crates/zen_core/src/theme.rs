use serde::{Deserialize, Serialize};

use crate::platform::PersistentKeyValueStore;

/// Storage key holding the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Read the stored preference, falling back to the default on any problem.
    pub fn load(store: &dyn PersistentKeyValueStore) -> Self {
        match store.read(THEME_KEY) {
            Ok(Some(value)) => Self::from_str(&value).unwrap_or_else(|| {
                log::warn!("ignoring unknown theme preference {value:?}");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(error) => {
                log::warn!("failed to read theme preference: {error:?}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn PersistentKeyValueStore) -> anyhow::Result<()> {
        store.write(THEME_KEY, self.as_str())
    }
}
