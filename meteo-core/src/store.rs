//! Key-value persistence seam and the typed preferences kept in it.

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::model::UnitSystem;

pub const KEY_LAST_CITY: &str = "weather_last_city";
pub const KEY_FAVORITES: &str = "weather_favorites";
pub const KEY_THEME: &str = "weather_theme";
pub const KEY_UNIT: &str = "weather_unit";
pub const KEY_CACHED_SNAPSHOT: &str = "weather_cache_current";

/// String key-value storage. Each `set` replaces the value as a whole.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// A JSON object on disk. Writes go to a sibling temp file which is then
/// renamed over the original.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state file: {}", self.path.display()))?;

        // An unparsable file reads as empty; the next write replaces it.
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Ignoring unreadable state file: {e}"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create state directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(entries).context("Failed to serialize state")?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace state file: {}", self.path.display()))?;

        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut entries = self.load()?;
        f(&mut entries);
        self.write(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
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

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the user state kept in a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn last_city(&self) -> Result<Option<String>> {
        self.store.get(KEY_LAST_CITY)
    }

    pub fn set_last_city(&self, city: &str) -> Result<()> {
        self.store.set(KEY_LAST_CITY, city)
    }

    /// Stored unit system; unreadable values fall back to metric.
    pub fn units(&self) -> Result<UnitSystem> {
        Ok(self
            .store
            .get(KEY_UNIT)?
            .and_then(|s| UnitSystem::try_from(s.as_str()).ok())
            .unwrap_or_default())
    }

    pub fn stored_units(&self) -> Result<Option<UnitSystem>> {
        Ok(self
            .store
            .get(KEY_UNIT)?
            .and_then(|s| UnitSystem::try_from(s.as_str()).ok()))
    }

    pub fn set_units(&self, units: UnitSystem) -> Result<()> {
        self.store.set(KEY_UNIT, units.as_str())
    }

    pub fn theme(&self) -> Result<Theme> {
        Ok(match self.store.get(KEY_THEME)?.as_deref() {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        })
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(KEY_THEME, theme.as_str())
    }

    /// Flip the theme and return the new one.
    pub fn toggle_theme(&self) -> Result<Theme> {
        let theme = self.theme()?.toggled();
        self.set_theme(theme)?;
        Ok(theme)
    }

    pub fn favorites(&self) -> Result<Vec<String>> {
        match self.store.get(KEY_FAVORITES)? {
            Some(json) => serde_json::from_str(&json).context("Failed to parse favorites list"),
            None => Ok(Vec::new()),
        }
    }

    pub fn is_favorite(&self, city: &str) -> Result<bool> {
        Ok(self.favorites()?.iter().any(|c| c == city))
    }

    /// Returns false when the city was already a favorite.
    pub fn add_favorite(&self, city: &str) -> Result<bool> {
        let mut favs = self.favorites()?;
        if favs.iter().any(|c| c == city) {
            return Ok(false);
        }
        favs.push(city.to_string());
        self.save_favorites(&favs)?;
        Ok(true)
    }

    /// Returns false when the city was not a favorite.
    pub fn remove_favorite(&self, city: &str) -> Result<bool> {
        let mut favs = self.favorites()?;
        let before = favs.len();
        favs.retain(|c| c != city);
        if favs.len() == before {
            return Ok(false);
        }
        self.save_favorites(&favs)?;
        Ok(true)
    }

    fn save_favorites(&self, favs: &[String]) -> Result<()> {
        let json = serde_json::to_string(favs).context("Failed to serialize favorites list")?;
        self.store.set(KEY_FAVORITES, &json)
    }
}
