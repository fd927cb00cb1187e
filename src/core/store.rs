//! Persisted application state.
//!
//! Two entries survive restarts: the theme (`theme`) and the conversation
//! history (`chatHistory`). They live behind a small key-value interface so
//! the controller can be tested against memory while the application writes
//! one file per key into its data directory.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::core::config::path_display;
use crate::core::conversation::Conversation;

pub const THEME_KEY: &str = "theme";
pub const HISTORY_KEY: &str = "chatHistory";

#[derive(Debug)]
pub enum StoreError {
    Io { key: String, source: io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io { key, source } => write!(f, "Failed to write {key}: {source}"),
            StoreError::Serialize(err) => write!(f, "Failed to serialize history: {err}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Serialize(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialize(err)
    }
}

pub trait KeyValueStore: Send + Sync {
    /// `None` when the key was never written or cannot be read.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One file per key under a directory; writes go through a temp file and
/// a rename.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(value.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file.persist(path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path_display(&path), error = %err, "failed to read stored value");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        self.write_atomic(&path, value)
            .map_err(|source| StoreError::Io {
                key: key.to_string(),
                source,
            })?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(ThemeMode::Dark),
            "light" => Some(ThemeMode::Light),
            _ => None,
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed access to the two persisted entries.
pub struct PersistentState {
    store: Box<dyn KeyValueStore>,
}

impl PersistentState {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryKeyValueStore::new()))
    }

    /// Stored theme, or dark when absent or unrecognised.
    pub fn load_theme(&self) -> ThemeMode {
        self.store
            .get(THEME_KEY)
            .and_then(|raw| ThemeMode::parse(&raw))
            .unwrap_or_default()
    }

    pub fn save_theme(&self, theme: ThemeMode) -> Result<(), StoreError> {
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Stored history, newest first. Malformed data is logged and dropped.
    pub fn load_history(&self) -> Vec<Conversation> {
        let Some(raw) = self.store.get(HISTORY_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(err) => {
                warn!(error = %err, "stored chat history is malformed, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save_history(&self, history: &[Conversation]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(history)?;
        self.store.set(HISTORY_KEY, &raw)
    }
}
