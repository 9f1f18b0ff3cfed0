//! Best score persistence
//!
//! Backends:
//! - `MemoryStore`: in-process, for tests and throwaway sessions
//! - `FileStore`: JSON file in the user's config directory (native)
//! - `LocalStore`: browser LocalStorage (wasm32)
//!
//! Every backend keys the value by [`BEST_SCORE_KEY`](crate::consts::BEST_SCORE_KEY).
//! Callers treat failures as non-fatal: log and carry on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::Settings;
use crate::consts::BEST_SCORE_KEY;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt score file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Simple synchronous key-value storage for the best score
pub trait BestScoreStore {
    /// Stored best score, 0 when nothing was saved yet
    fn load_best_score(&self) -> Result<u64, StorageError>;

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError>;

    /// Persist player preferences; backends without a settings slot ignore them
    fn save_settings(&mut self, _settings: &Settings) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Keeps the best score in memory only
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    best: Option<u64>,
    /// Number of successful saves
    pub saves: u32,
    /// Simulate an unavailable backend
    pub fail: bool,
    /// Last settings handed to `save_settings`
    pub settings: Option<Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u64) -> Self {
        Self {
            best: Some(best),
            ..Self::default()
        }
    }

    /// A store whose every call fails
    pub fn broken() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn stored(&self) -> Option<u64> {
        self.best
    }
}

impl BestScoreStore for MemoryStore {
    fn load_best_score(&self) -> Result<u64, StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        Ok(self.best.unwrap_or(0))
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        self.best = Some(score);
        self.saves += 1;
        Ok(())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Unavailable);
        }
        self.settings = Some(settings.clone());
        Ok(())
    }
}

const FILENAME: &str = "scores.json";

/// JSON key-value file, `{ "monster-best-score": 1234 }`
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/monster-drop/scores.json`, falling back to `~/.config`
    pub fn in_config_dir() -> Self {
        let base = match std::env::var("XDG_CONFIG_HOME") {
            Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
            _ => std::env::var("HOME")
                .map(|h| PathBuf::from(h).join(".config"))
                .unwrap_or_else(|_| PathBuf::from(".")),
        };
        Self::new(base.join("monster-drop").join(FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, u64>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl BestScoreStore for FileStore {
    fn load_best_score(&self) -> Result<u64, StorageError> {
        Ok(self.read_map()?.get(BEST_SCORE_KEY).copied().unwrap_or(0))
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        // Keep unrelated keys; a corrupt file is overwritten, an unreadable one is not
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Json(e)) => {
                log::warn!("Replacing corrupt score file {}: {}", self.path.display(), e);
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        map.insert(BEST_SCORE_KEY.to_string(), score);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&map)?)?;
        Ok(())
    }
}

/// Browser LocalStorage, value stored as a plain integer string
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

#[cfg(target_arch = "wasm32")]
impl LocalStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl BestScoreStore for LocalStore {
    fn load_best_score(&self) -> Result<u64, StorageError> {
        let storage = Self::storage()?;
        let value = storage
            .get_item(BEST_SCORE_KEY)
            .map_err(|_| StorageError::Unavailable)?;
        // Unparseable values count as no score, like a fresh install
        Ok(value.and_then(|v| v.trim().parse().ok()).unwrap_or(0))
    }

    fn save_best_score(&mut self, score: u64) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(BEST_SCORE_KEY, &score.to_string())
            .map_err(|_| StorageError::Unavailable)?;
        log::info!("Best score saved ({})", score);
        Ok(())
    }

    fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        settings.save();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("monster-drop-test-{}-{}", std::process::id(), name))
            .join(FILENAME)
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load_best_score().unwrap(), 0);
        store.save_best_score(42).unwrap();
        assert_eq!(store.load_best_score().unwrap(), 42);
        assert_eq!(store.saves, 1);
    }

    #[test]
    fn test_broken_store() {
        let mut store = MemoryStore::broken();
        assert!(matches!(
            store.load_best_score(),
            Err(StorageError::Unavailable)
        ));
        assert!(store.save_best_score(1).is_err());
        assert_eq!(store.stored(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let path = temp_path("roundtrip");
        let _ = fs::remove_file(&path);
        let mut store = FileStore::new(&path);

        assert_eq!(store.load_best_score().unwrap(), 0);
        store.save_best_score(128).unwrap();
        assert_eq!(FileStore::new(&path).load_best_score().unwrap(), 128);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains(BEST_SCORE_KEY));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_corrupt() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        let mut store = FileStore::new(&path);

        assert!(matches!(store.load_best_score(), Err(StorageError::Json(_))));
        // Saving repairs the file
        store.save_best_score(8).unwrap();
        assert_eq!(store.load_best_score().unwrap(), 8);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_file_store_unreadable_is_not_overwritten() {
        // A directory where the file should be: reading fails with an io error
        let path = temp_path("unreadable");
        fs::create_dir_all(&path).unwrap();
        let mut store = FileStore::new(&path);

        assert!(matches!(store.save_best_score(5), Err(StorageError::Io(_))));
        assert!(path.is_dir());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_memory_store_keeps_settings() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            continuous_drop: true,
            ..Settings::default()
        };
        store.save_settings(&settings).unwrap();
        assert_eq!(store.settings, Some(settings));

        let mut broken = MemoryStore::broken();
        assert!(broken.save_settings(&Settings::default()).is_err());
        assert_eq!(broken.settings, None);
    }
}
