//! Persistence surface for user progress
//!
//! A [`ProgressStore`] is a single key/value blob per user scope. The engine
//! keeps one [`SaveData`] document in it, shared through [`SaveSlot`] by the
//! achievement controller (achievement records) and the reward system
//! (XP, level, statistics).

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::rewards::UserStatistics;

/// Blob storage for one user scope
pub trait ProgressStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, data: &str) -> Result<(), StorageError>;
}

/// Persisted progress for a single achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    pub id: String,
    #[serde(default)]
    pub progress: u64,
    #[serde(default)]
    pub earned: bool,
    #[serde(default)]
    pub earned_at: Option<i64>,
}

/// The document kept in a [`ProgressStore`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub achievements: Vec<AchievementRecord>,
    #[serde(default)]
    pub statistics: UserStatistics,
}

fn default_level() -> u32 {
    1
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            xp: 0,
            level: default_level(),
            achievements: Vec::new(),
            statistics: UserStatistics::default(),
        }
    }
}

/// Shared handle to the save document of one store
///
/// Clones share the same last-known-good document, so each owner can
/// rewrite its own section without clobbering the others.
#[derive(Clone)]
pub struct SaveSlot {
    store: Rc<dyn ProgressStore>,
    document: Rc<RefCell<Option<SaveData>>>,
}

impl SaveSlot {
    pub fn new(store: Rc<dyn ProgressStore>) -> Self {
        Self {
            store,
            document: Rc::new(RefCell::new(None)),
        }
    }

    /// Read the document, falling back to defaults on missing or corrupt data
    pub fn load(&self) -> SaveData {
        let data = match self.store.load() {
            Ok(Some(raw)) => match serde_json::from_str::<SaveData>(&raw) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Corrupt save data, starting fresh: {}", e);
                    SaveData::default()
                }
            },
            Ok(None) => {
                debug!("No save data found, starting fresh");
                SaveData::default()
            }
            Err(e) => {
                warn!("Failed to load save data, starting fresh: {}", e);
                SaveData::default()
            }
        };

        *self.document.borrow_mut() = Some(data.clone());
        data
    }

    /// The cached document, loading it on first use
    pub fn current(&self) -> SaveData {
        if let Some(data) = self.document.borrow().as_ref() {
            return data.clone();
        }
        self.load()
    }

    /// Apply `change` to the document and write it out.
    ///
    /// Returns `false` when the write failed; the in-memory document keeps
    /// the change either way.
    pub fn update<F>(&self, change: F) -> bool
    where
        F: FnOnce(&mut SaveData),
    {
        if self.document.borrow().is_none() {
            self.load();
        }

        let serialized = {
            let mut doc = self.document.borrow_mut();
            let data = doc.get_or_insert_with(SaveData::default);
            change(data);
            serde_json::to_string(data)
        };

        let result = serialized
            .map_err(StorageError::from)
            .and_then(|json| self.store.save(&json));

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save progress: {}", e);
                false
            }
        }
    }
}

/// Store backed by a `RefCell`, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(raw: &str) -> Self {
        Self {
            data: RefCell::new(Some(raw.to_string())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.data.borrow().clone()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.data.borrow().clone())
    }

    fn save(&self, data: &str) -> Result<(), StorageError> {
        *self.data.borrow_mut() = Some(data.to_string());
        Ok(())
    }
}

/// JSON file store with locked, atomic writes
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.rewardkit/progress.json`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rewardkit")
            .join("progress.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Option<String>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn save(&self, data: &str) -> Result<(), StorageError> {
        write_atomic(&self.path, data.as_bytes())?;
        Ok(())
    }
}

/// Replace `path` with `contents` through a synced sibling temp file.
///
/// Writers serialize on an exclusive lock held on `<name>.lock`, a separate
/// file so the rename cannot drop it.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(sibling(path, "lock"))?;
    lock_file.lock_exclusive()?;

    let temp_path = sibling(path, "tmp");
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    temp_file.write_all(contents)?;
    temp_file.sync_all()?;

    std::fs::rename(&temp_path, path)
}

/// `progress.json` -> `progress.json.<suffix>`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
