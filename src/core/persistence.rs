use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

use crate::core::history::{History, HISTORY_LIMIT};
use crate::core::types::{EntityStore, File, Folder, FolderId, Message, Snapshot, WELCOME_MESSAGE};

pub const DEFAULT_PANEL_HEIGHT: u32 = 600;
pub const MIN_PANEL_HEIGHT: u32 = 300;
pub const MAX_PANEL_HEIGHT: u32 = 800;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode '{key}': {source}")]
    Json {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// One persisted record per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    Files,
    Folders,
    Messages,
    History,
    PanelHeight,
    SelectedFolder,
}

impl StateKey {
    pub const ALL: [StateKey; 6] = [
        StateKey::Files,
        StateKey::Folders,
        StateKey::Messages,
        StateKey::History,
        StateKey::PanelHeight,
        StateKey::SelectedFolder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StateKey::Files => "files",
            StateKey::Folders => "folders",
            StateKey::Messages => "messages",
            StateKey::History => "history",
            StateKey::PanelHeight => "panel-height",
            StateKey::SelectedFolder => "selected-folder",
        }
    }
}

/// Key/value collaborator that keeps state between runs.
pub trait StateStore {
    fn load(&self, key: StateKey) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: StateKey, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: StateKey) -> Result<(), StoreError>;
}

/// `<dir>/<key>.json`, written through a temp file and an atomic rename.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: StateKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, key: StateKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn save(&mut self, key: StateKey, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, value).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &path).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: StateKey) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// In-process store for tests and `--ephemeral` runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<StateKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: StateKey) -> bool {
        self.entries.contains_key(&key)
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: StateKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn save(&mut self, key: StateKey, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StateKey) -> Result<(), StoreError> {
        self.entries.remove(&key);
        Ok(())
    }
}

/// Everything a session keeps between runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub store: EntityStore,
    pub messages: Vec<Message>,
    pub history: History,
    pub panel_height: u32,
    pub selected_folder: Option<FolderId>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            store: EntityStore::defaults(),
            messages: vec![Message::assistant(WELCOME_MESSAGE)],
            history: History::new(),
            panel_height: DEFAULT_PANEL_HEIGHT,
            selected_folder: None,
        }
    }
}

impl PersistedState {
    /// Each key falls back to its own default when absent or unreadable.
    pub fn load(backend: &dyn StateStore) -> Self {
        let defaults = EntityStore::defaults();

        let files: Vec<File> = load_or(backend, StateKey::Files, || defaults.files.clone());
        let folders: Vec<Folder> = load_or(backend, StateKey::Folders, || defaults.folders.clone());
        let messages = load_or(backend, StateKey::Messages, || {
            vec![Message::assistant(WELCOME_MESSAGE)]
        });
        let snapshots: Vec<Snapshot> = load_or(backend, StateKey::History, Vec::new);
        let panel_height = load_or(backend, StateKey::PanelHeight, || DEFAULT_PANEL_HEIGHT);
        let selected_folder = load_or(backend, StateKey::SelectedFolder, || None);

        Self {
            store: EntityStore::new(files, folders),
            messages,
            history: History::from_snapshots(snapshots, HISTORY_LIMIT),
            panel_height,
            selected_folder,
        }
    }

    pub fn encode(&self, key: StateKey) -> Result<String, StoreError> {
        let encoded = match key {
            StateKey::Files => serde_json::to_string(&self.store.files),
            StateKey::Folders => serde_json::to_string(&self.store.folders),
            StateKey::Messages => serde_json::to_string(&self.messages),
            StateKey::History => serde_json::to_string(self.history.snapshots()),
            StateKey::PanelHeight => serde_json::to_string(&self.panel_height),
            StateKey::SelectedFolder => serde_json::to_string(&self.selected_folder),
        };
        encoded.map_err(|source| StoreError::Json { key: key.name(), source })
    }

    pub fn save(&self, backend: &mut dyn StateStore, keys: &[StateKey]) -> Result<(), StoreError> {
        for key in keys {
            backend.save(*key, &self.encode(*key)?)?;
        }
        Ok(())
    }
}

fn load_or<T, F>(backend: &dyn StateStore, key: StateKey, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match backend.load(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = key.name(), error = %e, "stored value unreadable, using default");
                fallback()
            }
        },
        Ok(None) => fallback(),
        Err(e) => {
            warn!(key = key.name(), error = %e, "could not read stored value, using default");
            fallback()
        }
    }
}
