//! Flat string key-value stores holding snapshot entries.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::dao::storage::{StorageError, StorageResult};

/// Abstraction over the persistence boundary: string values keyed by string identifiers.
///
/// Writes are synchronous; a successful `set` is visible to every later `get`.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    /// Insert or overwrite `key`.
    fn set(&self, key: &str, value: String) -> StorageResult<()>;
    /// Drop `key`; removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Volatile store, mainly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk, rewritten on every change.
///
/// Each rewrite goes to a sibling temp file that then replaces the snapshot,
/// so an interrupted write leaves the previous contents in place.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<IndexMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    ///
    /// An unreadable snapshot is moved aside to `<path>.corrupt` and the store
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<IndexMap<String, String>>(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    quarantine(&path, &err);
                    IndexMap::new()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "snapshot file not found; starting empty");
                IndexMap::new()
            }
            Err(err) => {
                return Err(StorageError::unavailable(
                    format!("failed to read snapshot file `{}`", path.display()),
                    err,
                ));
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "opened snapshot file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable snapshot is moved on open.
    pub fn corrupt_path(&self) -> PathBuf {
        sibling(&self.path, "corrupt")
    }

    fn update<F>(&self, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut IndexMap<String, String>),
    {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        mutate(&mut *entries);

        let contents = serde_json::to_string_pretty(&*entries).map_err(|err| {
            StorageError::unavailable("failed to encode snapshot file".into(), err)
        })?;
        let staging = sibling(&self.path, "tmp");
        fs::write(&staging, contents).map_err(|err| {
            StorageError::unavailable(
                format!("failed to write snapshot file `{}`", staging.display()),
                err,
            )
        })?;
        fs::rename(&staging, &self.path).map_err(|err| {
            StorageError::unavailable(
                format!("failed to replace snapshot file `{}`", self.path.display()),
                err,
            )
        })
    }
}

/// `path` with `.suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn quarantine(path: &Path, err: &serde_json::Error) {
    let target = sibling(path, "corrupt");
    match fs::rename(path, &target) {
        Ok(()) => warn!(
            path = %path.display(),
            moved_to = %target.display(),
            error = %err,
            "snapshot file is not a JSON object of strings; starting empty"
        ),
        Err(rename_err) => warn!(
            path = %path.display(),
            error = %err,
            rename_error = %rename_err,
            "snapshot file is not a JSON object of strings and could not be moved aside; starting empty"
        ),
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value);
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.update(|entries| {
            entries.shift_remove(key);
        })
    }
}
