//! File-backed key-value store.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::sync::broadcast;

use super::{ContextId, KeyValueStore, StorageError, StorageEvent, event_channel, publish};

/// Stores each key as `<dir>/<key>.json`.
///
/// Change notifications only reach handles in the same process.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    events: Arc<broadcast::Sender<StorageEvent>>,
    origin: ContextId,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();

        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            events: Arc::new(event_channel()),
            origin: ContextId::next(),
        })
    }

    /// A handle onto the same directory, writing from a new context.
    #[must_use]
    pub fn context(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            events: Arc::clone(&self.events),
            origin: ContextId::next(),
        }
    }

    /// Directory holding the stored keys.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn origin(&self) -> ContextId {
        self.origin
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");

        // Write then rename so readers never see a partial value.
        fs::write(&staging, value)
            .and_then(|()| fs::rename(&staging, &path))
            .map_err(|source| StorageError::Write { path, source })?;

        publish(&self.events, key, self.origin);

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key);

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(source) if source.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(StorageError::Write { path, source }),
        }

        publish(&self.events, key, self.origin);

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}
