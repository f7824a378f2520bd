//! Key-value persistence for device-local state.
//!
//! Every handle belongs to a context (a tab, a window, a process). Writes are
//! broadcast to all handles sharing the same backing store so other contexts
//! can reload the keys they care about.

use std::{
    fmt::Debug,
    io,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use thiserror::Error;
use tokio::sync::broadcast;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

const EVENT_CAPACITY: usize = 64;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

/// Identifies the context a storage handle writes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A key was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: ContextId,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode value for {key}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Synchronous string key-value store shared between contexts.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Context this handle writes from.
    fn origin(&self) -> ContextId;

    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key and notify every context.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key and notify every context.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to writes from every context, including this one.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}

pub(crate) fn event_channel() -> broadcast::Sender<StorageEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}

pub(crate) fn publish(events: &broadcast::Sender<StorageEvent>, key: &str, origin: ContextId) {
    // No subscribers is not an error.
    let _receivers = events.send(StorageEvent {
        key: key.to_string(),
        origin,
    });
}
