//! In-memory key-value store.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use super::{ContextId, KeyValueStore, StorageError, StorageEvent, event_channel, publish};

#[derive(Debug)]
struct Shared {
    values: RwLock<FxHashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

/// Process-local store; handles created with [`MemoryStore::context`] share values.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    origin: ContextId,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                values: RwLock::new(FxHashMap::default()),
                events: event_channel(),
            }),
            origin: ContextId::next(),
        }
    }

    /// A handle onto the same values, writing from a new context.
    #[must_use]
    pub fn context(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            origin: ContextId::next(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn origin(&self) -> ContextId {
        self.origin
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.shared.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.shared
            .values
            .write()
            .insert(key.to_string(), value.to_string());

        publish(&self.shared.events, key, self.origin);

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.shared.values.write().remove(key);

        publish(&self.shared.events, key, self.origin);

        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }
}
