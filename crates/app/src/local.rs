//! Local Cart Store
//!
//! The guest cart as it lives on the device. Every mutation rewrites the whole
//! entry list under [`GUEST_CART_KEY`] before subscribers are notified.

use std::sync::Arc;

use parking_lot::Mutex;
use pawcart::{
    entries::{GuestCartEntry, GuestEntries},
    products::{ProductId, Size},
};
use serde::Deserialize;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the guest cart.
pub const GUEST_CART_KEY: &str = "pawcart.guest_cart";

const EMPTY_CART: &str = "[]";

/// Stored row before validation; quantities may be zero or negative.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEntry {
    product_id: ProductId,
    quantity: i64,
    size: Size,
}

#[derive(Debug)]
pub struct LocalCartStore {
    storage: Arc<dyn KeyValueStore>,
    entries: watch::Sender<GuestEntries>,
    writes: Mutex<()>,
}

impl LocalCartStore {
    /// Load the guest cart from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error when storage cannot be read, or when an empty cart
    /// cannot be written back over a missing or malformed value.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let entries = load(storage.as_ref())?;

        Ok(Self {
            storage,
            entries: watch::Sender::new(entries),
            writes: Mutex::new(()),
        })
    }

    /// Current entries.
    pub fn entries(&self) -> GuestEntries {
        self.entries.borrow().clone()
    }

    /// Receive the entry list whenever it changes.
    pub fn subscribe(&self) -> watch::Receiver<GuestEntries> {
        self.entries.subscribe()
    }

    /// Add units, summing with an existing entry for the same product and size.
    ///
    /// # Errors
    ///
    /// Returns an error when the entries cannot be persisted.
    pub fn add_entry(
        &self,
        product_id: ProductId,
        quantity: u32,
        size: Size,
    ) -> Result<(), StorageError> {
        self.mutate(|entries| entries.add(product_id, quantity, size))
    }

    /// Remove the entry for a product and size.
    ///
    /// # Errors
    ///
    /// Returns an error when the entries cannot be persisted.
    pub fn remove_entry(&self, product_id: &ProductId, size: &Size) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.remove(product_id, size);
        })
    }

    /// Replace an entry's quantity; zero or less removes the entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the entries cannot be persisted.
    pub fn update_quantity(
        &self,
        product_id: &ProductId,
        size: &Size,
        quantity: i64,
    ) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.set_quantity(product_id, size, quantity);
        })
    }

    /// Move an entry to another size with a new quantity.
    ///
    /// An existing entry for the target size absorbs the moved units.
    ///
    /// # Errors
    ///
    /// Returns an error when the entries cannot be persisted.
    pub fn change_size(
        &self,
        product_id: &ProductId,
        from: &Size,
        to: Size,
        quantity: u32,
    ) -> Result<(), StorageError> {
        self.mutate(|entries| {
            if entries.remove(product_id, from) {
                entries.add(product_id.clone(), quantity, to);
            }
        })
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns an error when the entries cannot be persisted.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.mutate(GuestEntries::clear)
    }

    /// Re-read the entries from storage, notifying subscribers on change.
    ///
    /// # Errors
    ///
    /// Returns an error when storage cannot be read.
    pub fn reload(&self) -> Result<(), StorageError> {
        let _write = self.writes.lock();
        let loaded = load(self.storage.as_ref())?;

        self.entries.send_if_modified(|current| {
            if *current == loaded {
                return false;
            }

            *current = loaded;
            true
        });

        Ok(())
    }

    /// Reload whenever another context writes the guest cart key.
    ///
    /// The task runs until aborted.
    pub fn listen(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        let mut events = self.storage.subscribe();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.key != GUEST_CART_KEY || event.origin == store.storage.origin() {
                            continue;
                        }

                        debug!("guest cart changed in another context");
                        store.reload_logged();
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "storage events lagged, reloading guest cart");
                        store.reload_logged();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn reload_logged(&self) {
        if let Err(error) = self.reload() {
            warn!(%error, "failed to reload guest cart");
        }
    }

    fn mutate(&self, change: impl FnOnce(&mut GuestEntries)) -> Result<(), StorageError> {
        let _write = self.writes.lock();
        let mut next = self.entries();

        change(&mut next);

        if *self.entries.borrow() == next {
            return Ok(());
        }

        persist(self.storage.as_ref(), &next)?;

        self.entries.send_replace(next);

        Ok(())
    }
}

fn load(storage: &dyn KeyValueStore) -> Result<GuestEntries, StorageError> {
    let Some(raw) = storage.get(GUEST_CART_KEY)? else {
        storage.set(GUEST_CART_KEY, EMPTY_CART)?;

        return Ok(GuestEntries::default());
    };

    match serde_json::from_str::<Vec<StoredEntry>>(&raw) {
        Ok(stored) => Ok(GuestEntries::from_stored(
            stored
                .into_iter()
                .filter_map(|entry| {
                    let quantity = u32::try_from(entry.quantity).ok()?;

                    Some(GuestCartEntry::new(entry.product_id, quantity, entry.size))
                })
                .collect(),
        )),
        Err(error) => {
            warn!(%error, "discarding malformed guest cart");

            storage.set(GUEST_CART_KEY, EMPTY_CART)?;

            Ok(GuestEntries::default())
        }
    }
}

fn persist(storage: &dyn KeyValueStore, entries: &GuestEntries) -> Result<(), StorageError> {
    let encoded =
        serde_json::to_string(entries.as_slice()).map_err(|source| StorageError::Encode {
            key: GUEST_CART_KEY.to_string(),
            source,
        })?;

    storage.set(GUEST_CART_KEY, &encoded)
}
