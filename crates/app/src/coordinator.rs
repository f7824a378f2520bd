//! Mutation Coordinator
//!
//! Every cart change is applied to the shared cache first, then sent to the
//! cart's source. Success refetches the cart; failure rolls back exactly what
//! the change touched and tells the shopper why.

use std::sync::Arc;

use pawcart::{
    carts::{Cart, CartOwner},
    items::{LineItem, LineItemId},
    products::{Product, Size},
    quantity::QuantityBounds,
};
use tracing::{debug, error, instrument, warn};

use crate::{
    cache::{CartCache, CartPatch},
    errors::{CartError, ErrorKind},
    gateway::{LineItemUpdate, NewLineItem},
    local::LocalCartStore,
    notifications::{Notification, Notifier},
    retry::RetryPolicy,
    session::AuthStatus,
    source::{CartSource, GuestCartSource, RemoteCartSource},
};

/// Reads that may be discarded as superseded before one is accepted anyway.
const MAX_HYDRATION_PASSES: u32 = 3;

#[derive(Debug)]
pub struct MutationCoordinator {
    cache: Arc<CartCache>,
    local: Arc<LocalCartStore>,
    guest: GuestCartSource,
    remote: RemoteCartSource,
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    bounds: QuantityBounds,
}

impl MutationCoordinator {
    pub fn new(
        cache: Arc<CartCache>,
        local: Arc<LocalCartStore>,
        guest: GuestCartSource,
        remote: RemoteCartSource,
        notifier: Arc<dyn Notifier>,
        retry: RetryPolicy,
        bounds: QuantityBounds,
    ) -> Self {
        Self {
            cache,
            local,
            guest,
            remote,
            notifier,
            retry,
            bounds,
        }
    }

    /// The shopper's cart, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns the source error after notifying the shopper.
    #[instrument(skip(self))]
    pub async fn cart(&self, auth: &AuthStatus) -> Result<Cart, CartError> {
        if let Some(hit) = self.cache.fresh(&auth.cart_key())
            && self.source(auth).is_current(&hit)
        {
            return Ok(hit.cart);
        }

        self.load(auth).await.inspect_err(|error| self.report(error))
    }

    /// Add `quantity` units of `product` in `size`.
    ///
    /// A guest add that would exceed the quantity bounds or the product's
    /// stock, or that names a size the product does not offer, changes
    /// nothing and returns the current cart.
    ///
    /// # Errors
    ///
    /// Returns the source error after rolling back and notifying the shopper.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add_item(
        &self,
        auth: &AuthStatus,
        product: &Product,
        quantity: u32,
        size: Size,
    ) -> Result<Cart, CartError> {
        if !auth.is_authenticated() {
            let existing = self
                .local
                .entries()
                .find(&product.id, &size)
                .map_or(0, |entry| entry.quantity);

            if quantity == 0
                || !product.accepts_size(&size)
                || !self
                    .bounds
                    .permits(existing.saturating_add(quantity), Some(product.stock))
            {
                debug!(quantity, existing, stock = product.stock, %size, "ignoring guest add outside bounds");

                return self.cart(auth).await;
            }
        }

        let patch = CartPatch::AddItem {
            product_id: product.id.clone(),
            size: size.clone(),
            quantity,
            product: product.snapshot(),
        };

        let item = NewLineItem {
            product_id: product.id.clone(),
            quantity,
            size,
        };

        self.run(auth, patch, self.source(auth).add(item)).await
    }

    /// Set a line item's quantity and, optionally, its size.
    ///
    /// A quantity of zero removes the item. A guest update outside the quantity bounds, above the snapshotted
    /// stock, or onto a size the product does not offer changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the item is not in the cart, or the source error
    /// after rolling back and notifying the shopper.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        auth: &AuthStatus,
        item: &LineItemId,
        quantity: u32,
        size: Option<Size>,
    ) -> Result<Cart, CartError> {
        if quantity == 0 {
            debug!("zero quantity, removing line item");

            return self.remove_item(auth, item).await;
        }

        let current = self.line_item(auth, item).await?;

        if !auth.is_authenticated() && !self.guest_update_permitted(&current, quantity, size.as_ref())
        {
            debug!(quantity, ?size, stock = current.product.stock, "ignoring guest update outside bounds");

            return self.cart(auth).await;
        }

        let patch = CartPatch::UpdateItem {
            item: item.clone(),
            quantity,
            size: size.clone(),
        };

        let update = LineItemUpdate { quantity, size };

        self.run(auth, patch, self.source(auth).update(&current, update))
            .await
    }

    /// Remove a line item.
    ///
    /// # Errors
    ///
    /// Returns an error when the item is not in the cart, or the source error
    /// after rolling back and notifying the shopper.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, auth: &AuthStatus, item: &LineItemId) -> Result<Cart, CartError> {
        let current = self.line_item(auth, item).await?;

        let patch = CartPatch::RemoveItem { item: item.clone() };

        self.run(auth, patch, self.source(auth).remove(&current))
            .await
    }

    /// Remove every line item.
    ///
    /// # Errors
    ///
    /// Returns the source error after rolling back and notifying the shopper.
    #[instrument(skip(self))]
    pub async fn clear(&self, auth: &AuthStatus) -> Result<Cart, CartError> {
        self.run(auth, CartPatch::Clear, self.source(auth).clear())
            .await
    }

    fn source(&self, auth: &AuthStatus) -> &dyn CartSource {
        if auth.is_authenticated() {
            &self.remote
        } else {
            &self.guest
        }
    }

    fn guest_update_permitted(&self, current: &LineItem, quantity: u32, size: Option<&Size>) -> bool {
        let Some(size) = size.filter(|size| **size != current.size) else {
            return self
                .bounds
                .permits(quantity, Some(current.product.stock));
        };

        let merged = self
            .local
            .entries()
            .find(&current.product_id, size)
            .map_or(0, |entry| entry.quantity);

        current.product.accepts_size(size)
            && self
                .bounds
                .permits(quantity.saturating_add(merged), Some(current.product.stock))
    }

    async fn line_item(&self, auth: &AuthStatus, id: &LineItemId) -> Result<LineItem, CartError> {
        let cart = match self.cache.get(&auth.cart_key()) {
            Some(cart) => cart,
            None => self.cart(auth).await?,
        };

        cart.item(id).cloned().ok_or_else(|| {
            let error = CartError::NotFound {
                message: format!("line item {id} is not in the cart"),
            };

            self.report(&error);

            error
        })
    }

    async fn run(
        &self,
        auth: &AuthStatus,
        patch: CartPatch,
        operation: impl Future<Output = Result<(), CartError>>,
    ) -> Result<Cart, CartError> {
        let key = auth.cart_key();
        let snapshot = self.cache.begin(&key, &patch);

        match operation.await {
            Ok(()) => {
                self.cache.invalidate(&key);

                self.refresh(auth).await
            }
            Err(error) => {
                warn!(%error, ?patch, "rolling back optimistic cart change");

                self.cache.rollback(snapshot);
                self.cache.invalidate(&key);
                self.report(&error);

                Err(error)
            }
        }
    }

    /// Refetch after a successful change, falling back to the last known cart.
    async fn refresh(&self, auth: &AuthStatus) -> Result<Cart, CartError> {
        let key = auth.cart_key();

        match self.retry.run(|| self.load(auth)).await {
            Ok(cart) => Ok(cart),
            Err(CartError::Unauthorized) => {
                self.report(&CartError::Unauthorized);

                Err(CartError::Unauthorized)
            }
            Err(error) => {
                debug!(%error, "giving up on cart refresh");

                Ok(self.cache.get(&key).unwrap_or_else(|| {
                    Cart::empty(match auth.customer() {
                        Some(customer) => CartOwner::Customer(customer.clone()),
                        None => CartOwner::Guest,
                    })
                }))
            }
        }
    }

    async fn load(&self, auth: &AuthStatus) -> Result<Cart, CartError> {
        let key = auth.cart_key();
        let source = self.source(auth);
        let mut pass = 1;

        loop {
            let hydrated = source.read().await?;

            if source.is_current(&hydrated) || pass >= MAX_HYDRATION_PASSES {
                let cart = hydrated.cart.clone();

                self.cache.store(&key, hydrated);

                return Ok(cart);
            }

            debug!(pass, "discarding superseded hydration");

            pass += 1;
        }
    }

    fn report(&self, failure: &CartError) {
        if matches!(failure, CartError::Decode(_) | CartError::Endpoint { .. })
            || failure.kind() == ErrorKind::Storage
        {
            error!(error = %failure, "cart operation failed");
        }

        self.notifier.notify(Notification::for_error(failure));
    }
}
