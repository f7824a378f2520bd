//! Cart Hydrator
//!
//! Turns whatever backs the current cart into a full [`Cart`]. Guest entries
//! are joined with live catalog data; the customer's cart comes from the
//! gateway as-is.

use std::sync::Arc;

use futures::future::join_all;
use pawcart::{
    carts::{Cart, CartOwner},
    entries::{EntrySetFingerprint, GuestEntries},
    items::LineItem,
    pricing::TaxRate,
};
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    catalog::ProductCatalog,
    errors::{CartError, ErrorKind},
    gateway::CartGateway,
};

/// A hydrated cart and the guest entries it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Hydrated {
    pub cart: Cart,

    /// Fingerprint of the guest entries; `None` for a customer's cart.
    pub fingerprint: Option<EntrySetFingerprint>,
}

#[derive(Clone)]
pub struct CartHydrator {
    catalog: Arc<dyn ProductCatalog>,
    gateway: Arc<dyn CartGateway>,
    rate: TaxRate,
}

impl std::fmt::Debug for CartHydrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartHydrator")
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}

impl CartHydrator {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        gateway: Arc<dyn CartGateway>,
        rate: TaxRate,
    ) -> Self {
        Self {
            catalog,
            gateway,
            rate,
        }
    }

    /// The customer's cart, unchanged from the gateway.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn hydrate_remote(&self) -> Result<Hydrated, CartError> {
        Ok(Hydrated {
            cart: self.gateway.get_cart().await?,
            fingerprint: None,
        })
    }

    /// Join guest entries with current product data.
    ///
    /// Entries whose product cannot be fetched or whose size the product does
    /// not offer are left out of the cart; the entries themselves are not
    /// modified. Line items are priced at the current product price.
    ///
    /// # Errors
    ///
    /// Returns a network error when every product fetch failed for lack of
    /// connectivity.
    pub async fn hydrate_guest(&self, entries: &GuestEntries) -> Result<Hydrated, CartError> {
        let fingerprint = Some(entries.fingerprint());

        if entries.is_empty() {
            return Ok(Hydrated {
                cart: Cart::empty(CartOwner::Guest),
                fingerprint,
            });
        }

        let ids = entries.distinct_product_ids();
        let fetched = join_all(
            ids.iter()
                .map(|id| self.catalog.get_product(id.clone())),
        )
        .await;

        let mut products = FxHashMap::default();
        let mut failures = Vec::new();

        for (id, result) in ids.into_iter().zip(fetched) {
            match result {
                Ok(product) => {
                    products.insert(id, product);
                }
                Err(error) => {
                    warn!(product = %id, %error, "dropping product from guest cart");
                    failures.push(error);
                }
            }
        }

        if products.is_empty()
            && failures
                .iter()
                .all(|error| error.kind() == ErrorKind::Network)
            && let Some(error) = failures.into_iter().next()
        {
            return Err(error);
        }

        let items = entries
            .as_slice()
            .iter()
            .filter_map(|entry| {
                let Some(product) = products.get(&entry.product_id) else {
                    debug!(product = %entry.product_id, "guest entry references unavailable product");
                    return None;
                };

                if !product.accepts_size(&entry.size) {
                    debug!(product = %entry.product_id, size = %entry.size, "guest entry has invalid size");
                    return None;
                }

                Some(LineItem::from_product(
                    LineItem::guest_id(&entry.product_id, &entry.size),
                    product,
                    entry.quantity,
                    entry.size.clone(),
                ))
            })
            .collect();

        Ok(Hydrated {
            cart: Cart::from_items(CartOwner::Guest, items, self.rate, Decimal::ZERO),
            fingerprint,
        })
    }
}
