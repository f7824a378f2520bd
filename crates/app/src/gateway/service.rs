//! Remote Cart Gateway

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use parking_lot::RwLock;
use pawcart::{
    carts::Cart, entries::GuestCartEntry, ids::CustomerId, items::LineItemId, pricing::TaxRate,
    sync::SyncOutcome,
};

use crate::{
    api::ApiClient,
    errors::CartError,
    gateway::models::{
        CartResponse, LineItemUpdate, NewLineItem, SyncRequest, SyncResponse,
    },
};

/// Authenticated cart resource over HTTP.
///
/// One round trip per call; no retries and no caching.
#[derive(Debug)]
pub struct HttpCartGateway {
    api: Arc<ApiClient>,
    rate: TaxRate,
    customer: RwLock<Option<CustomerId>>,
}

impl HttpCartGateway {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, rate: TaxRate) -> Self {
        Self {
            api,
            rate,
            customer: RwLock::new(None),
        }
    }

    /// Customer whose session the requests run under.
    pub fn set_customer(&self, customer: Option<CustomerId>) {
        *self.customer.write() = customer;
    }

    fn session(&self) -> Result<CustomerId, CartError> {
        self.customer.read().clone().ok_or(CartError::Unauthorized)
    }

    fn to_cart(&self, response: CartResponse, session: &CustomerId) -> Cart {
        response.into_cart(&self.api, self.rate, session)
    }
}

#[async_trait]
impl CartGateway for HttpCartGateway {
    async fn get_cart(&self) -> Result<Cart, CartError> {
        let session = self.session()?;
        let response = self.api.get(&["cart"]).await?;

        Ok(self.to_cart(response, &session))
    }

    async fn add_item(&self, item: NewLineItem) -> Result<Cart, CartError> {
        let session = self.session()?;
        let response = self.api.post(&["cart", "items"], &item).await?;

        Ok(self.to_cart(response, &session))
    }

    async fn update_item(
        &self,
        item: LineItemId,
        update: LineItemUpdate,
    ) -> Result<Cart, CartError> {
        let session = self.session()?;
        let response = self
            .api
            .patch(&["cart", "items", item.as_str()], &update)
            .await?;

        Ok(self.to_cart(response, &session))
    }

    async fn remove_item(&self, item: LineItemId) -> Result<Cart, CartError> {
        let session = self.session()?;
        let response = self.api.delete(&["cart", "items", item.as_str()]).await?;

        Ok(self.to_cart(response, &session))
    }

    async fn clear_cart(&self) -> Result<Cart, CartError> {
        let session = self.session()?;
        let response = self.api.delete(&["cart"]).await?;

        Ok(self.to_cart(response, &session))
    }

    async fn sync_cart(&self, entries: Vec<GuestCartEntry>) -> Result<SyncOutcome, CartError> {
        let session = self.session()?;
        let response: SyncResponse = self
            .api
            .post(&["cart", "sync"], &SyncRequest { items: &entries })
            .await?;

        Ok(response.into_outcome(&self.api, self.rate, &session))
    }
}

#[automock]
#[async_trait]
pub trait CartGateway: Send + Sync {
    /// Fetch the customer's cart.
    async fn get_cart(&self) -> Result<Cart, CartError>;

    /// Add a product to the cart; the server merges same product and size.
    async fn add_item(&self, item: NewLineItem) -> Result<Cart, CartError>;

    /// Change a line item's quantity and, optionally, its size.
    async fn update_item(&self, item: LineItemId, update: LineItemUpdate)
    -> Result<Cart, CartError>;

    /// Remove a line item.
    async fn remove_item(&self, item: LineItemId) -> Result<Cart, CartError>;

    /// Remove every line item.
    async fn clear_cart(&self) -> Result<Cart, CartError>;

    /// Merge guest entries into the customer's cart in one batch.
    async fn sync_cart(&self, entries: Vec<GuestCartEntry>) -> Result<SyncOutcome, CartError>;
}
