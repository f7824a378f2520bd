//! Engine Context

use std::sync::Arc;

use parking_lot::RwLock;
use pawcart::{
    carts::Cart,
    ids::CustomerId,
    items::LineItemId,
    products::{ProductId, Size},
};
use thiserror::Error;
use tracing::info;

use crate::{
    api::ApiClient,
    cache::CartCache,
    catalog::{HttpProductCatalog, ProductCatalog},
    config::EngineConfig,
    coordinator::MutationCoordinator,
    errors::CartError,
    gateway::HttpCartGateway,
    hydrator::CartHydrator,
    local::LocalCartStore,
    notifications::{Notification, Notifier},
    session::AuthStatus,
    source::{GuestCartSource, RemoteCartSource},
    storage::{FileStore, StorageError},
    sync::{SyncEngine, SyncReport},
};

#[derive(Debug, Error)]
pub enum EngineInitError {
    #[error("failed to open guest cart storage")]
    Storage(#[source] StorageError),

    #[error("invalid API configuration")]
    Api(#[source] CartError),
}

/// The cart engine wired against the storefront API and on-disk guest storage.
///
/// The engine is the only context writing its guest cart directory, so it
/// does not start [`LocalCartStore::listen`]. Embedders sharing one store
/// between contexts start a listener per context themselves.
pub struct CartEngine {
    coordinator: MutationCoordinator,
    sync: SyncEngine,
    catalog: Arc<dyn ProductCatalog>,
    notifier: Arc<dyn Notifier>,
    api: Arc<ApiClient>,
    gateway: Arc<HttpCartGateway>,
    local: Arc<LocalCartStore>,
    auth: RwLock<AuthStatus>,
}

impl std::fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("coordinator", &self.coordinator)
            .field("sync", &self.sync)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl CartEngine {
    /// Build the engine from configuration.
    ///
    /// Starts signed in when the configuration carries both a token and a
    /// customer id; no sync runs for a session that was already open.
    ///
    /// # Errors
    ///
    /// Returns an error when the guest cart directory cannot be opened or an
    /// API URL is invalid.
    pub fn from_config(
        config: &EngineConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, EngineInitError> {
        let storage = FileStore::open(&config.guest_cart_dir).map_err(EngineInitError::Storage)?;
        let local = Arc::new(
            LocalCartStore::open(Arc::new(storage)).map_err(EngineInitError::Storage)?,
        );

        let api = Arc::new(
            ApiClient::new(&config.api_base_url, config.asset_base_url.as_deref())
                .map_err(EngineInitError::Api)?,
        );

        let rate = config.tax_rate();
        let gateway = Arc::new(HttpCartGateway::new(Arc::clone(&api), rate));
        let catalog: Arc<dyn ProductCatalog> = Arc::new(HttpProductCatalog::new(Arc::clone(&api)));
        let cache = Arc::new(CartCache::new(rate, config.stale_after()));
        let hydrator = CartHydrator::new(Arc::clone(&catalog), gateway.clone(), rate);

        let coordinator = MutationCoordinator::new(
            Arc::clone(&cache),
            Arc::clone(&local),
            GuestCartSource::new(Arc::clone(&local), hydrator.clone()),
            RemoteCartSource::new(gateway.clone(), hydrator),
            Arc::clone(&notifier),
            config.retry_policy(),
            config.quantity_bounds(),
        );

        let sync = SyncEngine::new(
            gateway.clone(),
            Arc::clone(&local),
            cache,
            Arc::clone(&notifier),
            config.breakdown_delay(),
        );

        let auth = config.auth_status();

        api.set_token(config.api_token.clone());
        gateway.set_customer(auth.customer().cloned());

        Ok(Self {
            coordinator,
            sync,
            catalog,
            notifier,
            api,
            gateway,
            local,
            auth: RwLock::new(auth),
        })
    }

    pub fn auth(&self) -> AuthStatus {
        self.auth.read().clone()
    }

    /// Number of entries in the guest cart on disk.
    pub fn guest_entry_count(&self) -> usize {
        self.local.entries().len()
    }

    /// Open a session for `customer` and merge the guest cart into theirs.
    pub async fn login(&self, customer: CustomerId, token: String) -> SyncReport {
        self.api.set_token(Some(token));
        self.gateway.set_customer(Some(customer.clone()));

        let current = AuthStatus::Authenticated { customer };
        let previous = std::mem::replace(&mut *self.auth.write(), current.clone());

        info!(customer = ?current.customer(), "signed in");

        self.sync.on_auth_transition(&previous, &current).await
    }

    /// # Errors
    ///
    /// Returns an error when the cart cannot be read.
    pub async fn cart(&self) -> Result<Cart, CartError> {
        self.coordinator.cart(&self.auth()).await
    }

    /// Look up the product, then add `quantity` units of it in `size`.
    ///
    /// # Errors
    ///
    /// Returns an error when the product cannot be fetched or the change is
    /// rejected.
    pub async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        size: Size,
    ) -> Result<Cart, CartError> {
        let product = self
            .catalog
            .get_product(product_id)
            .await
            .inspect_err(|error| self.notifier.notify(Notification::for_error(error)))?;

        self.coordinator
            .add_item(&self.auth(), &product, quantity, size)
            .await
    }

    /// # Errors
    ///
    /// Returns an error when the change is rejected.
    pub async fn update_item(
        &self,
        item: &LineItemId,
        quantity: u32,
        size: Option<Size>,
    ) -> Result<Cart, CartError> {
        self.coordinator
            .update_item(&self.auth(), item, quantity, size)
            .await
    }

    /// # Errors
    ///
    /// Returns an error when the change is rejected.
    pub async fn remove_item(&self, item: &LineItemId) -> Result<Cart, CartError> {
        self.coordinator.remove_item(&self.auth(), item).await
    }

    /// # Errors
    ///
    /// Returns an error when the change is rejected.
    pub async fn clear(&self) -> Result<Cart, CartError> {
        self.coordinator.clear(&self.auth()).await
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use httpmock::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;
    use testresult::TestResult;

    use super::*;
    use crate::notifications::{RecordingNotifier, messages};

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        engine: EngineConfig,
    }

    fn config(server: &MockServer, dir: &TempDir) -> TestResult<EngineConfig> {
        let base = server.base_url();
        let dir = dir.path().to_string_lossy().into_owned();

        Ok(Harness::try_parse_from([
            "pawcart",
            "--api-base-url",
            base.as_str(),
            "--guest-cart-dir",
            dir.as_str(),
            "--sync-breakdown-delay-ms",
            "0",
        ])?
        .engine)
    }

    fn product_body() -> serde_json::Value {
        json!({ "id": "p1", "title": "Leash", "stock": 5, "price": "12.50", "sizes": ["M"] })
    }

    #[tokio::test]
    async fn guest_add_then_login_merges_cart() -> TestResult {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/p1");
                then.status(200).json_body(product_body());
            })
            .await;
        let sync = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/cart/sync")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({
                        "items": [{ "productId": "p1", "quantity": 2, "size": "M" }]
                    }));
                then.status(200).json_body(json!({
                    "synced": 1,
                    "failed": [],
                    "cart": {
                        "userId": "c1",
                        "items": [{
                            "id": "i1",
                            "productId": "p1",
                            "product": product_body(),
                            "quantity": 2,
                            "size": "M",
                            "priceAtTime": "12.50"
                        }]
                    }
                }));
            })
            .await;

        let notifier = Arc::new(RecordingNotifier::new());
        let engine = CartEngine::from_config(&config(&server, &dir)?, notifier.clone())?;

        let guest = engine.add_item("p1".into(), 2, Size::new("M")).await?;
        assert_eq!(guest.unit_count(), 2);
        assert_eq!(engine.guest_entry_count(), 1);

        let report = engine.login(CustomerId::new("c1"), "secret".to_string()).await;

        sync.assert_async().await;
        assert!(matches!(report, SyncReport::Completed(_)));
        assert_eq!(engine.guest_entry_count(), 0);
        assert_eq!(engine.cart().await?.unit_count(), 2);
        assert_eq!(
            notifier.messages(),
            vec!["Added 1 item from your saved cart."]
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_product_is_reported() -> TestResult {
        let server = MockServer::start_async().await;
        let dir = TempDir::new()?;

        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/gone");
                then.status(404)
                    .json_body(json!({ "message": "Product not found" }));
            })
            .await;

        let notifier = Arc::new(RecordingNotifier::new());
        let engine = CartEngine::from_config(&config(&server, &dir)?, notifier.clone())?;

        let result = engine.add_item("gone".into(), 1, Size::new("M")).await;

        assert!(matches!(result, Err(CartError::NotFound { .. })));
        assert_eq!(notifier.messages(), vec![messages::ITEM_GONE]);
        assert_eq!(engine.guest_entry_count(), 0);

        Ok(())
    }
}
