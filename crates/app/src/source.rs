//! Cart sources
//!
//! Where a cart's truth lives: the guest entries on this device, or the
//! customer's cart on the server.

use std::sync::Arc;

use async_trait::async_trait;
use pawcart::items::LineItem;

use crate::{
    errors::CartError,
    gateway::{CartGateway, LineItemUpdate, NewLineItem},
    hydrator::{CartHydrator, Hydrated},
    local::LocalCartStore,
};

#[async_trait]
pub trait CartSource: Send + Sync {
    /// Build the cart from its backing store.
    async fn read(&self) -> Result<Hydrated, CartError>;

    /// Whether `hydrated` still reflects the backing store.
    fn is_current(&self, hydrated: &Hydrated) -> bool;

    async fn add(&self, item: NewLineItem) -> Result<(), CartError>;

    /// Apply `update` to `item`, a row of the cart this source produced.
    async fn update(&self, item: &LineItem, update: LineItemUpdate) -> Result<(), CartError>;

    async fn remove(&self, item: &LineItem) -> Result<(), CartError>;

    async fn clear(&self) -> Result<(), CartError>;
}

/// The guest cart: entries in the Local Cart Store joined with the catalog.
#[derive(Debug, Clone)]
pub struct GuestCartSource {
    local: Arc<LocalCartStore>,
    hydrator: CartHydrator,
}

impl GuestCartSource {
    pub fn new(local: Arc<LocalCartStore>, hydrator: CartHydrator) -> Self {
        Self { local, hydrator }
    }
}

#[async_trait]
impl CartSource for GuestCartSource {
    async fn read(&self) -> Result<Hydrated, CartError> {
        self.hydrator.hydrate_guest(&self.local.entries()).await
    }

    fn is_current(&self, hydrated: &Hydrated) -> bool {
        hydrated.fingerprint == Some(self.local.entries().fingerprint())
    }

    async fn add(&self, item: NewLineItem) -> Result<(), CartError> {
        self.local
            .add_entry(item.product_id, item.quantity, item.size)?;

        Ok(())
    }

    async fn update(&self, item: &LineItem, update: LineItemUpdate) -> Result<(), CartError> {
        match update.size.filter(|size| *size != item.size) {
            Some(size) => {
                self.local
                    .change_size(&item.product_id, &item.size, size, update.quantity)?;
            }
            None => {
                self.local.update_quantity(
                    &item.product_id,
                    &item.size,
                    i64::from(update.quantity),
                )?;
            }
        }

        Ok(())
    }

    async fn remove(&self, item: &LineItem) -> Result<(), CartError> {
        self.local.remove_entry(&item.product_id, &item.size)?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.local.clear()?;

        Ok(())
    }
}

/// The customer's cart on the server.
#[derive(Clone)]
pub struct RemoteCartSource {
    gateway: Arc<dyn CartGateway>,
    hydrator: CartHydrator,
}

impl std::fmt::Debug for RemoteCartSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartSource")
            .field("hydrator", &self.hydrator)
            .finish_non_exhaustive()
    }
}

impl RemoteCartSource {
    pub fn new(gateway: Arc<dyn CartGateway>, hydrator: CartHydrator) -> Self {
        Self { gateway, hydrator }
    }
}

#[async_trait]
impl CartSource for RemoteCartSource {
    async fn read(&self) -> Result<Hydrated, CartError> {
        self.hydrator.hydrate_remote().await
    }

    fn is_current(&self, _hydrated: &Hydrated) -> bool {
        true
    }

    async fn add(&self, item: NewLineItem) -> Result<(), CartError> {
        self.gateway.add_item(item).await?;

        Ok(())
    }

    async fn update(&self, item: &LineItem, update: LineItemUpdate) -> Result<(), CartError> {
        self.gateway.update_item(item.id.clone(), update).await?;

        Ok(())
    }

    async fn remove(&self, item: &LineItem) -> Result<(), CartError> {
        self.gateway.remove_item(item.id.clone()).await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), CartError> {
        self.gateway.clear_cart().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;
    use pawcart::{
        carts::{Cart, CartOwner},
        entries::GuestCartEntry,
        products::Size,
        pricing::TaxRate,
    };
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::{
        catalog::MockProductCatalog, gateway::MockCartGateway, storage::MemoryStore,
        test::{line_item, product},
    };

    fn guest_source(catalog: MockProductCatalog) -> TestResult<GuestCartSource> {
        let local = Arc::new(LocalCartStore::open(Arc::new(MemoryStore::new()))?);
        let hydrator = CartHydrator::new(
            Arc::new(catalog),
            Arc::new(MockCartGateway::new()),
            TaxRate::default(),
        );

        Ok(GuestCartSource::new(local, hydrator))
    }

    #[tokio::test]
    async fn guest_hydration_is_superseded_by_local_writes() -> TestResult {
        let mut catalog = MockProductCatalog::new();
        catalog
            .expect_get_product()
            .returning(|_| Ok(product("p1", Decimal::TEN, 10, &["M"])));

        let source = guest_source(catalog)?;
        source.local.add_entry("p1".into(), 1, "M".into())?;

        let hydrated = source.read().await?;

        assert!(source.is_current(&hydrated));

        source.local.add_entry("p1".into(), 1, "M".into())?;

        assert!(!source.is_current(&hydrated));

        Ok(())
    }

    #[tokio::test]
    async fn guest_update_with_new_size_moves_entry() -> TestResult {
        let source = guest_source(MockProductCatalog::new())?;
        source.local.add_entry("p1".into(), 2, "M".into())?;

        let item = line_item("guest:p1:M", "p1", "M", 2, Decimal::TEN);

        source
            .update(
                &item,
                LineItemUpdate {
                    quantity: 3,
                    size: Some(Size::new("L")),
                },
            )
            .await?;

        assert_eq!(
            source.local.entries().as_slice(),
            &[GuestCartEntry::new("p1", 3, "L")]
        );

        source.remove(&line_item("guest:p1:L", "p1", "L", 3, Decimal::TEN)).await?;

        assert!(source.local.entries().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn remote_operations_address_items_by_id() -> TestResult {
        let mut gateway = MockCartGateway::new();
        gateway
            .expect_remove_item()
            .with(eq(pawcart::items::LineItemId::new("i9")))
            .times(1)
            .returning(|_| Ok(Cart::empty(CartOwner::Customer("c1".into()))));

        let gateway: Arc<dyn CartGateway> = Arc::new(gateway);
        let source = RemoteCartSource::new(
            Arc::clone(&gateway),
            CartHydrator::new(
                Arc::new(MockProductCatalog::new()),
                gateway,
                TaxRate::default(),
            ),
        );

        source
            .remove(&line_item("i9", "p1", "M", 1, Decimal::TEN))
            .await?;

        Ok(())
    }
}
