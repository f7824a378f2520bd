//! Product catalog lookups.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use pawcart::products::{Product, ProductId};

use crate::{api::ApiClient, errors::CartError, gateway::models::ProductResponse};

#[derive(Debug)]
pub struct HttpProductCatalog {
    api: Arc<ApiClient>,
}

impl HttpProductCatalog {
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn get_product(&self, id: ProductId) -> Result<Product, CartError> {
        let response: ProductResponse = self.api.get(&["products", id.as_str()]).await?;

        Ok(response.into_product(&self.api))
    }
}

#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Fetch a product as currently listed.
    async fn get_product(&self, id: ProductId) -> Result<Product, CartError>;
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn fetches_and_normalizes_product() -> TestResult {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/p1");
                then.status(200).json_body(json!({
                    "_id": "p1",
                    "name": "Cat Tree",
                    "images": ["/uploads/tree.jpg"],
                    "stock": 3,
                    "price": "79.50",
                    "compareAtPrice": "99.00"
                }));
            })
            .await;

        let catalog = HttpProductCatalog::new(Arc::new(ApiClient::new(&server.base_url(), None)?));
        let product = catalog.get_product("p1".into()).await?;

        assert_eq!(product.title, "Cat Tree");
        assert_eq!(product.price, Decimal::new(7_950, 2));
        assert_eq!(product.compare_at_price, Some(Decimal::new(9_900, 2)));
        assert_eq!(
            product.images,
            vec![format!("{}/uploads/tree.jpg", server.base_url())]
        );
        assert!(product.sizes.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn missing_product_is_not_found() -> TestResult {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/products/gone");
                then.status(404).json_body(json!({ "message": "Product not found" }));
            })
            .await;

        let catalog = HttpProductCatalog::new(Arc::new(ApiClient::new(&server.base_url(), None)?));

        assert!(matches!(
            catalog.get_product("gone".into()).await,
            Err(CartError::NotFound { .. })
        ));

        Ok(())
    }
}
