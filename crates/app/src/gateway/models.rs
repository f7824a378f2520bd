//! Cart API Models

use jiff::Timestamp;
use pawcart::{
    carts::{Cart, CartOwner},
    entries::GuestCartEntry,
    ids::CustomerId,
    items::{LineItem, LineItemId, ProductSnapshot},
    pricing::TaxRate,
    products::{Product, ProductId, Size},
    sync::{SyncFailure, SyncFailureReason, SyncOutcome},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::ApiClient;

/// Request body for adding a line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: Size,
}

/// Request body for changing a line item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemUpdate {
    pub quantity: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncRequest<'a> {
    pub items: &'a [GuestCartEntry],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductResponse {
    #[serde(alias = "_id")]
    id: String,

    #[serde(alias = "name", default)]
    title: String,

    #[serde(default)]
    images: Vec<String>,

    #[serde(default)]
    stock: u32,

    price: Decimal,

    #[serde(default)]
    compare_at_price: Option<Decimal>,

    #[serde(default)]
    sizes: Vec<Size>,
}

impl ProductResponse {
    pub(crate) fn into_product(self, api: &ApiClient) -> Product {
        Product {
            id: ProductId::new(self.id),
            title: self.title,
            images: self
                .images
                .iter()
                .filter_map(|image| api.normalize_image_url(image))
                .collect(),
            stock: self.stock,
            price: self.price,
            compare_at_price: self.compare_at_price,
            sizes: self.sizes,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineItemResponse {
    #[serde(alias = "_id")]
    id: String,

    #[serde(default)]
    product_id: Option<String>,

    #[serde(default)]
    product: Option<ProductResponse>,

    quantity: u32,

    #[serde(default)]
    size: Option<Size>,

    price_at_time: Decimal,
}

impl LineItemResponse {
    fn into_line_item(self, api: &ApiClient) -> Option<LineItem> {
        let product = self.product.map(|product| product.into_product(api));

        let Some(product_id) = self
            .product_id
            .map(ProductId::new)
            .or_else(|| product.as_ref().map(|product| product.id.clone()))
        else {
            warn!(item = %self.id, "dropping line item without a product");

            return None;
        };

        let snapshot = product.map_or_else(
            || ProductSnapshot {
                title: String::new(),
                images: Vec::new(),
                stock: 0,
                price: self.price_at_time,
                compare_at_price: None,
                sizes: Vec::new(),
            },
            |product| product.snapshot(),
        );

        Some(LineItem {
            id: LineItemId::new(self.id),
            product_id,
            product: snapshot,
            quantity: self.quantity,
            size: self.size.unwrap_or_else(Size::one_size),
            price_at_time: self.price_at_time,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CartResponse {
    #[serde(default)]
    user_id: Option<String>,

    #[serde(default)]
    items: Vec<LineItemResponse>,

    #[serde(default)]
    discount: Decimal,

    #[serde(default)]
    updated_at: Option<Timestamp>,
}

impl CartResponse {
    /// Map onto a [`Cart`], re-deriving totals locally.
    ///
    /// `session` owns the cart when the response does not name a user.
    pub(crate) fn into_cart(self, api: &ApiClient, rate: TaxRate, session: &CustomerId) -> Cart {
        let owner = CartOwner::Customer(
            self.user_id
                .map_or_else(|| session.clone(), CustomerId::new),
        );

        let items = self
            .items
            .into_iter()
            .filter_map(|item| item.into_line_item(api))
            .collect();

        let mut cart = Cart::from_items(owner, items, rate, self.discount);

        cart.updated_at = self.updated_at.unwrap_or(Timestamp::UNIX_EPOCH);

        cart
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncFailureResponse {
    item: GuestCartEntry,

    #[serde(default)]
    reason: String,

    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncResponse {
    #[serde(default)]
    synced: u32,

    #[serde(default)]
    failed: Vec<SyncFailureResponse>,

    cart: CartResponse,
}

impl SyncResponse {
    pub(crate) fn into_outcome(
        self,
        api: &ApiClient,
        rate: TaxRate,
        session: &CustomerId,
    ) -> SyncOutcome {
        SyncOutcome {
            synced: self.synced,
            failed: self
                .failed
                .into_iter()
                .map(|failure| SyncFailure {
                    reason: SyncFailureReason::classify(failure.code.as_deref(), &failure.reason),
                    item: failure.item,
                    message: failure.reason,
                })
                .collect(),
            cart: self.cart.into_cart(api, rate, session),
        }
    }
}
