//! Line Items

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    ids::TypedId,
    products::{Product, ProductId, Size, offers_size},
};

/// Line item identifier
pub type LineItemId = TypedId<LineItem>;

const GUEST_ID_PREFIX: &str = "guest:";
const PENDING_ID_PREFIX: &str = "pending:";

/// Product details captured on a line item.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    /// Display title
    pub title: String,

    /// Absolute image URLs
    pub images: Vec<String>,

    /// Units in stock when the snapshot was taken
    pub stock: u32,

    /// Unit price when the snapshot was taken
    pub price: Decimal,

    /// List price before any markdown
    pub compare_at_price: Option<Decimal>,

    /// Declared size set
    pub sizes: Vec<Size>,
}

impl ProductSnapshot {
    /// Whether `size` belongs to the snapshotted size set.
    pub fn accepts_size(&self, size: &Size) -> bool {
        offers_size(&self.sizes, size)
    }
}

/// One cart row: a distinct product and size with its quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Line item id
    pub id: LineItemId,

    /// Product this row refers to
    pub product_id: ProductId,

    /// Product details at add-time
    pub product: ProductSnapshot,

    /// Quantity, always at least one
    pub quantity: u32,

    /// Selected size
    pub size: Size,

    /// Unit price captured when the item was added
    pub price_at_time: Decimal,
}

impl LineItem {
    /// Build a line item priced at the product's current price.
    pub fn from_product(id: LineItemId, product: &Product, quantity: u32, size: Size) -> Self {
        Self {
            id,
            product_id: product.id.clone(),
            product: product.snapshot(),
            quantity,
            size,
            price_at_time: product.price,
        }
    }

    /// Deterministic id for a hydrated guest row.
    pub fn guest_id(product_id: &ProductId, size: &Size) -> LineItemId {
        LineItemId::new(format!("{GUEST_ID_PREFIX}{product_id}:{size}"))
    }

    /// Fresh id for a row that only exists optimistically.
    pub fn pending_id() -> LineItemId {
        LineItemId::new(format!("{PENDING_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this row has not been confirmed by any backing store yet.
    pub fn is_pending(&self) -> bool {
        self.id.as_str().starts_with(PENDING_ID_PREFIX)
    }

    /// Whether this row represents `product_id` in `size`.
    pub fn matches(&self, product_id: &ProductId, size: &Size) -> bool {
        self.product_id == *product_id && self.size == *size
    }

    /// `price_at_time × quantity`, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.price_at_time * Decimal::from(self.quantity)
    }
}
