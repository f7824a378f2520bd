//! Products

use std::fmt::{Display, Formatter, Result as FmtResult};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ids::TypedId, items::ProductSnapshot};

/// Size accepted by products that do not declare a size set.
pub const ONE_SIZE: &str = "ONE_SIZE";

/// Product identifier
pub type ProductId = TypedId<Product>;

/// Product size, e.g. `"M"` or `"2kg"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(String);

impl Size {
    /// Create a size from its label.
    pub fn new(size: impl Into<String>) -> Self {
        Self(size.into())
    }

    /// The size used by single-size products.
    pub fn one_size() -> Self {
        Self::new(ONE_SIZE)
    }

    /// Size label
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Size {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for Size {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Size {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Whether `size` belongs to the declared size set `sizes`.
///
/// An empty size set only offers [`ONE_SIZE`].
pub fn offers_size(sizes: &[Size], size: &Size) -> bool {
    if sizes.is_empty() {
        return size.as_str() == ONE_SIZE;
    }

    sizes.contains(size)
}

/// Product as currently listed in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product id
    pub id: ProductId,

    /// Display title
    pub title: String,

    /// Absolute image URLs
    pub images: Vec<String>,

    /// Units currently in stock
    pub stock: u32,

    /// Current unit price
    pub price: Decimal,

    /// List price before any markdown
    pub compare_at_price: Option<Decimal>,

    /// Declared size set
    pub sizes: Vec<Size>,
}

impl Product {
    /// Whether `size` belongs to this product's declared size set.
    ///
    /// Products without a declared size set only accept [`ONE_SIZE`].
    pub fn accepts_size(&self, size: &Size) -> bool {
        offers_size(&self.sizes, size)
    }

    /// Capture the product's current details.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            title: self.title.clone(),
            images: self.images.clone(),
            stock: self.stock,
            price: self.price,
            compare_at_price: self.compare_at_price,
            sizes: self.sizes.clone(),
        }
    }
}
