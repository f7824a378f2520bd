//! Carts

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    ids::CustomerId,
    items::{LineItem, LineItemId},
    pricing::{TaxRate, Totals},
    products::{ProductId, Size},
};

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// Anonymous shopper whose cart lives on the device
    Guest,

    /// Signed-in customer whose cart lives on the server
    Customer(CustomerId),
}

/// Cart
///
/// Totals are derived from `items` and never authoritative on their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    /// Cart owner
    pub owner: CartOwner,

    /// Line items in insertion order
    pub items: Vec<LineItem>,

    /// Sum of line totals
    pub subtotal: Decimal,

    /// Tax on the subtotal
    pub tax: Decimal,

    /// Discount applied to the cart
    pub discount: Decimal,

    /// `subtotal + tax - discount`
    pub total: Decimal,

    /// Last modification
    pub updated_at: Timestamp,
}

impl Cart {
    /// An empty cart with zero totals.
    pub fn empty(owner: CartOwner) -> Self {
        Self {
            owner,
            items: Vec::new(),
            subtotal: Decimal::ZERO,
            tax: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            updated_at: Timestamp::now(),
        }
    }

    /// Build a cart from items, deriving its totals.
    pub fn from_items(
        owner: CartOwner,
        items: Vec<LineItem>,
        rate: TaxRate,
        discount: Decimal,
    ) -> Self {
        let mut cart = Self {
            owner,
            items,
            discount,
            ..Self::empty(CartOwner::Guest)
        };

        cart.recalculate(rate);

        cart
    }

    /// Re-derive totals from the current items, keeping the discount.
    pub fn recalculate(&mut self, rate: TaxRate) {
        let totals = Totals::calculate(&self.items, rate, self.discount);

        self.subtotal = totals.subtotal;
        self.tax = totals.tax;
        self.discount = totals.discount;
        self.total = totals.total;
    }

    /// Mark the cart as modified now.
    pub fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    /// Totals for the current items, including savings.
    pub fn totals(&self, rate: TaxRate) -> Totals {
        Totals::calculate(&self.items, rate, self.discount)
    }

    /// Find a line item by id.
    pub fn item(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    /// Find the line item for a product in a given size.
    pub fn item_for(&self, product_id: &ProductId, size: &Size) -> Option<&LineItem> {
        self.items.iter().find(|item| item.matches(product_id, size))
    }

    /// Total number of units across all line items.
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
