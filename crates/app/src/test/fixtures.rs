//! Test Fixtures

use std::io;

use jiff::Timestamp;
use pawcart::{
    carts::{Cart, CartOwner},
    ids::CustomerId,
    items::{LineItem, LineItemId},
    pricing::TaxRate,
    products::{Product, ProductId, Size},
};
use rust_decimal::Decimal;

use crate::errors::CartError;

pub(crate) const CUSTOMER: &str = "c1";

pub(crate) fn product(id: &str, price: Decimal, stock: u32, sizes: &[&str]) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        images: Vec::new(),
        stock,
        price,
        compare_at_price: None,
        sizes: sizes.iter().copied().map(Size::from).collect(),
    }
}

pub(crate) fn line_item(
    id: &str,
    product_id: &str,
    size: &str,
    quantity: u32,
    price: Decimal,
) -> LineItem {
    let sizes = [size];

    LineItem::from_product(
        LineItemId::new(id),
        &product(product_id, price, 10, &sizes),
        quantity,
        Size::from(size),
    )
}

/// A customer cart stamped like one mapped from a server response.
pub(crate) fn customer_cart(items: Vec<LineItem>) -> Cart {
    let mut cart = Cart::from_items(
        CartOwner::Customer(CustomerId::new(CUSTOMER)),
        items,
        TaxRate::default(),
        Decimal::ZERO,
    );

    cart.updated_at = Timestamp::UNIX_EPOCH;

    cart
}

pub(crate) fn network_error() -> CartError {
    CartError::Network(Box::new(io::Error::from(io::ErrorKind::ConnectionRefused)))
}

pub(crate) fn not_found() -> CartError {
    CartError::NotFound {
        message: "Product not found".to_string(),
    }
}
