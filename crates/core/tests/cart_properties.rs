//! Cart behaviour across the public API

use pawcart::{
    pricing::{format_amount, round_money},
    prelude::*,
};
use rust_decimal::Decimal;
use testresult::TestResult;

fn collar() -> Product {
    Product {
        id: ProductId::new("collar"),
        title: "Collar".to_string(),
        images: Vec::new(),
        stock: 10,
        price: Decimal::new(19_99, 2),
        compare_at_price: Some(Decimal::new(24_99, 2)),
        sizes: vec![Size::new("S"), Size::new("M")],
    }
}

#[test]
fn totals_follow_rounded_line_totals() {
    let product = collar();
    let items = vec![
        LineItem::from_product(LineItemId::new("a"), &product, 2, Size::new("S")),
        LineItem::from_product(LineItemId::new("b"), &product, 1, Size::new("M")),
    ];

    let cart = Cart::from_items(
        CartOwner::Guest,
        items,
        TaxRate::default(),
        Decimal::new(5, 0),
    );

    assert_eq!(cart.subtotal, Decimal::new(59_97, 2));
    assert_eq!(cart.tax, Decimal::new(4_80, 2));
    assert_eq!(cart.total, Decimal::new(59_77, 2));
    assert_eq!(
        cart.total,
        round_money(cart.subtotal + cart.tax - cart.discount)
    );
    assert_eq!(cart.totals(TaxRate::default()).savings, Decimal::new(15_00, 2));
    assert_eq!(format_amount(cart.total), "$59.77");
}

#[test]
fn guest_entries_merge_and_remove_by_product_and_size() {
    let mut entries = GuestEntries::default();

    entries.add(ProductId::new("collar"), 1, Size::new("M"));
    entries.add(ProductId::new("collar"), 2, Size::new("M"));
    entries.add(ProductId::new("collar"), 1, Size::new("S"));

    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries
            .find(&ProductId::new("collar"), &Size::new("M"))
            .map(|entry| entry.quantity),
        Some(3)
    );

    let before = entries.fingerprint();
    let mut removed = entries.clone();

    assert!(entries.set_quantity(&ProductId::new("collar"), &Size::new("M"), 0));
    assert!(removed.remove(&ProductId::new("collar"), &Size::new("M")));
    assert_eq!(entries, removed);
    assert_ne!(entries.fingerprint(), before);
}

#[test]
fn stored_entries_round_trip_through_json() -> TestResult {
    let json = r#"[{"productId":"collar","quantity":2,"size":"M"},{"productId":"collar","quantity":1,"size":"M"}]"#;

    let stored: Vec<GuestCartEntry> = serde_json::from_str(json)?;
    let entries = GuestEntries::from_stored(stored);

    assert_eq!(entries.as_slice(), [GuestCartEntry::new("collar", 3, "M")]);
    assert_eq!(
        serde_json::to_string(entries.as_slice())?,
        r#"[{"productId":"collar","quantity":3,"size":"M"}]"#
    );

    Ok(())
}

#[test]
fn quantity_bounds_respect_stock() {
    let bounds = QuantityBounds::default();

    assert!(bounds.permits(MAX_QTY, None));
    assert!(!bounds.permits(MAX_QTY + 1, None));
    assert!(!bounds.permits(MIN_QTY - 1, None));
    assert!(!bounds.permits(4, Some(3)));
}
