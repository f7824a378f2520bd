//! Pricing
//!
//! Every amount is rounded to two decimal places where it is calculated, so
//! recomputing totals from the same items always yields the same values.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};

use crate::items::LineItem;

/// Default sales tax rate applied to cart subtotals.
pub const DEFAULT_TAX_RATE: f64 = 0.08;

/// Sales tax rate
#[derive(Debug, Clone, Copy)]
pub struct TaxRate(Percentage);

impl TaxRate {
    /// Create a tax rate from a fraction, e.g. `0.08` for 8%.
    pub fn from_fraction(fraction: f64) -> Self {
        Self(Percentage::from(fraction))
    }

    /// Tax owed on `amount`, unrounded.
    pub fn of(self, amount: Decimal) -> Decimal {
        self.0 * amount
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::from_fraction(DEFAULT_TAX_RATE)
    }
}

/// Derived financial totals for a set of line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    /// Sum of line totals
    pub subtotal: Decimal,

    /// Tax on the subtotal
    pub tax: Decimal,

    /// Discount applied to the cart
    pub discount: Decimal,

    /// `subtotal + tax - discount`
    pub total: Decimal,

    /// Savings against list prices
    pub savings: Decimal,
}

impl Totals {
    /// Calculate every total for `items`.
    pub fn calculate(items: &[LineItem], rate: TaxRate, discount: Decimal) -> Self {
        let subtotal = subtotal(items);
        let tax = tax(subtotal, rate);
        let discount = round_money(discount);

        Self {
            subtotal,
            tax,
            discount,
            total: total(subtotal, tax, discount),
            savings: savings(items),
        }
    }
}

/// Round an amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `Σ price_at_time × quantity`
pub fn subtotal(items: &[LineItem]) -> Decimal {
    round_money(items.iter().map(LineItem::line_total).sum())
}

/// Tax owed on `subtotal` at `rate`.
pub fn tax(subtotal: Decimal, rate: TaxRate) -> Decimal {
    round_money(rate.of(subtotal))
}

/// `subtotal + tax - discount`
pub fn total(subtotal: Decimal, tax: Decimal, discount: Decimal) -> Decimal {
    round_money(subtotal + tax - discount)
}

/// Savings against list price, for items whose list price exceeds the price paid.
pub fn savings(items: &[LineItem]) -> Decimal {
    round_money(
        items
            .iter()
            .filter_map(|item| {
                let list = item.product.compare_at_price?;

                (list > item.price_at_time)
                    .then(|| (list - item.price_at_time) * Decimal::from(item.quantity))
            })
            .sum(),
    )
}

/// Format an amount in the storefront currency, e.g. `$12.50`.
pub fn format_amount(amount: Decimal) -> String {
    Money::from_decimal(amount, iso::USD).to_string()
}

#[cfg(test)]
mod tests {
    use crate::{
        items::{LineItemId, ProductSnapshot},
        products::{ProductId, Size},
    };

    use super::*;

    fn item(price_cents: i64, quantity: u32, list_cents: Option<i64>) -> LineItem {
        let price = Decimal::new(price_cents, 2);

        LineItem {
            id: LineItemId::new(format!("li_{price_cents}_{quantity}")),
            product_id: ProductId::new("P1"),
            product: ProductSnapshot {
                title: "Kibble".to_string(),
                images: Vec::new(),
                stock: 10,
                price,
                compare_at_price: list_cents.map(|cents| Decimal::new(cents, 2)),
                sizes: Vec::new(),
            },
            quantity,
            size: Size::one_size(),
            price_at_time: price,
        }
    }

    #[test]
    fn subtotal_sums_price_at_time_times_quantity() {
        let items = [item(1_999, 2, None), item(550, 3, None)];

        assert_eq!(subtotal(&items), Decimal::new(5_648, 2));
    }

    #[test]
    fn empty_items_have_zero_totals() {
        let totals = Totals::calculate(&[], TaxRate::default(), Decimal::ZERO);

        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn tax_rounds_half_away_from_zero() {
        // 0.08 × 10.5625 = 0.845 → 0.85
        let rate = TaxRate::from_fraction(0.08);

        assert_eq!(tax(Decimal::new(105_625, 4), rate), Decimal::new(85, 2));
    }

    #[test]
    fn total_applies_tax_and_discount() {
        let items = [item(2_500, 2, None)];
        let totals = Totals::calculate(&items, TaxRate::from_fraction(0.1), Decimal::new(500, 2));

        assert_eq!(totals.subtotal, Decimal::new(5_000, 2));
        assert_eq!(totals.tax, Decimal::new(500, 2));
        assert_eq!(totals.total, Decimal::new(5_000, 2));
        assert_eq!(
            totals.total,
            round_money(totals.subtotal + totals.tax - totals.discount)
        );
    }

    #[test]
    fn recalculating_is_idempotent() {
        let items = [item(333, 3, None), item(1_001, 1, None)];
        let rate = TaxRate::from_fraction(0.0725);

        let first = Totals::calculate(&items, rate, Decimal::ZERO);
        let second = Totals::calculate(&items, rate, Decimal::ZERO);

        assert_eq!(first, second);
        assert_eq!(tax(first.subtotal, rate), first.tax);
    }

    #[test]
    fn savings_ignore_items_without_markdown() {
        let items = [
            item(800, 2, Some(1_000)),
            item(500, 1, None),
            item(900, 1, Some(700)),
        ];

        assert_eq!(savings(&items), Decimal::new(400, 2));
    }

    #[test]
    fn formats_in_dollars() {
        assert_eq!(format_amount(Decimal::new(1_250, 2)), "$12.50");
    }
}
