//! Guest Cart Entries
//!
//! A guest cart is stored as bare `(product, quantity, size)` triples. Prices
//! and product details are joined in later, when the cart is hydrated.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashSet, FxHasher};
use serde::{Deserialize, Serialize};

use crate::products::{ProductId, Size};

/// One guest cart row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartEntry {
    /// Product id
    pub product_id: ProductId,

    /// Quantity, always at least one
    pub quantity: u32,

    /// Selected size
    pub size: Size,
}

impl GuestCartEntry {
    /// Create an entry.
    pub fn new(product_id: impl Into<ProductId>, quantity: u32, size: impl Into<Size>) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            size: size.into(),
        }
    }

    /// Whether this entry represents `product_id` in `size`.
    pub fn matches(&self, product_id: &ProductId, size: &Size) -> bool {
        self.product_id == *product_id && self.size == *size
    }
}

/// Identity of an entry set; changes whenever any entry changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntrySetFingerprint(u64);

/// Ordered guest entries holding at most one entry per product and size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestEntries(Vec<GuestCartEntry>);

impl GuestEntries {
    /// Build from stored entries, merging duplicates and dropping empty rows.
    pub fn from_stored(entries: Vec<GuestCartEntry>) -> Self {
        let mut merged = Self::default();

        for entry in entries {
            merged.add(entry.product_id, entry.quantity, entry.size);
        }

        merged
    }

    /// Add `quantity` units, summing with an existing entry for the same product and size.
    ///
    /// Adding zero units is a no-op.
    pub fn add(&mut self, product_id: ProductId, quantity: u32, size: Size) {
        if quantity == 0 {
            return;
        }

        match self.find_mut(&product_id, &size) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.0.push(GuestCartEntry {
                product_id,
                quantity,
                size,
            }),
        }
    }

    /// Remove the entry for a product and size. Returns whether one was removed.
    pub fn remove(&mut self, product_id: &ProductId, size: &Size) -> bool {
        let before = self.0.len();

        self.0.retain(|entry| !entry.matches(product_id, size));

        self.0.len() != before
    }

    /// Replace an entry's quantity; a quantity of zero or less removes it.
    ///
    /// Returns whether the entries changed.
    pub fn set_quantity(&mut self, product_id: &ProductId, size: &Size, quantity: i64) -> bool {
        let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);

        if quantity == 0 {
            return self.remove(product_id, size);
        }

        match self.find_mut(product_id, size) {
            Some(existing) if existing.quantity != quantity => {
                existing.quantity = quantity;
                true
            }
            Some(_) | None => false,
        }
    }

    /// Find the entry for a product and size.
    pub fn find(&self, product_id: &ProductId, size: &Size) -> Option<&GuestCartEntry> {
        self.0.iter().find(|entry| entry.matches(product_id, size))
    }

    fn find_mut(&mut self, product_id: &ProductId, size: &Size) -> Option<&mut GuestCartEntry> {
        self.0
            .iter_mut()
            .find(|entry| entry.matches(product_id, size))
    }

    /// Distinct product ids in first-seen order.
    pub fn distinct_product_ids(&self) -> Vec<ProductId> {
        let mut seen = FxHashSet::default();

        self.0
            .iter()
            .filter(|entry| seen.insert(&entry.product_id))
            .map(|entry| entry.product_id.clone())
            .collect()
    }

    /// Fingerprint of the current entries.
    pub fn fingerprint(&self) -> EntrySetFingerprint {
        let mut hasher = FxHasher::default();

        self.0.hash(&mut hasher);

        EntrySetFingerprint(hasher.finish())
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Entries in insertion order.
    pub fn as_slice(&self) -> &[GuestCartEntry] {
        &self.0
    }

    /// Consume into the entry list.
    #[must_use]
    pub fn into_vec(self) -> Vec<GuestCartEntry> {
        self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: &str) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn adding_same_product_and_size_sums_quantities() {
        let mut entries = GuestEntries::default();

        entries.add(p("P1"), 2, Size::from("M"));
        entries.add(p("P1"), 3, Size::from("M"));

        assert_eq!(entries.as_slice(), [GuestCartEntry::new("P1", 5, "M")]);
    }

    #[test]
    fn different_sizes_are_distinct_entries() {
        let mut entries = GuestEntries::default();

        entries.add(p("P1"), 1, Size::from("M"));
        entries.add(p("P1"), 1, Size::from("L"));

        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn adding_zero_units_is_a_no_op() {
        let mut entries = GuestEntries::default();

        entries.add(p("P1"), 0, Size::from("M"));

        assert!(entries.is_empty());
    }

    #[test]
    fn setting_quantity_to_zero_removes_entry() {
        let mut entries = GuestEntries::default();
        entries.add(p("P1"), 2, Size::from("M"));
        entries.add(p("P2"), 1, Size::from("L"));

        let mut removed = entries.clone();
        removed.remove(&p("P1"), &Size::from("M"));

        assert!(entries.set_quantity(&p("P1"), &Size::from("M"), 0));
        assert_eq!(entries, removed);
    }

    #[test]
    fn setting_negative_quantity_removes_entry() {
        let mut entries = GuestEntries::default();
        entries.add(p("P1"), 2, Size::from("M"));

        assert!(entries.set_quantity(&p("P1"), &Size::from("M"), -4));
        assert!(entries.is_empty());
    }

    #[test]
    fn setting_quantity_of_missing_entry_changes_nothing() {
        let mut entries = GuestEntries::default();

        assert!(!entries.set_quantity(&p("P1"), &Size::from("M"), 3));
        assert!(entries.is_empty());
    }

    #[test]
    fn from_stored_merges_duplicates_and_drops_empty_rows() {
        let entries = GuestEntries::from_stored(vec![
            GuestCartEntry::new("P1", 1, "M"),
            GuestCartEntry::new("P2", 0, "M"),
            GuestCartEntry::new("P1", 2, "M"),
        ]);

        assert_eq!(entries.as_slice(), [GuestCartEntry::new("P1", 3, "M")]);
    }

    #[test]
    fn distinct_product_ids_deduplicates_in_order() {
        let mut entries = GuestEntries::default();
        entries.add(p("P2"), 1, Size::from("M"));
        entries.add(p("P1"), 1, Size::from("M"));
        entries.add(p("P2"), 1, Size::from("L"));

        assert_eq!(entries.distinct_product_ids(), vec![p("P2"), p("P1")]);
    }

    #[test]
    fn fingerprint_tracks_changes() {
        let mut entries = GuestEntries::default();
        entries.add(p("P1"), 1, Size::from("M"));
        let before = entries.fingerprint();

        assert_eq!(before, entries.clone().fingerprint());

        entries.add(p("P1"), 1, Size::from("M"));

        assert_ne!(before, entries.fingerprint());
    }

    #[test]
    fn serializes_with_camel_case_keys() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(GuestCartEntry::new("P1", 2, "M"))?;

        assert_eq!(
            json,
            serde_json::json!({ "productId": "P1", "quantity": 2, "size": "M" })
        );

        Ok(())
    }
}
