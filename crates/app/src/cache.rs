//! Shared cart cache
//!
//! Holds the last known cart per owner and applies optimistic patches to it.
//! A patch's snapshot only records the rows that patch touches, so rolling it
//! back leaves changes made by other in-flight operations in place.

use std::time::Duration;

use jiff::Timestamp;
use parking_lot::Mutex;
use pawcart::{
    carts::{Cart, CartOwner},
    entries::EntrySetFingerprint,
    ids::CustomerId,
    items::{LineItem, LineItemId, ProductSnapshot},
    pricing::TaxRate,
    products::{ProductId, Size},
};
use rustc_hash::FxHashMap;
use tokio::{sync::watch, time::Instant};

use crate::hydrator::Hydrated;

/// Default age after which a cached cart is refetched.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(30);

/// Whose cart a cache slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartKey {
    Guest,
    Customer(CustomerId),
}

impl From<&CartOwner> for CartKey {
    fn from(owner: &CartOwner) -> Self {
        match owner {
            CartOwner::Guest => Self::Guest,
            CartOwner::Customer(customer) => Self::Customer(customer.clone()),
        }
    }
}

/// An optimistic change to a cached cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartPatch {
    /// Add units, merging into an existing row for the same product and size.
    AddItem {
        product_id: ProductId,
        size: Size,
        quantity: u32,
        product: ProductSnapshot,
    },

    /// Set a row's quantity and, optionally, move it to another size.
    UpdateItem {
        item: LineItemId,
        quantity: u32,
        size: Option<Size>,
    },

    RemoveItem {
        item: LineItemId,
    },

    Clear,
}

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Item(LineItemId),
    Entry(ProductId, Size),
}

impl Row {
    fn matches(&self, item: &LineItem) -> bool {
        match self {
            Self::Item(id) => item.id == *id,
            Self::Entry(product_id, size) => item.matches(product_id, size),
        }
    }
}

impl CartPatch {
    /// Rows the patch touches in `cart`; `None` when it touches the whole cart.
    fn rows(&self, cart: &Cart) -> Option<Vec<Row>> {
        match self {
            Self::AddItem {
                product_id, size, ..
            } => Some(vec![Row::Entry(product_id.clone(), size.clone())]),
            Self::UpdateItem { item, size, .. } => {
                let mut rows = vec![Row::Item(item.clone())];

                if let (Some(size), Some(current)) = (size, cart.item(item)) {
                    rows.push(Row::Entry(current.product_id.clone(), size.clone()));
                }

                Some(rows)
            }
            Self::RemoveItem { item } => Some(vec![Row::Item(item.clone())]),
            Self::Clear => None,
        }
    }

    fn apply(&self, cart: &mut Cart) {
        match self {
            Self::AddItem {
                product_id,
                size,
                quantity,
                product,
            } => match cart
                .items
                .iter_mut()
                .find(|row| row.matches(product_id, size))
            {
                Some(row) => row.quantity = row.quantity.saturating_add(*quantity),
                None => cart.items.push(LineItem {
                    id: LineItem::pending_id(),
                    product_id: product_id.clone(),
                    product: product.clone(),
                    quantity: *quantity,
                    size: size.clone(),
                    price_at_time: product.price,
                }),
            },
            Self::UpdateItem {
                item,
                quantity,
                size,
            } => update_row(cart, item, *quantity, size.as_ref()),
            Self::RemoveItem { item } => cart.items.retain(|row| row.id != *item),
            Self::Clear => cart.items.clear(),
        }
    }
}

fn update_row(cart: &mut Cart, item: &LineItemId, quantity: u32, size: Option<&Size>) {
    let Some(current) = cart.item(item).cloned() else {
        return;
    };

    if let Some(size) = size.filter(|size| **size != current.size) {
        if let Some(target) = cart
            .items
            .iter_mut()
            .find(|row| row.matches(&current.product_id, size))
        {
            target.quantity = target.quantity.saturating_add(quantity);
            cart.items.retain(|row| row.id != *item);

            return;
        }

        if let Some(row) = cart.items.iter_mut().find(|row| row.id == *item) {
            row.size = size.clone();
            row.quantity = quantity;
        }

        return;
    }

    if let Some(row) = cart.items.iter_mut().find(|row| row.id == *item) {
        row.quantity = quantity;
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Saved {
    /// Nothing was cached, so nothing was applied.
    Nothing,

    /// Touched rows before the patch, with their positions, and the ids the
    /// touched rows had after it.
    Rows {
        before: Vec<(usize, LineItem)>,
        after: Vec<LineItemId>,
        updated_at: Timestamp,
    },

    Whole(Cart),
}

/// What an optimistic patch changed, for rolling it back.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    key: CartKey,
    generation: u64,
    saved: Saved,
}

#[derive(Debug)]
struct Slot {
    cart: watch::Sender<Option<Cart>>,
    fingerprint: Option<EntrySetFingerprint>,
    fetched_at: Option<Instant>,
    /// Bumped whenever the cached cart is replaced wholesale.
    generation: u64,
}

impl Slot {
    fn new() -> Self {
        Self {
            cart: watch::Sender::new(None),
            fingerprint: None,
            fetched_at: None,
            generation: 0,
        }
    }
}

#[derive(Debug)]
pub struct CartCache {
    slots: Mutex<FxHashMap<CartKey, Slot>>,
    rate: TaxRate,
    stale_after: Duration,
}

impl CartCache {
    #[must_use]
    pub fn new(rate: TaxRate, stale_after: Duration) -> Self {
        Self {
            slots: Mutex::new(FxHashMap::default()),
            rate,
            stale_after,
        }
    }

    /// Last known cart, fresh or not.
    pub fn get(&self, key: &CartKey) -> Option<Cart> {
        self.slots
            .lock()
            .get(key)
            .and_then(|slot| slot.cart.borrow().clone())
    }

    /// Cached cart, with the fingerprint it was hydrated from, when it was
    /// fetched within the staleness window.
    pub fn fresh(&self, key: &CartKey) -> Option<Hydrated> {
        let slots = self.slots.lock();
        let slot = slots.get(key)?;

        if !self.within_window(slot) {
            return None;
        }

        let cart = slot.cart.borrow().clone()?;

        Some(Hydrated {
            cart,
            fingerprint: slot.fingerprint,
        })
    }

    pub fn is_fresh(&self, key: &CartKey) -> bool {
        self.fresh(key).is_some()
    }

    /// Store an authoritative cart.
    pub fn replace(&self, key: &CartKey, cart: Cart) {
        self.store(
            key,
            Hydrated {
                cart,
                fingerprint: None,
            },
        );
    }

    /// Store a freshly hydrated cart.
    pub fn store(&self, key: &CartKey, hydrated: Hydrated) {
        self.with_slot(key, |slot| {
            slot.fetched_at = Some(Instant::now());
            slot.fingerprint = hydrated.fingerprint;
            slot.generation = slot.generation.wrapping_add(1);
            slot.cart.send_replace(Some(hydrated.cart));
        });
    }

    /// Mark the cached cart stale, keeping it as the last known value.
    pub fn invalidate(&self, key: &CartKey) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            slot.fetched_at = None;
        }
    }

    /// Drop the cached cart entirely.
    pub fn evict(&self, key: &CartKey) {
        if let Some(slot) = self.slots.lock().get_mut(key) {
            slot.fetched_at = None;
            slot.fingerprint = None;
            slot.generation = slot.generation.wrapping_add(1);
            slot.cart.send_replace(None);
        }
    }

    /// Receive the cart for `key` whenever it changes.
    pub fn subscribe(&self, key: &CartKey) -> watch::Receiver<Option<Cart>> {
        self.with_slot(key, |slot| slot.cart.subscribe())
    }

    /// Snapshot the rows `patch` touches, then apply it.
    ///
    /// Does nothing when no cart is cached for `key`.
    pub fn begin(&self, key: &CartKey, patch: &CartPatch) -> CartSnapshot {
        let rate = self.rate;

        let (generation, saved) = self.with_slot(key, |slot| {
            let mut saved = Saved::Nothing;

            slot.cart.send_if_modified(|cached| {
                let Some(cart) = cached else {
                    return false;
                };

                saved = match patch.rows(cart) {
                    Some(rows) => {
                        let before = touched(cart, &rows)
                            .map(|(index, item)| (index, item.clone()))
                            .collect();

                        let updated_at = cart.updated_at;

                        patch.apply(cart);

                        Saved::Rows {
                            before,
                            after: touched(cart, &rows).map(|(_, item)| item.id.clone()).collect(),
                            updated_at,
                        }
                    }
                    None => {
                        let whole = cart.clone();

                        patch.apply(cart);

                        Saved::Whole(whole)
                    }
                };

                cart.recalculate(rate);
                cart.touch();

                true
            });

            (slot.generation, saved)
        });

        CartSnapshot {
            key: key.clone(),
            generation,
            saved,
        }
    }

    /// Undo exactly what the snapshotted patch changed.
    ///
    /// When the cart was replaced since the patch began, the snapshot no
    /// longer describes it; the slot is marked stale instead so the next read
    /// refetches.
    pub fn rollback(&self, snapshot: CartSnapshot) {
        let rate = self.rate;
        let CartSnapshot {
            key,
            generation,
            saved,
        } = snapshot;

        self.with_slot(&key, |slot| {
            if slot.generation != generation {
                slot.fetched_at = None;

                return;
            }

            slot.cart.send_if_modified(|cached| match saved {
                Saved::Nothing => false,
                Saved::Whole(whole) => {
                    *cached = Some(whole);

                    true
                }
                Saved::Rows {
                    before,
                    after,
                    updated_at,
                } => {
                    let Some(cart) = cached else {
                        return false;
                    };

                    cart.items.retain(|item| {
                        !after.contains(&item.id) && !before.iter().any(|(_, row)| row.id == item.id)
                    });

                    for (index, item) in before {
                        let index = index.min(cart.items.len());

                        cart.items.insert(index, item);
                    }

                    cart.recalculate(rate);
                    cart.updated_at = updated_at;

                    true
                }
            });
        });
    }

    fn within_window(&self, slot: &Slot) -> bool {
        slot.fetched_at
            .is_some_and(|fetched_at| fetched_at.elapsed() < self.stale_after)
    }

    fn with_slot<T>(&self, key: &CartKey, f: impl FnOnce(&mut Slot) -> T) -> T {
        let mut slots = self.slots.lock();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);

        f(slot)
    }
}

fn touched<'a>(cart: &'a Cart, rows: &'a [Row]) -> impl Iterator<Item = (usize, &'a LineItem)> {
    cart.items
        .iter()
        .enumerate()
        .filter(move |(_, item)| rows.iter().any(|row| row.matches(item)))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::test::{line_item, product};

    fn cache() -> CartCache {
        CartCache::new(TaxRate::default(), DEFAULT_STALE_AFTER)
    }

    fn customer() -> CartKey {
        CartKey::Customer(CustomerId::new("c1"))
    }

    fn seeded(cache: &CartCache) -> Cart {
        let cart = Cart::from_items(
            CartOwner::Customer(CustomerId::new("c1")),
            vec![
                line_item("i1", "p1", "M", 2, Decimal::new(1_000, 2)),
                line_item("i2", "p2", "S", 1, Decimal::new(500, 2)),
            ],
            TaxRate::default(),
            Decimal::ZERO,
        );

        cache.replace(&customer(), cart.clone());

        cart
    }

    #[test]
    fn patches_recompute_totals() {
        let cache = cache();
        seeded(&cache);

        cache.begin(
            &customer(),
            &CartPatch::UpdateItem {
                item: "i1".into(),
                quantity: 3,
                size: None,
            },
        );

        let cart = cache.get(&customer());

        assert_eq!(cart.as_ref().map(|cart| cart.subtotal), Some(Decimal::new(3_500, 2)));
        assert_eq!(cart.map(|cart| cart.tax), Some(Decimal::new(280, 2)));
    }

    #[test]
    fn rollback_restores_the_exact_prior_state() {
        let cache = cache();
        let before = seeded(&cache);

        let snapshot = cache.begin(
            &customer(),
            &CartPatch::UpdateItem {
                item: "i1".into(),
                quantity: 3,
                size: None,
            },
        );

        assert_ne!(cache.get(&customer()), Some(before.clone()));

        cache.rollback(snapshot);

        assert_eq!(cache.get(&customer()), Some(before));
    }

    #[test]
    fn rollback_leaves_concurrent_changes_alone() -> TestResult {
        let cache = cache();
        seeded(&cache);

        let update = cache.begin(
            &customer(),
            &CartPatch::UpdateItem {
                item: "i1".into(),
                quantity: 5,
                size: None,
            },
        );
        let _removal = cache.begin(&customer(), &CartPatch::RemoveItem { item: "i2".into() });

        cache.rollback(update);

        let cart = cache.get(&customer()).ok_or("cart missing")?;
        let rows: Vec<_> = cart
            .items
            .iter()
            .map(|item| (item.id.to_string(), item.quantity))
            .collect();

        assert_eq!(rows, vec![("i1".to_string(), 2)]);
        assert_eq!(cart.subtotal, Decimal::new(2_000, 2));

        Ok(())
    }

    #[test]
    fn rollback_after_replacement_does_not_resurrect_rows() -> TestResult {
        let cache = cache();
        seeded(&cache);

        let snapshot = cache.begin(
            &customer(),
            &CartPatch::UpdateItem {
                item: "i1".into(),
                quantity: 5,
                size: None,
            },
        );

        cache.replace(
            &customer(),
            Cart::from_items(
                CartOwner::Customer(CustomerId::new("c1")),
                Vec::new(),
                TaxRate::default(),
                Decimal::ZERO,
            ),
        );

        cache.rollback(snapshot);

        let cart = cache.get(&customer()).ok_or("cart missing")?;

        assert!(cart.is_empty());
        assert!(!cache.is_fresh(&customer()));

        Ok(())
    }

    #[test]
    fn add_merges_or_appends_pending_row() -> TestResult {
        let cache = cache();
        seeded(&cache);

        let leash = product("p1", Decimal::new(1_000, 2), 10, &["M", "L"]);

        cache.begin(
            &customer(),
            &CartPatch::AddItem {
                product_id: "p1".into(),
                size: "M".into(),
                quantity: 1,
                product: leash.snapshot(),
            },
        );
        let added = cache.begin(
            &customer(),
            &CartPatch::AddItem {
                product_id: "p1".into(),
                size: "L".into(),
                quantity: 1,
                product: leash.snapshot(),
            },
        );

        let cart = cache.get(&customer()).ok_or("cart missing")?;

        assert_eq!(cart.item(&"i1".into()).map(|item| item.quantity), Some(3));
        assert!(
            cart.item_for(&"p1".into(), &"L".into())
                .is_some_and(LineItem::is_pending)
        );

        cache.rollback(added);

        let cart = cache.get(&customer()).ok_or("cart missing")?;

        assert!(cart.item_for(&"p1".into(), &"L".into()).is_none());
        assert_eq!(cart.item(&"i1".into()).map(|item| item.quantity), Some(3));

        Ok(())
    }

    #[test]
    fn size_change_merges_into_existing_row() -> TestResult {
        let cache = cache();
        let before = seeded(&cache);

        cache.replace(&customer(), {
            let mut cart = before;
            cart.items
                .push(line_item("i3", "p1", "L", 1, Decimal::new(1_000, 2)));
            cart.recalculate(TaxRate::default());
            cart
        });

        let original = cache.get(&customer());
        let snapshot = cache.begin(
            &customer(),
            &CartPatch::UpdateItem {
                item: "i1".into(),
                quantity: 2,
                size: Some("L".into()),
            },
        );

        let cart = cache.get(&customer()).ok_or("cart missing")?;

        assert!(cart.item(&"i1".into()).is_none());
        assert_eq!(cart.item(&"i3".into()).map(|item| item.quantity), Some(3));

        cache.rollback(snapshot);

        assert_eq!(cache.get(&customer()), original);

        Ok(())
    }

    #[test]
    fn clear_rolls_back_whole_cart() {
        let cache = cache();
        let before = seeded(&cache);

        let snapshot = cache.begin(&customer(), &CartPatch::Clear);

        assert_eq!(cache.get(&customer()).map(|cart| cart.is_empty()), Some(true));

        cache.rollback(snapshot);

        assert_eq!(cache.get(&customer()), Some(before));
    }

    #[test]
    fn patches_without_cached_cart_do_nothing() {
        let cache = cache();

        let snapshot = cache.begin(&CartKey::Guest, &CartPatch::Clear);

        assert_eq!(cache.get(&CartKey::Guest), None);

        cache.rollback(snapshot);

        assert_eq!(cache.get(&CartKey::Guest), None);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_go_stale_after_window() {
        let cache = cache();
        seeded(&cache);

        assert!(cache.is_fresh(&customer()));

        tokio::time::advance(DEFAULT_STALE_AFTER).await;

        assert!(!cache.is_fresh(&customer()));
        assert!(cache.get(&customer()).is_some());
    }

    #[test]
    fn invalidate_keeps_last_known_value() {
        let cache = cache();
        seeded(&cache);

        cache.invalidate(&customer());

        assert!(!cache.is_fresh(&customer()));
        assert!(cache.get(&customer()).is_some());

        cache.evict(&customer());

        assert_eq!(cache.get(&customer()), None);
    }

    #[test]
    fn subscribers_see_optimistic_changes() -> TestResult {
        let cache = cache();
        let mut updates = cache.subscribe(&customer());

        seeded(&cache);

        assert!(updates.has_changed()?);
        updates.mark_unchanged();

        cache.begin(&customer(), &CartPatch::RemoveItem { item: "i1".into() });

        assert!(updates.has_changed()?);
        assert_eq!(
            updates.borrow().as_ref().map(Cart::unit_count),
            Some(1)
        );

        Ok(())
    }
}
