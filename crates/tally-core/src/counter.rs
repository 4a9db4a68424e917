//! # Item Counters
//!
//! `ItemCounter` pairs an item with a quantity; `ItemCounterStore` is the
//! cart's keyed collection of them.
//!
//! ## Store Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add(A, 2)          { A: 2 }                                           │
//! │  add(A, 3)          { A: 5 }            merge by key                   │
//! │  remove(A, Some(1)) { A: 4 }                                           │
//! │  remove(A, Some(4)) { }                 Inclusive floor: 0 deletes     │
//! │                     { A: 0 }            Legacy floor: only < 0 deletes │
//! │  remove(A, None)    { }                 unconditional                  │
//! │  quantity_of(A)     None                absent, NOT Some(0)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use indexmap::IndexMap;

use crate::config::RemovalFloor;
use crate::identity::CartKey;
use crate::item::ItemRef;

// =============================================================================
// Item Counter
// =============================================================================

/// An item and how many units of it are in play.
///
/// Cloning is shallow: the item handle is shared, the quantity is copied.
#[derive(Debug, Clone)]
pub struct ItemCounter {
    pub item: ItemRef,
    pub quantity: i64,
}

impl ItemCounter {
    pub fn new(item: ItemRef, quantity: i64) -> Self {
        ItemCounter { item, quantity }
    }

    /// Key of the counted item.
    pub fn key(&self) -> CartKey {
        self.item.key()
    }
}

/// Keys a list of counters, summing the quantities of duplicate keys.
///
/// The first occurrence of a key fixes its position and item handle.
pub fn make_keyed<I>(counters: I) -> IndexMap<CartKey, ItemCounter>
where
    I: IntoIterator<Item = ItemCounter>,
{
    let mut keyed: IndexMap<CartKey, ItemCounter> = IndexMap::new();
    for counter in counters {
        keyed
            .entry(counter.key())
            .and_modify(|existing| existing.quantity += counter.quantity)
            .or_insert(counter);
    }
    keyed
}

// =============================================================================
// Item Counter Store
// =============================================================================

/// Insertion-ordered mapping from item key to counter.
#[derive(Debug, Clone, Default)]
pub struct ItemCounterStore {
    counters: IndexMap<CartKey, ItemCounter>,
    floor: RemovalFloor,
}

impl ItemCounterStore {
    /// Creates an empty store with the given removal floor.
    pub fn new(floor: RemovalFloor) -> Self {
        ItemCounterStore {
            counters: IndexMap::new(),
            floor,
        }
    }

    /// Adds `quantity` units, merging into an existing counter by key.
    pub fn add(&mut self, item: ItemRef, quantity: i64) {
        let key = item.key();
        match self.counters.get_mut(&key) {
            Some(counter) => counter.quantity += quantity,
            None => {
                self.counters.insert(key, ItemCounter::new(item, quantity));
            }
        }
    }

    /// Removes units of an item.
    ///
    /// - `None` deletes the counter outright.
    /// - `Some(qty)` subtracts, then deletes according to the floor.
    ///
    /// Returns `false` when the key is not stored.
    pub fn remove(&mut self, key: &CartKey, quantity: Option<i64>) -> bool {
        let Some(counter) = self.counters.get_mut(key) else {
            return false;
        };

        match quantity {
            None => {
                self.counters.shift_remove(key);
            }
            Some(quantity) => {
                counter.quantity -= quantity;
                if self.floor.deletes(counter.quantity) {
                    self.counters.shift_remove(key);
                }
            }
        }
        true
    }

    /// Overwrites the quantity of a stored counter.
    ///
    /// Returns `false` when the key is not stored.
    pub fn set_quantity(&mut self, key: &CartKey, quantity: i64) -> bool {
        match self.counters.get_mut(key) {
            Some(counter) => {
                counter.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Quantity for a key; `None` means absent (distinct from `Some(0)`).
    pub fn quantity_of(&self, key: &CartKey) -> Option<i64> {
        self.counters.get(key).map(|counter| counter.quantity)
    }

    /// Stored counter for a key.
    pub fn get(&self, key: &CartKey) -> Option<&ItemCounter> {
        self.counters.get(key)
    }

    /// Checks if a key is stored.
    pub fn contains(&self, key: &CartKey) -> bool {
        self.counters.contains_key(key)
    }

    /// Removes every counter.
    pub fn clear(&mut self) {
        self.counters.clear();
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Checks if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Counters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemCounter> {
        self.counters.values()
    }

    /// Value copy of the counters, for a totals computation.
    pub fn snapshot(&self) -> Vec<ItemCounter> {
        self.counters.values().cloned().collect()
    }

    /// Stable re-order by a caller-supplied sort key.
    pub fn sort_by_key<K, F>(&mut self, mut sort_key: F)
    where
        K: Ord,
        F: FnMut(&ItemCounter) -> K,
    {
        self.counters.sort_by(|_, a, _, b| sort_key(a).cmp(&sort_key(b)));
    }

    /// Removal floor in effect.
    pub fn floor(&self) -> RemovalFloor {
        self.floor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Product;

    fn item(id: &str) -> ItemRef {
        Product::new(id, "product", 100).into_ref()
    }

    #[test]
    fn test_add_merges_by_key() {
        let mut store = ItemCounterStore::new(RemovalFloor::Inclusive);
        store.add(item("A"), 2);
        store.add(item("A"), 3);

        assert_eq!(store.len(), 1);
        assert_eq!(store.quantity_of(&CartKey::new("A", "product")), Some(5));
    }

    #[test]
    fn test_inclusive_floor_deletes_at_zero() {
        let key = CartKey::new("A", "product");
        let mut store = ItemCounterStore::new(RemovalFloor::Inclusive);
        store.add(item("A"), 2);

        assert!(store.remove(&key, Some(2)));
        assert_eq!(store.quantity_of(&key), None);
    }

    #[test]
    fn test_legacy_floor_keeps_zero() {
        let key = CartKey::new("A", "product");
        let mut store = ItemCounterStore::new(RemovalFloor::Legacy);
        store.add(item("A"), 2);

        store.remove(&key, Some(2));
        assert_eq!(store.quantity_of(&key), Some(0));

        store.remove(&key, Some(1));
        assert_eq!(store.quantity_of(&key), None);
    }

    #[test]
    fn test_remove_without_quantity_and_missing_key() {
        let key = CartKey::new("A", "product");
        let mut store = ItemCounterStore::new(RemovalFloor::Inclusive);
        store.add(item("A"), 7);

        assert!(store.remove(&key, None));
        assert!(store.is_empty());
        assert!(!store.remove(&key, None));
    }

    #[test]
    fn test_make_keyed_sums_duplicates_in_first_seen_order() {
        let keyed = make_keyed(vec![
            ItemCounter::new(item("B"), 1),
            ItemCounter::new(item("A"), 2),
            ItemCounter::new(item("B"), 4),
        ]);

        let order: Vec<_> = keyed.keys().map(|k| k.cart_id.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
        assert_eq!(keyed[&CartKey::new("B", "product")].quantity, 5);
    }

    #[test]
    fn test_snapshot_is_a_value_copy() {
        let key = CartKey::new("A", "product");
        let mut store = ItemCounterStore::new(RemovalFloor::Inclusive);
        store.add(item("A"), 2);

        let mut copy = store.snapshot();
        copy[0].quantity = 99;
        assert_eq!(store.quantity_of(&key), Some(2));
    }
}
