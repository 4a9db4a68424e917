//! # Modified Cart Data
//!
//! Read-only view of the cart handed to every promotion hook.
//!
//! ## Which Data a Hook Sees
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Stage                    items                  promotions            │
//! │  ───────────────────────  ─────────────────────  ───────────────────── │
//! │  1  reduce_promotions     pre-stage counters     current working list │
//! │  2  reduce_items          pre-stage counters     converged list       │
//! │  3  reduce_item_subtotal  converged counters     converged list       │
//! │  4  reduce_items_subtotal converged counters     converged list       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stage 1 and 2 views are intentionally stale: a hook sees the items as
//! they were when the stage began, not the list it is currently rewriting.

use crate::counter::ItemCounter;
use crate::identity::CartKey;
use crate::item::ItemRef;
use crate::promotion::PromotionRef;

/// Snapshot of items and promotions, plus the arithmetic scales in force.
#[derive(Debug, Clone)]
pub struct ModifiedCartData {
    items: Vec<ItemCounter>,
    promotions: Vec<PromotionRef>,
    subtotal_scale: u32,
    redistribution_scale: u32,
}

impl ModifiedCartData {
    pub(crate) fn new(
        items: Vec<ItemCounter>,
        promotions: Vec<PromotionRef>,
        subtotal_scale: u32,
        redistribution_scale: u32,
    ) -> Self {
        ModifiedCartData {
            items,
            promotions,
            subtotal_scale,
            redistribution_scale,
        }
    }

    /// Items and their quantities.
    pub fn items(&self) -> &[ItemCounter] {
        &self.items
    }

    /// Promotions in force for this view.
    pub fn promotions(&self) -> &[PromotionRef] {
        &self.promotions
    }

    /// Quantity of an item, `None` when absent.
    pub fn item_quantity(&self, key: &CartKey) -> Option<i64> {
        self.items
            .iter()
            .find(|counter| &counter.key() == key)
            .map(|counter| counter.quantity)
    }

    /// Item handle for a key, `None` when absent.
    pub fn item(&self, key: &CartKey) -> Option<&ItemRef> {
        self.items
            .iter()
            .find(|counter| &counter.key() == key)
            .map(|counter| &counter.item)
    }

    /// Whether a promotion with this key is in force.
    pub fn has_promotion(&self, key: &CartKey) -> bool {
        self.promotions.iter().any(|promotion| &promotion.key() == key)
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|counter| counter.quantity).sum()
    }

    /// Scale for per-item subtotal arithmetic.
    pub fn subtotal_scale(&self) -> u32 {
        self.subtotal_scale
    }

    /// Scale for cross-item redistribution arithmetic.
    pub fn redistribution_scale(&self) -> u32 {
        self.redistribution_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Product;

    #[test]
    fn test_item_quantity_lookup() {
        let snapshot = ModifiedCartData::new(
            vec![
                ItemCounter::new(Product::new("A", "product", 200).into_ref(), 2),
                ItemCounter::new(Product::new("B", "product", 120).into_ref(), 3),
            ],
            Vec::new(),
            4,
            10,
        );

        assert_eq!(snapshot.item_quantity(&CartKey::new("B", "product")), Some(3));
        assert_eq!(snapshot.item_quantity(&CartKey::new("C", "product")), None);
        assert_eq!(snapshot.total_quantity(), 5);
        assert!(!snapshot.has_promotion(&CartKey::new("A", "product")));
    }
}
