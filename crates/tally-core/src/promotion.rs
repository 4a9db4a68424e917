//! # Promotion Capability
//!
//! A promotion is anything with an identity and up to four reduction hooks.
//! Every hook has a pass-through default, so a concrete promotion only
//! overrides the stages it takes part in.
//!
//! ## Hook Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_eligible             before stage 1   veto itself                  │
//! │  reduce_promotions       stage 1          rewrite the promotion list   │
//! │  reduce_items            stage 2          rewrite the item counters    │
//! │  reduce_item_subtotal    stage 3          adjust one item's subtotal   │
//! │  reduce_items_subtotal   stage 4          re-spread across all items   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Promotions are shared as `Arc<dyn Promotion>` and must not keep mutable
//! state of their own. Anything that must survive between hook calls of a
//! single computation goes into the [`PromoCalculationsContext`].

use std::fmt;
use std::sync::Arc;

use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::counter::ItemCounter;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::identity::{CartKey, Identity};
use crate::item::ItemRef;
use crate::snapshot::ModifiedCartData;

/// Shared handle to a promotion.
pub type PromotionRef = Arc<dyn Promotion>;

// =============================================================================
// Promotion Trait
// =============================================================================

/// A rule that can veto itself, rewrite promotions or items, and adjust
/// subtotals.
pub trait Promotion: Identity + fmt::Debug + Send + Sync {
    /// Whether the promotion takes part in this computation at all.
    fn is_eligible(&self, _cart: &CartState) -> bool {
        true
    }

    /// Stage 1. Receives every other promotion currently in force and
    /// returns the ones that should remain. The engine re-appends `self`.
    fn reduce_promotions(
        &self,
        _cart: &ModifiedCartData,
        promotions: Vec<PromotionRef>,
    ) -> CoreResult<Vec<PromotionRef>> {
        Ok(promotions)
    }

    /// Stage 2. Returns the new counter list. Counters may be dropped,
    /// injected or duplicated; the engine filters and re-keys the result.
    fn reduce_items(
        &self,
        _cart: &ModifiedCartData,
        counters: Vec<ItemCounter>,
    ) -> CoreResult<Vec<ItemCounter>> {
        Ok(counters)
    }

    /// Stage 3. Returns the item's new running subtotal. Negative results
    /// are clamped to zero by the engine.
    fn reduce_item_subtotal(
        &self,
        _cart: &ModifiedCartData,
        _item: &ItemRef,
        subtotal: DecimalValue,
        _context: &mut PromoCalculationsContext,
    ) -> CoreResult<DecimalValue> {
        Ok(subtotal)
    }

    /// Stage 4. Mutates the reducers in place.
    fn reduce_items_subtotal(
        &self,
        _items: &mut [SubtotalReducer],
        _context: &mut PromoCalculationsContext,
        _cart: &ModifiedCartData,
    ) -> CoreResult<()> {
        Ok(())
    }
}

// =============================================================================
// Subtotal Reducer
// =============================================================================

/// Mutable handle over one item's after-promotion subtotal, used in stage 4.
#[derive(Debug, Clone)]
pub struct SubtotalReducer {
    item: ItemRef,
    quantity: i64,
    subtotal: DecimalValue,
}

impl SubtotalReducer {
    pub(crate) fn new(item: ItemRef, quantity: i64, subtotal: DecimalValue) -> Self {
        SubtotalReducer {
            item,
            quantity,
            subtotal,
        }
    }

    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    pub fn key(&self) -> CartKey {
        self.item.key()
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn subtotal(&self) -> DecimalValue {
        self.subtotal
    }

    /// Replaces the subtotal; negative values are stored as zero.
    pub fn set_subtotal(&mut self, subtotal: DecimalValue) {
        self.subtotal = subtotal.clamp_non_negative();
    }
}
