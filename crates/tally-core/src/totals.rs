//! # Cart Totals
//!
//! Immutable result of one `perform_totals()` call, and every query that
//! projects it. Nothing here recomputes promotions.
//!
//! ## Anatomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartTotals                                                             │
//! │  ├── items            converged counters (after stage 2)               │
//! │  ├── promotions       converged promotions (after stage 1)             │
//! │  ├── not_eligible     vetoed and never re-added                        │
//! │  ├── promo_impacts    stage 1 + 2 diffs, keyed by promotion            │
//! │  ├── item_subtotals   before / after per item (stage 3 + 4)            │
//! │  └── item_impacts     signed price deltas per item × promotion         │
//! │                                                                         │
//! │  total()          = Σ after                                            │
//! │  subtotal()       = Σ before                                           │
//! │  savings()        = subtotal() - total()                               │
//! │  rounded_total()  = total() rounded to rounding_decimals               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use indexmap::IndexMap;

use crate::config::CartConfig;
use crate::counter::ItemCounter;
use crate::decimal::DecimalValue;
use crate::error::{CoreError, CoreResult};
use crate::filter::ItemFilter;
use crate::identity::CartKey;
use crate::impact::{ItemPromoImpact, ItemSubtotal, PromoImpact};
use crate::promotion::PromotionRef;
use crate::report::TotalsReport;

/// Snapshot produced by the totals engine.
#[derive(Debug, Clone)]
pub struct CartTotals {
    items: IndexMap<CartKey, ItemCounter>,
    promotions: IndexMap<CartKey, PromotionRef>,
    not_eligible: Vec<PromotionRef>,
    promo_impacts: IndexMap<CartKey, PromoImpact>,
    item_subtotals: Vec<ItemSubtotal>,
    item_impacts: Vec<ItemPromoImpact>,
    rounding_decimals: i32,
    total_scale: u32,
}

/// Everything the engine hands over when it finishes.
pub(crate) struct TotalsParts {
    pub items: IndexMap<CartKey, ItemCounter>,
    pub promotions: IndexMap<CartKey, PromotionRef>,
    pub not_eligible: Vec<PromotionRef>,
    pub promo_impacts: IndexMap<CartKey, PromoImpact>,
    pub item_subtotals: Vec<ItemSubtotal>,
    pub item_impacts: Vec<ItemPromoImpact>,
}

impl CartTotals {
    pub(crate) fn new(parts: TotalsParts, config: &CartConfig) -> Self {
        CartTotals {
            items: parts.items,
            promotions: parts.promotions,
            not_eligible: parts.not_eligible,
            promo_impacts: parts.promo_impacts,
            item_subtotals: parts.item_subtotals,
            item_impacts: parts.item_impacts,
            rounding_decimals: config.rounding_decimals,
            total_scale: config.total_scale,
        }
    }

    // =========================================================================
    // Collections
    // =========================================================================

    /// Converged item counters, keyed.
    pub fn items(&self) -> &IndexMap<CartKey, ItemCounter> {
        &self.items
    }

    /// Converged promotions, keyed.
    pub fn promotions(&self) -> &IndexMap<CartKey, PromotionRef> {
        &self.promotions
    }

    /// Promotions that vetoed themselves and were never re-added.
    pub fn not_eligible(&self) -> &[PromotionRef] {
        &self.not_eligible
    }

    /// Convergence-stage impacts, keyed by promotion.
    pub fn promo_impacts(&self) -> &IndexMap<CartKey, PromoImpact> {
        &self.promo_impacts
    }

    pub fn promo_impact(&self, promotion: &CartKey) -> Option<&PromoImpact> {
        self.promo_impacts.get(promotion)
    }

    /// Per-item subtotals in item order.
    pub fn item_subtotals(&self) -> &[ItemSubtotal] {
        &self.item_subtotals
    }

    pub fn subtotal_for_item(&self, item: &CartKey) -> Option<&ItemSubtotal> {
        self.item_subtotals
            .iter()
            .find(|subtotal| &subtotal.key() == item)
    }

    /// Price impacts in the order they were recorded.
    pub fn item_promo_impacts(&self) -> &[ItemPromoImpact] {
        &self.item_impacts
    }

    /// Converged quantity of an item, `None` when absent.
    pub fn item_quantity(&self, item: &CartKey) -> Option<i64> {
        self.items.get(item).map(|counter| counter.quantity)
    }

    // =========================================================================
    // Diff Presence
    // =========================================================================

    /// True if any promotion rewrote the promotion list.
    pub fn has_promotion_diff(&self) -> bool {
        self.promo_impacts
            .values()
            .any(|impact| !impact.caused_by_promotion_reduction.is_empty())
    }

    /// True if any promotion rewrote the item counters.
    pub fn has_item_diff(&self) -> bool {
        self.promo_impacts
            .values()
            .any(|impact| !impact.caused_by_item_reduction.is_empty())
    }

    // =========================================================================
    // Amounts
    // =========================================================================

    /// Grand total: Σ after-promotion subtotals.
    pub fn total(&self) -> DecimalValue {
        self.total_for(&ItemFilter::All)
    }

    /// Σ after-promotion subtotals of matching items.
    pub fn total_for(&self, filter: &ItemFilter) -> DecimalValue {
        self.item_subtotals
            .iter()
            .filter(|subtotal| filter.matches_type(subtotal.item.cart_type()))
            .fold(DecimalValue::ZERO, |total, subtotal| {
                total.add_scaled(subtotal.subtotal_after_promotions, self.total_scale)
            })
    }

    /// Σ before-promotion subtotals.
    pub fn subtotal(&self) -> DecimalValue {
        self.subtotal_for(&ItemFilter::All)
    }

    /// Σ before-promotion subtotals of matching items.
    pub fn subtotal_for(&self, filter: &ItemFilter) -> DecimalValue {
        self.item_subtotals
            .iter()
            .filter(|subtotal| filter.matches_type(subtotal.item.cart_type()))
            .fold(DecimalValue::ZERO, |total, subtotal| {
                total.add_scaled(subtotal.subtotal_before_promotions, self.total_scale)
            })
    }

    /// How much promotions took off: `subtotal() - total()`.
    pub fn savings(&self) -> DecimalValue {
        self.subtotal().sub_scaled(self.total(), self.total_scale)
    }

    /// Grand total rounded half away from zero to `rounding_decimals`.
    ///
    /// ## Errors
    /// `CoreError::InvalidRoundingScale` when the configured scale is negative.
    pub fn rounded_total(&self) -> CoreResult<DecimalValue> {
        let scale = u32::try_from(self.rounding_decimals).map_err(|_| {
            CoreError::InvalidRoundingScale {
                scale: self.rounding_decimals,
            }
        })?;
        Ok(self.total().round(scale))
    }

    /// `rounded_total() - total()`, the amount rounding added or removed.
    pub fn rounding_amount(&self) -> CoreResult<DecimalValue> {
        Ok(self.rounded_total()? - self.total())
    }

    /// Signed sum of every price impact a promotion recorded.
    pub fn impact_of_promotion(&self, promotion: &CartKey) -> DecimalValue {
        self.item_impacts
            .iter()
            .filter(|impact| &impact.promotion.key() == promotion)
            .map(|impact| impact.price_impact)
            .sum()
    }

    /// Σ unit weight × quantity over matching weighted items.
    pub fn weight(&self, filter: &ItemFilter) -> DecimalValue {
        self.items
            .values()
            .filter(|counter| filter.matches_type(counter.item.cart_type()))
            .filter_map(|counter| {
                counter
                    .item
                    .unit_weight()
                    .map(|weight| weight * DecimalValue::from_int(counter.quantity))
            })
            .sum()
    }

    /// Serializable view of the totals.
    pub fn to_report(&self) -> CoreResult<TotalsReport> {
        TotalsReport::from_totals(self)
    }
}
