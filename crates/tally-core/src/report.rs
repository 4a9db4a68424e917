//! # Totals Report
//!
//! Plain, serializable view of a [`CartTotals`] for hosts and front ends.
//!
//! `CartTotals` holds trait objects and cannot be serialized directly. The
//! report flattens it into keys, quantities and decimal strings:
//!
//! ```text
//! CartTotals ──► to_report() ──► TotalsReport ──► JSON / .ts bindings
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::identity::CartKey;
use crate::totals::CartTotals;

// =============================================================================
// Report DTOs
// =============================================================================

/// Full totals breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TotalsReport {
    pub lines: Vec<LineReport>,
    pub promotions: Vec<CartKey>,
    pub not_eligible: Vec<CartKey>,
    pub promo_impacts: Vec<PromoImpactReport>,
    pub item_impacts: Vec<ItemImpactReport>,
    #[ts(as = "String")]
    pub subtotal: DecimalValue,
    #[ts(as = "String")]
    pub total: DecimalValue,
    #[ts(as = "String")]
    pub savings: DecimalValue,
    #[ts(as = "String")]
    pub rounded_total: DecimalValue,
    #[ts(as = "String")]
    pub rounding_amount: DecimalValue,
}

/// One priced item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineReport {
    pub item: CartKey,
    pub quantity: i64,
    /// Unit price in cents.
    pub unit_price: i64,
    #[ts(as = "String")]
    pub subtotal_before: DecimalValue,
    #[ts(as = "String")]
    pub subtotal_after: DecimalValue,
}

/// What one promotion changed while the lists converged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PromoImpactReport {
    pub promotion: CartKey,
    pub item_changes: Vec<QuantityChange>,
    pub promotion_changes: Vec<QuantityChange>,
}

/// Signed change of an item quantity or of a promotion's presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuantityChange {
    pub key: CartKey,
    pub difference: i64,
}

/// Price change one promotion made to one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemImpactReport {
    pub item: CartKey,
    pub promotion: CartKey,
    #[ts(as = "String")]
    pub price_impact: DecimalValue,
}

impl TotalsReport {
    /// Flattens a totals snapshot.
    ///
    /// ## Errors
    /// `CoreError::InvalidRoundingScale` when the rounding scale is negative.
    pub fn from_totals(totals: &CartTotals) -> CoreResult<Self> {
        let lines = totals
            .item_subtotals()
            .iter()
            .map(|subtotal| LineReport {
                item: subtotal.key(),
                quantity: subtotal.quantity,
                unit_price: subtotal.item.unit_price(),
                subtotal_before: subtotal.subtotal_before_promotions,
                subtotal_after: subtotal.subtotal_after_promotions,
            })
            .collect();

        let promo_impacts = totals
            .promo_impacts()
            .values()
            .map(|impact| PromoImpactReport {
                promotion: impact.promotion.key(),
                item_changes: impact
                    .caused_by_item_reduction
                    .iter()
                    .map(|change| QuantityChange {
                        key: change.key(),
                        difference: change.difference,
                    })
                    .collect(),
                promotion_changes: impact
                    .caused_by_promotion_reduction
                    .iter()
                    .map(|change| QuantityChange {
                        key: change.key(),
                        difference: change.difference,
                    })
                    .collect(),
            })
            .collect();

        let item_impacts = totals
            .item_promo_impacts()
            .iter()
            .map(|impact| ItemImpactReport {
                item: impact.item.key(),
                promotion: impact.promotion.key(),
                price_impact: impact.price_impact,
            })
            .collect();

        Ok(TotalsReport {
            lines,
            promotions: totals.promotions().keys().cloned().collect(),
            not_eligible: totals.not_eligible().iter().map(|p| p.key()).collect(),
            promo_impacts,
            item_impacts,
            subtotal: totals.subtotal(),
            total: totals.total(),
            savings: totals.savings(),
            rounded_total: totals.rounded_total()?,
            rounding_amount: totals.rounding_amount()?,
        })
    }
}
