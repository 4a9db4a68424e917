//! # Impact Records
//!
//! Signed audit records of what each promotion changed.
//!
//! ```text
//! stage 1  PromotionDifference ─┐
//! stage 2  ItemDifference      ─┴─► PromoImpact (one per promotion)
//! stage 3  ┐
//! stage 4  ┴─────────────────────► ItemPromoImpact (one per item × promotion change)
//! ```

use crate::decimal::DecimalValue;
use crate::identity::CartKey;
use crate::item::ItemRef;
use crate::promotion::PromotionRef;

/// Signed quantity change of one item.
#[derive(Debug, Clone)]
pub struct ItemDifference {
    pub item: ItemRef,
    pub difference: i64,
}

impl ItemDifference {
    pub fn key(&self) -> CartKey {
        self.item.key()
    }
}

/// A promotion entering (`+1`) or leaving (`-1`) the working list.
#[derive(Debug, Clone)]
pub struct PromotionDifference {
    pub promotion: PromotionRef,
    pub difference: i64,
}

impl PromotionDifference {
    pub fn key(&self) -> CartKey {
        self.promotion.key()
    }
}

/// Everything one promotion changed in the convergence stages.
#[derive(Debug, Clone)]
pub struct PromoImpact {
    pub promotion: PromotionRef,
    pub caused_by_item_reduction: Vec<ItemDifference>,
    pub caused_by_promotion_reduction: Vec<PromotionDifference>,
}

impl PromoImpact {
    pub fn new(promotion: PromotionRef) -> Self {
        PromoImpact {
            promotion,
            caused_by_item_reduction: Vec::new(),
            caused_by_promotion_reduction: Vec::new(),
        }
    }

    /// True when either diff list is non-empty.
    pub fn has_changes(&self) -> bool {
        !self.caused_by_item_reduction.is_empty() || !self.caused_by_promotion_reduction.is_empty()
    }
}

/// A price change a promotion made to one item in stage 3 or 4.
#[derive(Debug, Clone)]
pub struct ItemPromoImpact {
    pub item: ItemRef,
    pub promotion: PromotionRef,
    pub price_impact: DecimalValue,
}

/// One item's subtotal before and after promotions.
#[derive(Debug, Clone)]
pub struct ItemSubtotal {
    pub item: ItemRef,
    pub quantity: i64,
    pub subtotal_before_promotions: DecimalValue,
    pub subtotal_after_promotions: DecimalValue,
}

impl ItemSubtotal {
    pub fn key(&self) -> CartKey {
        self.item.key()
    }

    /// `after - before`, zero or negative for discounts.
    pub fn promotion_delta(&self) -> DecimalValue {
        self.subtotal_after_promotions - self.subtotal_before_promotions
    }
}
