//! Free gift injected into the cart.

use std::sync::Arc;

use super::{Eligibility, PROMOTION_TYPE};
use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::counter::ItemCounter;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::identity::Identity;
use crate::item::ItemRef;
use crate::promotion::{Promotion, PromotionRef};
use crate::snapshot::ModifiedCartData;
use crate::validation::validate_quantity;

/// Adds `quantity` units of a gift on top of any the customer bought in
/// stage 2, and takes only those added units off its subtotal in stage 3.
///
/// ```text
/// stage 2:  [A ×2]            ──► [A ×2, GIFT ×1]   diff GIFT +1, restart
///           [A ×2, GIFT ×1]   ──► [A ×2, GIFT ×1]   no diff, converged
/// stage 3:  GIFT 500          ──► 0                 impact -500
///
/// stage 2:  [GIFT ×3]         ──► [GIFT ×4]
/// stage 3:  GIFT 2000         ──► 1500              impact -500
/// ```
#[derive(Debug, Clone)]
pub struct GiftItem {
    cart_id: String,
    gift: ItemRef,
    quantity: i64,
    eligibility: Eligibility,
}

impl GiftItem {
    pub fn new(cart_id: impl Into<String>, gift: ItemRef, quantity: i64) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        Ok(GiftItem {
            cart_id: cart_id.into(),
            gift,
            quantity,
            eligibility: Eligibility::Always,
        })
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn into_ref(self) -> PromotionRef {
        Arc::new(self)
    }
}

impl Identity for GiftItem {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        PROMOTION_TYPE
    }
}

impl Promotion for GiftItem {
    fn is_eligible(&self, cart: &CartState) -> bool {
        self.eligibility.check(cart)
    }

    fn reduce_items(
        &self,
        cart: &ModifiedCartData,
        mut counters: Vec<ItemCounter>,
    ) -> CoreResult<Vec<ItemCounter>> {
        let gift = self.gift.key();
        let bought = cart.item_quantity(&gift).unwrap_or(0);
        counters.retain(|counter| counter.key() != gift);
        counters.push(ItemCounter::new(self.gift.clone(), bought + self.quantity));
        Ok(counters)
    }

    fn reduce_item_subtotal(
        &self,
        cart: &ModifiedCartData,
        item: &ItemRef,
        subtotal: DecimalValue,
        _context: &mut PromoCalculationsContext,
    ) -> CoreResult<DecimalValue> {
        if item.key() != self.gift.key() {
            return Ok(subtotal);
        }

        let scale = cart.subtotal_scale();
        let free_value = DecimalValue::from_int(item.unit_price())
            .mul_scaled(DecimalValue::from_int(self.quantity), scale);
        Ok(subtotal.sub_scaled(free_value, scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CartKey;
    use crate::item::Product;

    fn gift_promotion() -> PromotionRef {
        GiftItem::new("MUG_GIFT", Product::new("MUG", "gift", 500).into_ref(), 1)
            .unwrap()
            .with_eligibility(Eligibility::MinimumSubtotal { amount: 1000 })
            .into_ref()
    }

    #[test]
    fn test_gift_is_injected_and_free() {
        let mut cart = CartState::new();
        cart.add_item(Product::new("A", "product", 600).into_ref(), 2)
            .unwrap();
        cart.add_promotion(gift_promotion());

        let totals = cart.perform_totals().unwrap();
        let mug = CartKey::new("MUG", "gift");

        assert_eq!(totals.item_quantity(&mug), Some(1));
        assert_eq!(totals.total(), DecimalValue::from_int(1200));
        assert_eq!(
            totals.impact_of_promotion(&CartKey::new("MUG_GIFT", PROMOTION_TYPE)),
            DecimalValue::from_int(-500)
        );
        assert!(totals.has_item_diff());

        // the stored cart never sees the gift
        assert!(!cart.has_item(&mug));
    }

    #[test]
    fn test_gift_withheld_below_threshold() {
        let mut cart = CartState::new();
        cart.add_item(Product::new("A", "product", 300).into_ref(), 1)
            .unwrap();
        cart.add_promotion(gift_promotion());

        let totals = cart.perform_totals().unwrap();
        assert_eq!(totals.item_quantity(&CartKey::new("MUG", "gift")), None);
        assert_eq!(totals.not_eligible().len(), 1);
    }

    #[test]
    fn test_gift_adds_to_units_already_bought() {
        let mug = Product::new("MUG", "gift", 500).into_ref();
        let mut cart = CartState::new();
        cart.add_item(mug, 3).unwrap();
        cart.add_promotion(gift_promotion());

        let totals = cart.perform_totals().unwrap();
        let key = CartKey::new("MUG", "gift");

        assert_eq!(totals.item_quantity(&key), Some(4));
        assert_eq!(totals.total(), DecimalValue::from_int(1500));
        assert_eq!(
            totals.impact_of_promotion(&CartKey::new("MUG_GIFT", PROMOTION_TYPE)),
            DecimalValue::from_int(-500)
        );
        assert_eq!(cart.quantity_of(&key), Some(3));
    }
}
