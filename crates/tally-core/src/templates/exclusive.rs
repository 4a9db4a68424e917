//! Wrapper that makes any promotion exclusive.

use std::sync::Arc;

use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::counter::ItemCounter;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::identity::{CartKey, Identity};
use crate::item::ItemRef;
use crate::promotion::{Promotion, PromotionRef, SubtotalReducer};
use crate::snapshot::ModifiedCartData;

/// Runs `inner` and, in stage 1, removes every other promotion except the
/// allow-listed ones.
///
/// ```text
/// [TEN, FLAT, VIP=Exclusive(allow: FLAT)]
///   VIP.reduce_promotions ──► [FLAT, VIP]    TEN removed, restart
/// ```
#[derive(Debug, Clone)]
pub struct Exclusive<P> {
    inner: P,
    allow: Vec<CartKey>,
}

impl<P: Promotion + 'static> Exclusive<P> {
    pub fn new(inner: P) -> Self {
        Exclusive {
            inner,
            allow: Vec::new(),
        }
    }

    /// Lets a promotion coexist with this one.
    pub fn allowing(mut self, promotion: CartKey) -> Self {
        self.allow.push(promotion);
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn into_ref(self) -> PromotionRef {
        Arc::new(self)
    }
}

impl<P: Identity> Identity for Exclusive<P> {
    fn cart_id(&self) -> &str {
        self.inner.cart_id()
    }

    fn cart_type(&self) -> &str {
        self.inner.cart_type()
    }
}

impl<P: Promotion> Promotion for Exclusive<P> {
    fn is_eligible(&self, cart: &CartState) -> bool {
        self.inner.is_eligible(cart)
    }

    fn reduce_promotions(
        &self,
        cart: &ModifiedCartData,
        promotions: Vec<PromotionRef>,
    ) -> CoreResult<Vec<PromotionRef>> {
        let mut remaining = self.inner.reduce_promotions(cart, promotions)?;
        remaining.retain(|promotion| self.allow.contains(&promotion.key()));
        Ok(remaining)
    }

    fn reduce_items(
        &self,
        cart: &ModifiedCartData,
        counters: Vec<ItemCounter>,
    ) -> CoreResult<Vec<ItemCounter>> {
        self.inner.reduce_items(cart, counters)
    }

    fn reduce_item_subtotal(
        &self,
        cart: &ModifiedCartData,
        item: &ItemRef,
        subtotal: DecimalValue,
        context: &mut PromoCalculationsContext,
    ) -> CoreResult<DecimalValue> {
        self.inner.reduce_item_subtotal(cart, item, subtotal, context)
    }

    fn reduce_items_subtotal(
        &self,
        items: &mut [SubtotalReducer],
        context: &mut PromoCalculationsContext,
        cart: &ModifiedCartData,
    ) -> CoreResult<()> {
        self.inner.reduce_items_subtotal(items, context, cart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Product;
    use crate::templates::{FixedSumDiscount, PercentageDiscount, PROMOTION_TYPE};

    #[test]
    fn test_exclusive_removes_others_except_allowed() {
        let mut cart = CartState::new();
        cart.add_item(Product::new("A", "product", 1000).into_ref(), 1)
            .unwrap();
        cart.add_promotion(
            PercentageDiscount::new("TEN", DecimalValue::from_int(10))
                .unwrap()
                .into_ref(),
        );
        cart.add_promotion(FixedSumDiscount::new("FLAT", 100).unwrap().into_ref());
        cart.add_promotion(
            Exclusive::new(
                PercentageDiscount::new("VIP", DecimalValue::from_int(20)).unwrap(),
            )
            .allowing(CartKey::new("FLAT", PROMOTION_TYPE))
            .into_ref(),
        );

        let totals = cart.perform_totals().unwrap();
        let active: Vec<_> = totals
            .promotions()
            .keys()
            .map(|key| key.cart_id.clone())
            .collect();
        assert_eq!(active, vec!["FLAT".to_string(), "VIP".to_string()]);

        // 1000 × 0.8 = 800, then 100 off
        assert_eq!(totals.total(), DecimalValue::from_int(700));

        let vip = totals
            .promo_impact(&CartKey::new("VIP", PROMOTION_TYPE))
            .unwrap();
        assert_eq!(vip.caused_by_promotion_reduction.len(), 1);
        assert_eq!(vip.caused_by_promotion_reduction[0].difference, -1);
    }

    #[test]
    fn test_exclusive_keeps_inner_identity() {
        let exclusive =
            Exclusive::new(PercentageDiscount::new("VIP", DecimalValue::from_int(20)).unwrap());
        assert_eq!(exclusive.key(), CartKey::new("VIP", PROMOTION_TYPE));
    }
}
