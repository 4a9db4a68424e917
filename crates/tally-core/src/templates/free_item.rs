//! "Buy N, get some free" on a single item.

use std::sync::Arc;

use super::{Eligibility, PROMOTION_TYPE};
use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::identity::{CartKey, Identity};
use crate::item::ItemRef;
use crate::promotion::{Promotion, PromotionRef};
use crate::snapshot::ModifiedCartData;
use crate::validation::validate_quantity;

/// Removes `free_quantity × unit_price` from one item's running subtotal.
///
/// The free units are capped at the item's quantity.
#[derive(Debug, Clone)]
pub struct FreeItem {
    cart_id: String,
    item: CartKey,
    free_quantity: i64,
    eligibility: Eligibility,
}

impl FreeItem {
    pub fn new(cart_id: impl Into<String>, item: CartKey, free_quantity: i64) -> CoreResult<Self> {
        validate_quantity(free_quantity)?;
        Ok(FreeItem {
            cart_id: cart_id.into(),
            item,
            free_quantity,
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

impl Identity for FreeItem {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        PROMOTION_TYPE
    }
}

impl Promotion for FreeItem {
    fn is_eligible(&self, cart: &CartState) -> bool {
        self.eligibility.check(cart)
    }

    fn reduce_item_subtotal(
        &self,
        cart: &ModifiedCartData,
        item: &ItemRef,
        subtotal: DecimalValue,
        _context: &mut PromoCalculationsContext,
    ) -> CoreResult<DecimalValue> {
        if item.key() != self.item {
            return Ok(subtotal);
        }

        let quantity = cart.item_quantity(&self.item).unwrap_or(0);
        let free_units = self.free_quantity.min(quantity);
        let free_value = DecimalValue::from_int(item.unit_price())
            .mul_scaled(DecimalValue::from_int(free_units), cart.subtotal_scale());

        Ok(subtotal.sub_scaled(free_value, cart.subtotal_scale()))
    }
}
