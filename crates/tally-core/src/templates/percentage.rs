//! Percentage off every matching item.

use std::sync::Arc;

use super::{Eligibility, PROMOTION_TYPE};
use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::filter::ItemFilter;
use crate::identity::Identity;
use crate::item::ItemRef;
use crate::promotion::{Promotion, PromotionRef};
use crate::snapshot::ModifiedCartData;
use crate::validation::validate_percentage;

/// Scale of the `1 - pct/100` multiplier.
const MULTIPLIER_SCALE: u32 = 10;

/// Takes `percentage` percent off each in-scope item's running subtotal.
///
/// ## Example
/// ```rust
/// use tally_core::cart::CartState;
/// use tally_core::item::Product;
/// use tally_core::templates::PercentageDiscount;
/// use tally_core::DecimalValue;
///
/// let mut cart = CartState::new();
/// cart.add_item(Product::new("A", "product", 200).into_ref(), 2).unwrap();
/// cart.add_promotion(
///     PercentageDiscount::new("TEN", DecimalValue::from_int(10)).unwrap().into_ref(),
/// );
///
/// assert_eq!(cart.perform_totals().unwrap().total(), DecimalValue::from_int(360));
/// ```
#[derive(Debug, Clone)]
pub struct PercentageDiscount {
    cart_id: String,
    percentage: DecimalValue,
    scope: ItemFilter,
    eligibility: Eligibility,
}

impl PercentageDiscount {
    /// Creates a discount over every item; `percentage` must be 0..=100.
    pub fn new(cart_id: impl Into<String>, percentage: DecimalValue) -> CoreResult<Self> {
        validate_percentage(percentage)?;
        Ok(PercentageDiscount {
            cart_id: cart_id.into(),
            percentage,
            scope: ItemFilter::All,
            eligibility: Eligibility::Always,
        })
    }

    /// Restricts the discount to matching item types.
    pub fn with_scope(mut self, scope: ItemFilter) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn percentage(&self) -> DecimalValue {
        self.percentage
    }

    /// `1 - percentage / 100`.
    pub fn multiplier(&self) -> CoreResult<DecimalValue> {
        let rate = self
            .percentage
            .checked_div(DecimalValue::from_int(100), MULTIPLIER_SCALE)?;
        Ok(DecimalValue::ONE - rate)
    }

    pub fn into_ref(self) -> PromotionRef {
        Arc::new(self)
    }
}

impl Identity for PercentageDiscount {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        PROMOTION_TYPE
    }
}

impl Promotion for PercentageDiscount {
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
        if !self.scope.matches_type(item.cart_type()) {
            return Ok(subtotal);
        }
        Ok(subtotal.mul_scaled(self.multiplier()?, cart.subtotal_scale()))
    }
}
