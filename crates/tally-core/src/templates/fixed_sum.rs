//! Flat amount off the cart, spread across items in proportion to their
//! subtotals.

use std::sync::Arc;

use super::{Eligibility, PROMOTION_TYPE};
use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::decimal::DecimalValue;
use crate::error::CoreResult;
use crate::filter::ItemFilter;
use crate::identity::Identity;
use crate::promotion::{Promotion, PromotionRef, SubtotalReducer};
use crate::snapshot::ModifiedCartData;
use crate::validation::validate_discount_amount;

/// Takes `amount` cents off the in-scope items as a whole.
///
/// ## Allocation
/// ```text
/// amount 200, items A=300  B=100  C=100   (total 500)
///   A: 300 × 200 / 500 = 120
///   B: 100 × 200 / 500 =  40
///   C: 200 - 120 - 40  =  40   last item takes the remainder
/// ```
/// The shares always add up to exactly `min(amount, total)`, so no item
/// ends below zero.
#[derive(Debug, Clone)]
pub struct FixedSumDiscount {
    cart_id: String,
    amount: i64,
    scope: ItemFilter,
    eligibility: Eligibility,
}

impl FixedSumDiscount {
    /// Creates a discount of `amount` cents over every item.
    pub fn new(cart_id: impl Into<String>, amount: i64) -> CoreResult<Self> {
        validate_discount_amount(amount)?;
        Ok(FixedSumDiscount {
            cart_id: cart_id.into(),
            amount,
            scope: ItemFilter::All,
            eligibility: Eligibility::Always,
        })
    }

    pub fn with_scope(mut self, scope: ItemFilter) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn into_ref(self) -> PromotionRef {
        Arc::new(self)
    }
}

impl Identity for FixedSumDiscount {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        PROMOTION_TYPE
    }
}

impl Promotion for FixedSumDiscount {
    fn is_eligible(&self, cart: &CartState) -> bool {
        self.eligibility.check(cart)
    }

    fn reduce_items_subtotal(
        &self,
        items: &mut [SubtotalReducer],
        _context: &mut PromoCalculationsContext,
        cart: &ModifiedCartData,
    ) -> CoreResult<()> {
        let scale = cart.redistribution_scale();
        let in_scope: Vec<usize> = items
            .iter()
            .enumerate()
            .filter(|(_, reducer)| self.scope.matches_type(reducer.item().cart_type()))
            .map(|(index, _)| index)
            .collect();

        let total: DecimalValue = in_scope.iter().map(|&index| items[index].subtotal()).sum();
        if total.is_zero() {
            return Ok(());
        }

        let discount = DecimalValue::from_int(self.amount).min(total);
        let mut allocated = DecimalValue::ZERO;

        for (position, &index) in in_scope.iter().enumerate() {
            let reducer = &mut items[index];
            let share = if position + 1 == in_scope.len() {
                discount - allocated
            } else {
                (reducer.subtotal() * discount).checked_div(total, scale)?
            };
            allocated += share;
            reducer.set_subtotal(reducer.subtotal() - share);
        }

        Ok(())
    }
}
