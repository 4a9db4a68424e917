//! Fixed price for a set of items bought together.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Eligibility, PROMOTION_TYPE};
use crate::cart::CartState;
use crate::context::PromoCalculationsContext;
use crate::decimal::DecimalValue;
use crate::error::{CoreResult, ValidationError};
use crate::identity::{CartKey, Identity};
use crate::item::ItemRef;
use crate::promotion::{Promotion, PromotionRef};
use crate::snapshot::ModifiedCartData;
use crate::validation::validate_unit_price;

const STATE_KEY: &str = "bundle";

/// Sells one of each component for `bundle_price`.
///
/// The number of complete bundles is the smallest component quantity. The
/// discount `bundles × (regular - bundle_price)` is spread over the
/// components in proportion to their unit price; the last component
/// reduced takes whatever remains so the shares add up exactly.
///
/// ```text
/// A 200 ×2, B 100 ×1, bundle {A, B} @ 240
///   bundles = 1, regular = 300, discount = 60
///   A: 200 × 60 / 300 = 40      B: 60 - 40 = 20
/// ```
#[derive(Debug, Clone)]
pub struct BundleDiscount {
    cart_id: String,
    components: Vec<CartKey>,
    bundle_price: i64,
    eligibility: Eligibility,
}

/// Per-call allocation state, kept in the calculation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BundleState {
    discount: DecimalValue,
    regular: i64,
    allocated: DecimalValue,
    pending: usize,
}

impl BundleDiscount {
    pub fn new(
        cart_id: impl Into<String>,
        components: impl IntoIterator<Item = CartKey>,
        bundle_price: i64,
    ) -> CoreResult<Self> {
        validate_unit_price(bundle_price)?;

        let mut unique: Vec<CartKey> = Vec::new();
        for component in components {
            if !unique.contains(&component) {
                unique.push(component);
            }
        }
        if unique.is_empty() {
            return Err(ValidationError::Required {
                field: "components".to_string(),
            }
            .into());
        }

        Ok(BundleDiscount {
            cart_id: cart_id.into(),
            components: unique,
            bundle_price,
            eligibility: Eligibility::Always,
        })
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn components(&self) -> &[CartKey] {
        &self.components
    }

    pub fn into_ref(self) -> PromotionRef {
        Arc::new(self)
    }

    fn initial_state(&self, cart: &ModifiedCartData) -> BundleState {
        let bundles = self
            .components
            .iter()
            .map(|component| cart.item_quantity(component).unwrap_or(0))
            .min()
            .unwrap_or(0);

        let regular: i64 = self
            .components
            .iter()
            .filter_map(|component| cart.item(component))
            .map(|item| item.unit_price())
            .sum();

        let saving = (regular - self.bundle_price).max(0);
        let discount = if bundles > 0 {
            DecimalValue::from_int(bundles.saturating_mul(saving))
        } else {
            DecimalValue::ZERO
        };

        trace!(bundle = %self.key(), bundles, regular, discount = %discount, "Bundle state");

        BundleState {
            discount,
            regular,
            allocated: DecimalValue::ZERO,
            pending: self.components.len(),
        }
    }
}

impl Identity for BundleDiscount {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        PROMOTION_TYPE
    }
}

impl Promotion for BundleDiscount {
    fn is_eligible(&self, cart: &CartState) -> bool {
        self.eligibility.check(cart)
    }

    fn reduce_item_subtotal(
        &self,
        cart: &ModifiedCartData,
        item: &ItemRef,
        subtotal: DecimalValue,
        context: &mut PromoCalculationsContext,
    ) -> CoreResult<DecimalValue> {
        if !self.components.contains(&item.key()) {
            return Ok(subtotal);
        }

        let key = self.key();
        let mut state = match context.value::<BundleState>(&key, STATE_KEY)? {
            Some(state) => state,
            None => self.initial_state(cart),
        };

        if state.discount.is_zero() || state.regular == 0 || state.pending == 0 {
            return Ok(subtotal);
        }

        let scale = cart.subtotal_scale();
        let share = if state.pending == 1 {
            state.discount - state.allocated
        } else {
            DecimalValue::from_int(item.unit_price())
                .mul_scaled(state.discount, scale)
                .checked_div(DecimalValue::from_int(state.regular), scale)?
        };

        state.allocated += share;
        state.pending -= 1;
        context.set_value(&key, STATE_KEY, &state)?;

        Ok(subtotal.sub_scaled(share, scale))
    }
}
