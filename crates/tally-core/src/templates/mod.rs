//! # Promotion Templates
//!
//! Ready-made promotions covering the common discount shapes.
//!
//! | Template             | Stage | Effect                                        |
//! |----------------------|-------|-----------------------------------------------|
//! | `PercentageDiscount` | 3     | subtotal × (1 − pct/100), optional type scope |
//! | `FreeItem`           | 3     | removes N units' worth from one item          |
//! | `BundleDiscount`     | 3     | fixed price for a set of components           |
//! | `GiftItem`           | 2 + 3 | injects a gift line and makes it free         |
//! | `FixedSumDiscount`   | 4     | flat amount spread proportionally             |
//! | `Exclusive<P>`       | 1     | removes every promotion not allow-listed      |
//!
//! Every template carries an [`Eligibility`] rule.

mod bundle;
mod exclusive;
mod fixed_sum;
mod free_item;
mod gift;
mod percentage;

pub use bundle::BundleDiscount;
pub use exclusive::Exclusive;
pub use fixed_sum::FixedSumDiscount;
pub use free_item::FreeItem;
pub use gift::GiftItem;
pub use percentage::PercentageDiscount;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cart::CartState;
use crate::identity::CartKey;

/// `cart_type` shared by every template.
pub const PROMOTION_TYPE: &str = "promotion";

// =============================================================================
// Eligibility
// =============================================================================

/// Condition checked against the live cart before stage 1.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Eligibility {
    #[default]
    Always,

    Never,

    /// Raw cart value (unit price × quantity, before promotions) in cents.
    MinimumSubtotal { amount: i64 },

    /// Total number of units in the cart.
    MinimumQuantity { quantity: i64 },

    /// A specific item must be in the cart.
    RequiresItem { item: CartKey },

    /// A host context value must be truthy (`true`, non-zero, non-empty).
    ContextFlag { key: String },
}

impl Eligibility {
    pub fn check(&self, cart: &CartState) -> bool {
        match self {
            Eligibility::Always => true,
            Eligibility::Never => false,
            Eligibility::MinimumSubtotal { amount } => {
                let subtotal: i64 = cart
                    .items()
                    .map(|counter| counter.item.unit_price().saturating_mul(counter.quantity))
                    .sum();
                subtotal >= *amount
            }
            Eligibility::MinimumQuantity { quantity } => {
                cart.items().map(|counter| counter.quantity).sum::<i64>() >= *quantity
            }
            Eligibility::RequiresItem { item } => cart.quantity_of(item).is_some_and(|q| q > 0),
            Eligibility::ContextFlag { key } => cart.context_value(key).is_some_and(is_truthy),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Product;
    use serde_json::Map;

    fn cart() -> CartState {
        let mut cart = CartState::new();
        cart.add_item(Product::new("A", "product", 200).into_ref(), 2)
            .unwrap();
        cart
    }

    #[test]
    fn test_minimum_subtotal() {
        let cart = cart();
        assert!(Eligibility::MinimumSubtotal { amount: 400 }.check(&cart));
        assert!(!Eligibility::MinimumSubtotal { amount: 401 }.check(&cart));
    }

    #[test]
    fn test_minimum_quantity_and_required_item() {
        let cart = cart();
        assert!(Eligibility::MinimumQuantity { quantity: 2 }.check(&cart));
        assert!(!Eligibility::MinimumQuantity { quantity: 3 }.check(&cart));
        assert!(Eligibility::RequiresItem {
            item: CartKey::new("A", "product")
        }
        .check(&cart));
        assert!(!Eligibility::RequiresItem {
            item: CartKey::new("B", "product")
        }
        .check(&cart));
    }

    #[test]
    fn test_context_flag() {
        let mut cart = cart();
        let flag = Eligibility::ContextFlag {
            key: "member".to_string(),
        };
        assert!(!flag.check(&cart));

        let mut context = Map::new();
        context.insert("member".to_string(), Value::Bool(true));
        cart.set_context(context);
        assert!(flag.check(&cart));
    }

    #[test]
    fn test_eligibility_deserializes_tagged() {
        let rule: Eligibility =
            serde_json::from_str(r#"{"type":"minimum_subtotal","amount":5000}"#).unwrap();
        assert_eq!(rule, Eligibility::MinimumSubtotal { amount: 5000 });
    }
}
