//! # Validation Module
//!
//! Input checks run by `CartState` before it touches the store.
//!
//! ## Where Validation Happens
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Host (CLI / UI)                                                        │
//! │  └── Type validation (TOML / JSON deserialization)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  CartState::add_item / set_item_quantity                               │
//! │  └── THIS MODULE: identity, quantity, price, percentage                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ItemCounterStore (assumes valid input)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_cart_id, validate_quantity};
//!
//! validate_cart_id("COKE-330").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::decimal::DecimalValue;
use crate::error::ValidationError;
use crate::identity::KEY_SEPARATOR;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identity Validators
// =============================================================================

fn validate_identity_part(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.contains(KEY_SEPARATOR) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must not contain the key separator '{}'", KEY_SEPARATOR),
        });
    }

    Ok(())
}

/// Validates a cart id.
///
/// ## Rules
/// - Must not be blank
/// - Must not contain the flat-key separator, so `CartKey::encoded()`
///   stays unambiguous for interop
pub fn validate_cart_id(cart_id: &str) -> ValidationResult<()> {
    validate_identity_part("cart_id", cart_id)
}

/// Validates a cart type. Same rules as [`validate_cart_id`].
pub fn validate_cart_type(cart_type: &str) -> ValidationResult<()> {
    validate_identity_part("cart_type", cart_type)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being added.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price in cents.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_unit_price;
///
/// assert!(validate_unit_price(1099).is_ok());
/// assert!(validate_unit_price(0).is_ok());     // free item
/// assert!(validate_unit_price(-100).is_err());
/// ```
pub fn validate_unit_price(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount percentage (0 to 100 inclusive).
pub fn validate_percentage(percentage: DecimalValue) -> ValidationResult<()> {
    if percentage.is_negative() || percentage > DecimalValue::from_int(100) {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

/// Validates a fixed discount amount in cents.
pub fn validate_discount_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identity() {
        assert!(validate_cart_id("A-1").is_ok());
        assert!(validate_cart_type("product").is_ok());

        assert!(validate_cart_id("").is_err());
        assert!(validate_cart_type("   ").is_err());
        assert!(validate_cart_id("a________b").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(DecimalValue::from_int(0)).is_ok());
        assert!(validate_percentage(DecimalValue::from_int(100)).is_ok());
        assert!(validate_percentage(DecimalValue::from_int(101)).is_err());
        assert!(validate_percentage(DecimalValue::from_int(-5)).is_err());
    }

    #[test]
    fn test_validate_discount_amount() {
        assert!(validate_discount_amount(20000).is_ok());
        assert!(validate_discount_amount(0).is_err());
    }
}
