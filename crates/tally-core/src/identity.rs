//! # Identity Keying
//!
//! Stable value identity for cart items and promotions.
//!
//! ## Why Not Object Identity?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two Arc<dyn CartItem> built from the same catalog row are DIFFERENT   │
//! │  allocations, but the SAME cart line.                                  │
//! │                                                                         │
//! │    Product("A", "product")  ──┐                                        │
//! │                               ├──► CartKey { "A", "product" }  (equal) │
//! │    Product("A", "product")  ──┘                                        │
//! │                                                                         │
//! │  Every merge, lookup and diff goes through CartKey. Pointer equality   │
//! │  is never consulted.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Separator Collisions
//! The key is a two-field struct, so `("a_", "b")` and `("a", "_b")` never
//! collide. The flat string form (`cart_id + "________" + cart_type`) is
//! only produced by [`CartKey::encoded`] for display and interop.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// Separator used by the flat string form of a key.
pub const KEY_SEPARATOR: &str = "________";

// =============================================================================
// Cart Key
// =============================================================================

/// Composite identity of an item or a promotion: `(cart_id, cart_type)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartKey {
    pub cart_id: String,
    pub cart_type: String,
}

impl CartKey {
    /// Creates a key from its two parts.
    pub fn new(cart_id: impl Into<String>, cart_type: impl Into<String>) -> Self {
        CartKey {
            cart_id: cart_id.into(),
            cart_type: cart_type.into(),
        }
    }

    /// Flat string form: `cart_id + "________" + cart_type`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::CartKey;
    ///
    /// let key = CartKey::new("A", "product");
    /// assert_eq!(key.encoded(), "A________product");
    /// ```
    pub fn encoded(&self) -> String {
        format!("{}{}{}", self.cart_id, KEY_SEPARATOR, self.cart_type)
    }
}

impl fmt::Display for CartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.cart_id, KEY_SEPARATOR, self.cart_type)
    }
}

// =============================================================================
// Identity Capability
// =============================================================================

/// Anything addressable in a cart: items and promotions alike.
pub trait Identity {
    /// Identifier, unique within its `cart_type`.
    fn cart_id(&self) -> &str;

    /// Kind of entity ("product", "gift", "promotion", ...).
    fn cart_type(&self) -> &str;

    /// The composite key used for every merge, lookup and diff.
    fn key(&self) -> CartKey {
        CartKey::new(self.cart_id(), self.cart_type())
    }

    /// Value equality by key.
    fn is_same(&self, other: &dyn Identity) -> bool {
        self.cart_id() == other.cart_id() && self.cart_type() == other.cart_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    impl Identity for Named {
        fn cart_id(&self) -> &str {
            self.0
        }
        fn cart_type(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn test_equal_keys_for_distinct_instances() {
        let a = Named("A", "product");
        let b = Named("A", "product");
        assert_eq!(a.key(), b.key());
        assert!(a.is_same(&b));
    }

    #[test]
    fn test_type_participates_in_identity() {
        let product = Named("A", "product");
        let gift = Named("A", "gift");
        assert_ne!(product.key(), gift.key());
        assert!(!product.is_same(&gift));
    }

    #[test]
    fn test_separator_inside_fields_does_not_collide() {
        let left = CartKey::new("x________y", "z");
        let right = CartKey::new("x", "y________z");
        assert_eq!(left.encoded(), right.encoded());
        assert_ne!(left, right);
    }
}
