//! # Cart Items
//!
//! The `CartItem` capability and a ready-made catalog implementation.
//!
//! ## Capability Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CartItem (trait)                                │
//! │                                                                         │
//! │  Required              Optional (defaulted)                            │
//! │  ─────────────         ──────────────────────────────────              │
//! │  cart_id()             unit_weight()  → weighted items                 │
//! │  cart_type()           binding()      → bound items (warranty, fee)    │
//! │  unit_price()  (i64)                                                   │
//! │                                                                         │
//! │  Implementors: Product (this file), host-defined types, gift items     │
//! │  injected by promotions                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items are shared as `Arc<dyn CartItem>`; the engine never mutates them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::decimal::DecimalValue;
use crate::identity::{CartKey, Identity};

/// Shared handle to a cart item.
pub type ItemRef = Arc<dyn CartItem>;

// =============================================================================
// CartItem Capability
// =============================================================================

/// A priced unit identified by `(cart_id, cart_type)`.
pub trait CartItem: Identity + fmt::Debug + Send + Sync {
    /// Unit price in the minor currency unit (cents).
    fn unit_price(&self) -> i64;

    /// Weight of one unit, for items sold by weight or shipped by weight.
    fn unit_weight(&self) -> Option<DecimalValue> {
        None
    }

    /// Items this one is bound to, if any.
    ///
    /// ## Bound Item Lifecycle
    /// ```text
    /// add(Laptop)                    ──► Laptop ×1
    /// add(Warranty → Laptop, follow) ──► Warranty ×1   (copied from Laptop)
    /// set_quantity(Laptop, 3)        ──► Warranty ×3   (follows)
    /// remove(Laptop)                 ──► Warranty removed too
    /// ```
    fn binding(&self) -> Option<ItemBinding> {
        None
    }
}

/// Declares that an item belongs to one or more other items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBinding {
    /// Keys of the items this one is bound to.
    pub targets: Vec<CartKey>,

    /// Copy the target's quantity on add and on every quantity change.
    /// Only honoured for single-target bindings.
    pub follow_quantity: bool,
}

impl ItemBinding {
    /// Binding to a single target.
    pub fn to(target: CartKey, follow_quantity: bool) -> Self {
        ItemBinding {
            targets: vec![target],
            follow_quantity,
        }
    }

    /// Binding to several targets; quantity never follows.
    pub fn to_many(targets: Vec<CartKey>) -> Self {
        ItemBinding {
            targets,
            follow_quantity: false,
        }
    }

    /// The target whose quantity should be mirrored, if any.
    pub fn followed_target(&self) -> Option<&CartKey> {
        match (self.follow_quantity, self.targets.as_slice()) {
            (true, [single]) => Some(single),
            _ => None,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A plain catalog item.
///
/// ## Price Freezing
/// The price is captured when the `Product` is built. Totals computed later
/// use that frozen price even if the catalog changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Identifier within `cart_type` (SKU, catalog id, ...).
    pub cart_id: String,

    /// Item kind, used by type filters ("product", "service", "gift").
    pub cart_type: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price: i64,

    /// Optional unit weight.
    #[serde(default)]
    pub unit_weight: Option<DecimalValue>,

    /// Optional binding to other items.
    #[serde(default)]
    pub binding: Option<ItemBinding>,
}

impl Product {
    /// Creates an unbound, weightless product.
    pub fn new(cart_id: impl Into<String>, cart_type: impl Into<String>, unit_price: i64) -> Self {
        Product {
            cart_id: cart_id.into(),
            cart_type: cart_type.into(),
            unit_price,
            unit_weight: None,
            binding: None,
        }
    }

    /// Sets the unit weight.
    pub fn with_weight(mut self, weight: DecimalValue) -> Self {
        self.unit_weight = Some(weight);
        self
    }

    /// Binds this product to other items.
    pub fn bound(mut self, binding: ItemBinding) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Wraps the product in a shared handle.
    pub fn into_ref(self) -> ItemRef {
        Arc::new(self)
    }
}

impl Identity for Product {
    fn cart_id(&self) -> &str {
        &self.cart_id
    }

    fn cart_type(&self) -> &str {
        &self.cart_type
    }
}

impl CartItem for Product {
    fn unit_price(&self) -> i64 {
        self.unit_price
    }

    fn unit_weight(&self) -> Option<DecimalValue> {
        self.unit_weight
    }

    fn binding(&self) -> Option<ItemBinding> {
        self.binding.clone()
    }
}
