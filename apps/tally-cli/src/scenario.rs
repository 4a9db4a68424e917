//! # Scenario Files
//!
//! A scenario is a cart described in TOML: items, promotions, an optional
//! type ordering and a context table for eligibility flags.
//!
//! ```toml
//! sort_order = ["product", "service"]
//!
//! [context]
//! member = true
//!
//! [[items]]
//! cart_id = "A"
//! cart_type = "product"
//! unit_price = 200
//! quantity = 2
//!
//! [[promotions]]
//! kind = "percentage"
//! id = "TEN"
//! percentage = "10"
//! eligibility = { type = "context_flag", key = "member" }
//! ```
//!
//! Items are added in file order, so a bound item must come after its
//! targets. Any promotion can carry `exclusive = [...]`, the keys it
//! tolerates next to itself.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tally_core::templates::{
    BundleDiscount, Eligibility, Exclusive, FixedSumDiscount, FreeItem, GiftItem,
    PercentageDiscount,
};
use tally_core::{
    CartConfig, CartKey, CartState, DecimalValue, ItemFilter, Product, Promotion, PromotionRef,
};
use tracing::debug;

use crate::error::{CliError, CliResult};

// =============================================================================
// File Model
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub items: Vec<ItemSpec>,

    #[serde(default)]
    pub promotions: Vec<PromotionSpec>,

    /// Item types in display order; unknown types go last.
    #[serde(default)]
    pub sort_order: Vec<String>,

    #[serde(default)]
    pub context: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSpec {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromotionSpec {
    #[serde(flatten)]
    pub kind: PromotionKind,

    #[serde(default)]
    pub eligibility: Eligibility,

    /// Makes the promotion exclusive, keeping only these promotions.
    #[serde(default)]
    pub exclusive: Option<Vec<CartKey>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PromotionKind {
    Percentage {
        id: String,
        percentage: DecimalValue,
        #[serde(default)]
        scope: ItemFilter,
    },
    FixedSum {
        id: String,
        amount: i64,
        #[serde(default)]
        scope: ItemFilter,
    },
    FreeItem {
        id: String,
        item: CartKey,
        free_quantity: i64,
    },
    Gift {
        id: String,
        gift: Product,
        #[serde(default = "default_gift_quantity")]
        quantity: i64,
    },
    Bundle {
        id: String,
        components: Vec<CartKey>,
        bundle_price: i64,
    },
}

fn default_gift_quantity() -> i64 {
    1
}

// =============================================================================
// Building
// =============================================================================

impl Scenario {
    pub fn from_file(path: &Path) -> CliResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the cart this scenario describes.
    pub fn into_cart(self, config: CartConfig) -> CliResult<CartState> {
        let mut cart = CartState::with_config(config)?;

        for spec in self.items {
            cart.add_item(spec.product.into_ref(), spec.quantity)?;
        }

        for spec in self.promotions {
            cart.add_promotion(spec.build()?);
        }

        if !self.sort_order.is_empty() {
            let order: Vec<&str> = self.sort_order.iter().map(String::as_str).collect();
            cart.sort_by_type(&order);
        }

        cart.set_context(self.context);

        debug!(
            items = cart.item_count(),
            promotions = cart.promotions().len(),
            "Scenario loaded"
        );
        Ok(cart)
    }
}

impl PromotionSpec {
    pub fn build(self) -> CliResult<PromotionRef> {
        let eligibility = self.eligibility;
        let exclusive = self.exclusive;

        let promotion = match self.kind {
            PromotionKind::Percentage {
                id,
                percentage,
                scope,
            } => wrap(
                PercentageDiscount::new(id, percentage)?
                    .with_scope(scope)
                    .with_eligibility(eligibility),
                exclusive,
            ),
            PromotionKind::FixedSum { id, amount, scope } => wrap(
                FixedSumDiscount::new(id, amount)?
                    .with_scope(scope)
                    .with_eligibility(eligibility),
                exclusive,
            ),
            PromotionKind::FreeItem {
                id,
                item,
                free_quantity,
            } => wrap(
                FreeItem::new(id, item, free_quantity)?.with_eligibility(eligibility),
                exclusive,
            ),
            PromotionKind::Gift { id, gift, quantity } => wrap(
                GiftItem::new(id, gift.into_ref(), quantity)?.with_eligibility(eligibility),
                exclusive,
            ),
            PromotionKind::Bundle {
                id,
                components,
                bundle_price,
            } => wrap(
                BundleDiscount::new(id, components, bundle_price)?.with_eligibility(eligibility),
                exclusive,
            ),
        };

        Ok(promotion)
    }
}

fn wrap<P: Promotion + 'static>(promotion: P, exclusive: Option<Vec<CartKey>>) -> PromotionRef {
    match exclusive {
        Some(allow) => allow
            .into_iter()
            .fold(Exclusive::new(promotion), Exclusive::allowing)
            .into_ref(),
        None => Arc::new(promotion),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
